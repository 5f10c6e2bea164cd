//! Stream catalog and the per-run stream descriptor

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::export::ExportError;

/// Bulk API entity a stream is exported from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkEntity {
    Contacts,
    Activities,
}

impl BulkEntity {
    /// Path segment under the bulk API root
    pub fn path(&self) -> &'static str {
        match self {
            BulkEntity::Contacts => "contacts",
            BulkEntity::Activities => "activities",
        }
    }
}

/// The streams this tap can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Contacts,
    Sends,
    Opens,
    Clicks,
    Subscribes,
    Unsubscribes,
    Bounces,
}

impl StreamKind {
    pub const ALL: [StreamKind; 7] = [
        StreamKind::Contacts,
        StreamKind::Sends,
        StreamKind::Opens,
        StreamKind::Clicks,
        StreamKind::Subscribes,
        StreamKind::Unsubscribes,
        StreamKind::Bounces,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Contacts => "contacts",
            StreamKind::Sends => "sends",
            StreamKind::Opens => "opens",
            StreamKind::Clicks => "clicks",
            StreamKind::Subscribes => "subscribes",
            StreamKind::Unsubscribes => "unsubscribes",
            StreamKind::Bounces => "bounces",
        }
    }

    pub fn entity(&self) -> BulkEntity {
        match self {
            StreamKind::Contacts => BulkEntity::Contacts,
            _ => BulkEntity::Activities,
        }
    }

    /// Activity type discriminator, `None` for entity streams
    pub fn event_type(&self) -> Option<&'static str> {
        match self {
            StreamKind::Contacts => None,
            StreamKind::Sends => Some("EmailSend"),
            StreamKind::Opens => Some("EmailOpen"),
            StreamKind::Clicks => Some("EmailClickthrough"),
            StreamKind::Subscribes => Some("Subscribe"),
            StreamKind::Unsubscribes => Some("Unsubscribe"),
            StreamKind::Bounces => Some("Bounceback"),
        }
    }

    pub fn replication_key(&self) -> &'static str {
        match self {
            StreamKind::Contacts => "c_datemodified",
            _ => "activitydate",
        }
    }

    pub fn key_properties(&self) -> &'static [&'static str] {
        match self {
            StreamKind::Contacts => &["c_emailaddress"],
            _ => &["activityid"],
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognised stream name
#[derive(Debug, thiserror::Error)]
#[error("Unknown stream '{0}'")]
pub struct UnknownStreamError(pub String);

impl FromStr for StreamKind {
    type Err = UnknownStreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        StreamKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| UnknownStreamError(s.to_string()))
    }
}

/// Everything needed to build exports for one sub-stream.
///
/// Constructed once per run from the discovered field schema and immutable
/// afterwards. Construction fails if the replication key has no field
/// statement, so a bad schema surfaces before any export is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    name: String,
    entity: BulkEntity,
    fields: BTreeMap<String, String>,
    replication_key: String,
    event_type: Option<String>,
}

impl StreamDescriptor {
    pub fn new(
        name: impl Into<String>,
        entity: BulkEntity,
        fields: BTreeMap<String, String>,
        replication_key: impl Into<String>,
        event_type: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        let replication_key = replication_key.into();

        if fields.is_empty() {
            return Err(ExportError::EmptyFieldSet { stream: name }.into());
        }
        if !fields.contains_key(&replication_key) {
            return Err(ExportError::MissingReplicationKey {
                stream: name,
                key: replication_key,
            }
            .into());
        }

        Ok(Self {
            name,
            entity,
            fields,
            replication_key,
            event_type,
        })
    }

    /// Build the descriptor for a catalog stream from its resolved fields
    pub fn for_stream(kind: StreamKind, fields: BTreeMap<String, String>) -> Result<Self> {
        Self::new(
            kind.name(),
            kind.entity(),
            fields,
            kind.replication_key(),
            kind.event_type().map(str::to_string),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> BulkEntity {
        self.entity
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn replication_key(&self) -> &str {
        &self.replication_key
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// Vendor field statement for the replication key
    pub fn replication_statement(&self) -> &str {
        // Presence checked in `new`
        self.fields
            .get(&self.replication_key)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity_fields() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("activityid".to_string(), "{{Activity.Id}}".to_string()),
            ("activitydate".to_string(), "{{Activity.CreatedAt}}".to_string()),
        ])
    }

    #[test]
    fn test_stream_kind_roundtrip() {
        for kind in StreamKind::ALL {
            assert_eq!(kind.name().parse::<StreamKind>().unwrap(), kind);
        }
        assert_eq!(" Opens ".parse::<StreamKind>().unwrap(), StreamKind::Opens);
        assert!("webvisits".parse::<StreamKind>().is_err());
    }

    #[test]
    fn test_stream_kind_catalog() {
        assert_eq!(StreamKind::Contacts.entity(), BulkEntity::Contacts);
        assert_eq!(StreamKind::Contacts.event_type(), None);
        assert_eq!(StreamKind::Clicks.entity(), BulkEntity::Activities);
        assert_eq!(StreamKind::Clicks.event_type(), Some("EmailClickthrough"));
        assert_eq!(StreamKind::Bounces.replication_key(), "activitydate");
    }

    #[test]
    fn test_descriptor_for_stream() {
        let descriptor = StreamDescriptor::for_stream(StreamKind::Opens, activity_fields()).unwrap();
        assert_eq!(descriptor.name(), "opens");
        assert_eq!(descriptor.event_type(), Some("EmailOpen"));
        assert_eq!(descriptor.replication_statement(), "{{Activity.CreatedAt}}");
    }

    #[test]
    fn test_descriptor_missing_replication_key() {
        let fields = BTreeMap::from([("activityid".to_string(), "{{Activity.Id}}".to_string())]);
        let err = StreamDescriptor::for_stream(StreamKind::Sends, fields).unwrap_err();
        match err.downcast_ref::<ExportError>() {
            Some(ExportError::MissingReplicationKey { stream, key }) => {
                assert_eq!(stream, "sends");
                assert_eq!(key, "activitydate");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_descriptor_empty_fields() {
        let err = StreamDescriptor::for_stream(StreamKind::Contacts, BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::EmptyFieldSet { .. })
        ));
    }
}
