//! Field-schema discovery and catalog generation
//!
//! Eloqua fields vary from organization to organization, so every run asks
//! the API which fields exist and maps them to string-typed output columns.
//! All bulk data arrives as strings, which is why every property is typed
//! `["null", "string"]`.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::api::BulkApi;
use crate::api::types::FieldDefinition;
use crate::models::{BulkEntity, StreamDescriptor, StreamKind};

/// Field definitions requested per page
const FIELDS_PAGE_SIZE: usize = 1000;

/// Fetch every field definition of an entity
pub fn fetch_field_schema(api: &dyn BulkApi, entity: BulkEntity) -> Result<Vec<FieldDefinition>> {
    let mut fields = Vec::new();
    let mut offset = 0;

    loop {
        let page = api
            .list_fields(entity, offset, FIELDS_PAGE_SIZE)
            .with_context(|| format!("Failed to list {} fields", entity.path()))?;
        offset += page.items.len();
        let done = !page.has_more || page.items.is_empty();
        fields.extend(page.items);
        if done {
            break;
        }
    }

    Ok(fields)
}

/// Output-name to statement mapping for one stream.
///
/// Activity streams keep only fields whose `activityTypes` include the
/// stream's event type; contacts keep everything. Output names are the
/// lower-cased internal names.
pub fn resolve_fields(kind: StreamKind, definitions: &[FieldDefinition]) -> BTreeMap<String, String> {
    definitions
        .iter()
        .filter(|field| match kind.event_type() {
            None => true,
            Some(event_type) => field
                .activity_types
                .as_ref()
                .is_some_and(|types| types.iter().any(|t| t == event_type)),
        })
        .map(|field| (field.internal_name.to_lowercase(), field.statement.clone()))
        .collect()
}

/// Resolves stream descriptors, fetching each entity's fields at most once
pub struct SchemaResolver<'a> {
    api: &'a dyn BulkApi,
    cache: Mutex<HashMap<BulkEntity, Vec<FieldDefinition>>>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(api: &'a dyn BulkApi) -> Self {
        Self {
            api,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Field definitions for an entity, from cache when available
    pub fn field_definitions(&self, entity: BulkEntity) -> Result<Vec<FieldDefinition>> {
        // Held across the fetch so concurrent streams share one listing
        let mut cache = self.cache.lock().unwrap();
        if let Some(fields) = cache.get(&entity) {
            return Ok(fields.clone());
        }

        let fields = fetch_field_schema(self.api, entity)?;
        info!("Discovered {} {} fields", fields.len(), entity.path());
        cache.insert(entity, fields.clone());
        Ok(fields)
    }

    /// Descriptor for a stream, validated against its replication key
    pub fn descriptor(&self, kind: StreamKind) -> Result<StreamDescriptor> {
        let definitions = self.field_definitions(kind.entity())?;
        StreamDescriptor::for_stream(kind, resolve_fields(kind, &definitions))
    }
}

/// One stream in a Singer catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub stream: String,
    pub tap_stream_id: String,
    pub schema: Value,
    pub key_properties: Vec<String>,
    pub replication_key: String,
    pub replication_method: String,
}

impl CatalogEntry {
    pub fn for_descriptor(kind: StreamKind, descriptor: &StreamDescriptor) -> Self {
        let properties: serde_json::Map<String, Value> = descriptor
            .fields()
            .keys()
            .map(|name| (name.clone(), json!({"type": ["null", "string"]})))
            .collect();

        Self {
            stream: kind.name().to_string(),
            tap_stream_id: kind.name().to_string(),
            schema: json!({
                "type": "object",
                "properties": properties,
            }),
            key_properties: kind.key_properties().iter().map(|k| k.to_string()).collect(),
            replication_key: descriptor.replication_key().to_string(),
            replication_method: "INCREMENTAL".to_string(),
        }
    }
}

/// Catalog of discoverable streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

/// Build the catalog for the given streams
pub fn discover(resolver: &SchemaResolver<'_>, kinds: &[StreamKind]) -> Result<Catalog> {
    let streams = kinds
        .iter()
        .map(|&kind| {
            let descriptor = resolver.descriptor(kind)?;
            Ok(CatalogEntry::for_descriptor(kind, &descriptor))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog { streams })
}
