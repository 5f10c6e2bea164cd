//! Simulated Eloqua Bulk API
//!
//! Keeps a dataset of contacts and activities and answers exports the way
//! the vendor does: each sync's result set is the records whose replication
//! key falls inside the definition's window (and whose type matches the
//! activity filter).

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;
use eloqua::api::types::{
    ExportResponse, FieldDefinition, ListResponse, ResultPage, SyncLogEntry, SyncResponse,
    SyncStatus,
};
use eloqua::{BulkApi, BulkEntity, ExportDefinition, Record, StreamKind, parse_timestamp};
use serde_json::Value;

pub fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

/// Build an activity record of the given type
pub fn activity(id: usize, activity_type: &str, date: &str) -> Record {
    let mut record = Record::new();
    record.insert("activityid".to_string(), Value::String(id.to_string()));
    record.insert("activitytype".to_string(), Value::String(activity_type.to_string()));
    record.insert("activitydate".to_string(), Value::String(date.to_string()));
    record
}

/// Build a contact record
pub fn contact(id: usize, modified: &str) -> Record {
    let mut record = Record::new();
    record.insert("c_emailaddress".to_string(), Value::String(format!("user{}@example.com", id)));
    record.insert("c_datemodified".to_string(), Value::String(modified.to_string()));
    record
}

fn field(internal_name: &str, statement: &str, types: Option<&[&str]>) -> FieldDefinition {
    FieldDefinition {
        name: Some(internal_name.to_string()),
        internal_name: internal_name.to_string(),
        statement: statement.to_string(),
        data_type: Some("string".to_string()),
        activity_types: types.map(|t| t.iter().map(|s| s.to_string()).collect()),
    }
}

fn activity_fields() -> Vec<FieldDefinition> {
    let all: Vec<&str> = StreamKind::ALL.iter().filter_map(|k| k.event_type()).collect();
    vec![
        field("ActivityId", "{{Activity.Id}}", Some(all.as_slice())),
        field("ActivityType", "{{Activity.Type}}", Some(all.as_slice())),
        field("ActivityDate", "{{Activity.CreatedAt}}", Some(all.as_slice())),
        field("EmailClickedThruLink", "{{Activity.Field(EmailClickedThruLink)}}", Some(&["EmailClickthrough"])),
    ]
}

fn contact_fields() -> Vec<FieldDefinition> {
    vec![
        field("C_EmailAddress", "{{Contact.Field(C_EmailAddress)}}", None),
        field("C_DateModified", "{{Contact.Field(C_DateModified)}}", None),
    ]
}

struct Export {
    entity: BulkEntity,
    definition: ExportDefinition,
}

#[derive(Default)]
struct State {
    exports: HashMap<String, Export>,
    /// sync uri -> export uri
    syncs: HashMap<String, String>,
    next_id: usize,
    /// Window of every export created, in order
    windows: Vec<(String, Option<String>)>,
    data_fetches: usize,
}

pub struct SimulatedEloqua {
    contacts: Vec<Record>,
    activities: Vec<Record>,
    /// Statuses reported for newly created syncs, consumed in order
    statuses: Mutex<VecDeque<SyncStatus>>,
    logs: Vec<SyncLogEntry>,
    state: Mutex<State>,
}

impl SimulatedEloqua {
    pub fn new() -> Self {
        Self {
            contacts: Vec::new(),
            activities: Vec::new(),
            statuses: Mutex::new(VecDeque::new()),
            logs: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_contacts(mut self, records: Vec<Record>) -> Self {
        self.contacts = records;
        self
    }

    pub fn with_activities(mut self, records: Vec<Record>) -> Self {
        self.activities = records;
        self
    }

    /// Statuses for the next status checks; once exhausted every check reports success
    pub fn with_sync_results(self, statuses: &[SyncStatus]) -> Self {
        *self.statuses.lock().unwrap() = statuses.iter().copied().collect();
        self
    }

    pub fn with_error_log(mut self, message: &str) -> Self {
        self.logs.push(SyncLogEntry {
            severity: "error".to_string(),
            message: message.to_string(),
            status_code: Some("ELQ-00107".to_string()),
            count: Some(1),
        });
        self
    }

    pub fn add_activities(&mut self, records: Vec<Record>) {
        self.activities.extend(records);
    }

    pub fn exports_created(&self) -> usize {
        self.state.lock().unwrap().exports.len()
    }

    /// (start, end) of every export created, in creation order
    pub fn export_windows(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().windows.clone()
    }

    pub fn data_fetches(&self) -> usize {
        self.state.lock().unwrap().data_fetches
    }

    fn matching(&self, export: &Export) -> Vec<Record> {
        let (records, key) = match export.entity {
            BulkEntity::Contacts => (&self.contacts, "c_datemodified"),
            BulkEntity::Activities => (&self.activities, "activitydate"),
        };
        let window = export.definition.window;
        let event_type = export.definition.event_type.as_deref();

        records
            .iter()
            .filter(|r| {
                let in_window = r
                    .get(key)
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp)
                    .is_some_and(|t| window.contains(&t));
                let type_matches = event_type.is_none_or(|wanted| {
                    r.get("activitytype").and_then(Value::as_str) == Some(wanted)
                });
                in_window && type_matches
            })
            .cloned()
            .collect()
    }
}

impl BulkApi for SimulatedEloqua {
    fn list_fields(
        &self,
        entity: BulkEntity,
        offset: usize,
        limit: usize,
    ) -> Result<ListResponse<FieldDefinition>> {
        let fields = match entity {
            BulkEntity::Contacts => contact_fields(),
            BulkEntity::Activities => activity_fields(),
        };
        let total = fields.len();
        let items: Vec<_> = fields.into_iter().skip(offset).take(limit).collect();
        let has_more = offset + items.len() < total;
        Ok(ListResponse::new(items, has_more, total as u64))
    }

    fn create_export(
        &self,
        entity: BulkEntity,
        definition: &ExportDefinition,
    ) -> Result<ExportResponse> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let uri = format!("/{}/exports/{}", entity.path(), state.next_id);
        state.windows.push((
            eloqua::format_timestamp(&definition.window.start()),
            definition.window.end().map(|e| eloqua::format_timestamp(&e)),
        ));
        state.exports.insert(
            uri.clone(),
            Export {
                entity,
                definition: definition.clone(),
            },
        );
        Ok(ExportResponse {
            uri,
            name: Some(definition.name.clone()),
        })
    }

    fn create_sync(&self, export_uri: &str) -> Result<SyncResponse> {
        let mut state = self.state.lock().unwrap();
        if !state.exports.contains_key(export_uri) {
            return Err(anyhow!("No export at {}", export_uri));
        }
        state.next_id += 1;
        let uri = format!("/syncs/{}", state.next_id);
        state.syncs.insert(uri.clone(), export_uri.to_string());
        Ok(SyncResponse {
            uri,
            status: SyncStatus::Pending,
            synced_instance_uri: Some(export_uri.to_string()),
        })
    }

    fn get_sync(&self, sync_uri: &str) -> Result<SyncResponse> {
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SyncStatus::Success);
        Ok(SyncResponse {
            uri: sync_uri.to_string(),
            status,
            synced_instance_uri: None,
        })
    }

    fn list_sync_logs(&self, _sync_uri: &str) -> Result<Vec<SyncLogEntry>> {
        Ok(self.logs.clone())
    }

    fn fetch_data(&self, sync_uri: &str, offset: usize, limit: usize) -> Result<ResultPage> {
        let matching = {
            let mut state = self.state.lock().unwrap();
            state.data_fetches += 1;
            let export_uri = state
                .syncs
                .get(sync_uri)
                .ok_or_else(|| anyhow!("No sync at {}", sync_uri))?
                .clone();
            let export = &state.exports[&export_uri];
            self.matching(export)
        };

        let total = matching.len();
        let items: Vec<Record> = matching.into_iter().skip(offset).take(limit).collect();
        let has_more = offset + items.len() < total;
        Ok(ResultPage::new(items, has_more, total as u64))
    }
}
