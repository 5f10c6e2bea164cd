//! Scripted Bulk API double for unit tests

use anyhow::{Result, bail};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::BulkApi;
use super::types::{
    ExportResponse, FieldDefinition, ListResponse, ResultPage, SyncLogEntry, SyncResponse, SyncStatus,
};
use crate::export::ExportDefinition;
use crate::models::{BulkEntity, Record};

/// A request the engine made, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListFields(BulkEntity),
    CreateExport(String),
    CreateSync(String),
    GetSync(String),
    ListSyncLogs(String),
    FetchData { sync_uri: String, offset: usize, limit: usize },
}

/// Serves a fixed dataset and a scripted sequence of sync statuses.
///
/// `get_sync` pops statuses from the script and reports `success` once it
/// runs dry. Every export returns the same records regardless of filter.
pub struct FakeApi {
    statuses: Mutex<VecDeque<SyncStatus>>,
    logs: Vec<SyncLogEntry>,
    records: Vec<Record>,
    fields: Vec<FieldDefinition>,
    total_results: Option<u64>,
    page_cap: Option<usize>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            logs: Vec::new(),
            records: Vec::new(),
            fields: Vec::new(),
            total_results: None,
            page_cap: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(self, statuses: &[SyncStatus]) -> Self {
        *self.statuses.lock().unwrap() = statuses.iter().copied().collect();
        self
    }

    pub fn with_logs(mut self, entries: &[(&str, &str)]) -> Self {
        self.logs = entries
            .iter()
            .map(|(severity, message)| SyncLogEntry {
                severity: severity.to_string(),
                message: message.to_string(),
                status_code: None,
                count: None,
            })
            .collect();
        self
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.fields = fields;
        self
    }

    /// Report this total instead of the dataset size
    pub fn with_total_results(mut self, total: u64) -> Self {
        self.total_results = Some(total);
        self
    }

    /// Return at most `cap` records per data page, whatever the requested limit
    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

impl BulkApi for FakeApi {
    fn list_fields(
        &self,
        entity: BulkEntity,
        offset: usize,
        limit: usize,
    ) -> Result<ListResponse<FieldDefinition>> {
        self.record(Call::ListFields(entity));
        let items: Vec<_> = self.fields.iter().skip(offset).take(limit).cloned().collect();
        let has_more = offset + items.len() < self.fields.len();
        Ok(ListResponse::new(items, has_more, self.fields.len() as u64))
    }

    fn create_export(
        &self,
        _entity: BulkEntity,
        definition: &ExportDefinition,
    ) -> Result<ExportResponse> {
        let n = self.record(Call::CreateExport(definition.filter.clone()));
        Ok(ExportResponse {
            uri: format!("/exports/{}", n),
            name: Some(definition.name.clone()),
        })
    }

    fn create_sync(&self, export_uri: &str) -> Result<SyncResponse> {
        let n = self.record(Call::CreateSync(export_uri.to_string()));
        Ok(SyncResponse {
            uri: format!("/syncs/{}", n),
            status: SyncStatus::Pending,
            synced_instance_uri: Some(export_uri.to_string()),
        })
    }

    fn get_sync(&self, sync_uri: &str) -> Result<SyncResponse> {
        self.record(Call::GetSync(sync_uri.to_string()));
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

    fn list_sync_logs(&self, sync_uri: &str) -> Result<Vec<SyncLogEntry>> {
        self.record(Call::ListSyncLogs(sync_uri.to_string()));
        Ok(self.logs.clone())
    }

    fn fetch_data(&self, sync_uri: &str, offset: usize, limit: usize) -> Result<ResultPage> {
        self.record(Call::FetchData {
            sync_uri: sync_uri.to_string(),
            offset,
            limit,
        });
        if limit == 0 {
            bail!("limit must be positive");
        }
        let limit = self.page_cap.map_or(limit, |cap| limit.min(cap));
        let items: Vec<Record> = self.records.iter().skip(offset).take(limit).cloned().collect();
        let has_more = offset + items.len() < self.records.len();
        let total = self.total_results.unwrap_or(self.records.len() as u64);
        Ok(ResultPage::new(items, has_more, total))
    }
}

/// Build a record with a single replication-key value plus an id
pub fn record(key: &str, value: &str, id: usize) -> Record {
    let mut record = Record::new();
    record.insert("id".to_string(), serde_json::Value::String(id.to_string()));
    record.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    record
}
