//! Raw export records

use serde_json::{Map, Value};

/// One exported row, keyed by lower-cased output field name
pub type Record = Map<String, Value>;

/// A page of records pulled from a sync, tagged with the offset it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub offset: usize,
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(offset: usize, records: Vec<Record>) -> Self {
        Self { offset, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
