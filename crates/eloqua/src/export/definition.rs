//! Export definition request bodies

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{StreamDescriptor, TimeWindow, format_timestamp};

/// Field statement the vendor uses for an activity's type
pub const ACTIVITY_TYPE_STATEMENT: &str = "{{Activity.Type}}";

/// Vendor limit on export definition names
const MAX_NAME_LEN: usize = 100;

/// Body of `POST /{entity}/exports` for one window
///
/// The window and event type are kept alongside the rendered filter for
/// logging; only `name`, `fields` and `filter` go over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDefinition {
    pub name: String,
    pub fields: BTreeMap<String, String>,
    pub filter: String,
    #[serde(skip)]
    pub window: TimeWindow,
    #[serde(skip)]
    pub event_type: Option<String>,
}

/// Build the export definition for one window of a sub-stream.
///
/// The filter is the conjunction of the clauses that apply:
/// replication key `>=` window start, `<` window end when bounded, and the
/// activity type for event sub-streams.
pub fn build_export_definition(
    descriptor: &StreamDescriptor,
    window: &TimeWindow,
    event_type: Option<&str>,
) -> ExportDefinition {
    let key = descriptor.replication_statement();

    let mut clauses = vec![format!("'{}' >= '{}'", key, format_timestamp(&window.start()))];
    if let Some(end) = window.end() {
        clauses.push(format!("'{}' < '{}'", key, format_timestamp(&end)));
    }
    if let Some(event_type) = event_type {
        clauses.push(format!("'{}' = '{}'", ACTIVITY_TYPE_STATEMENT, event_type));
    }

    ExportDefinition {
        name: export_name(descriptor.name(), window),
        fields: descriptor.fields().clone(),
        filter: clauses.join(" AND "),
        window: *window,
        event_type: event_type.map(str::to_string),
    }
}

fn export_name(stream: &str, window: &TimeWindow) -> String {
    let mut name = format!("tap-eloqua {} {}", stream, window);
    if name.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}
