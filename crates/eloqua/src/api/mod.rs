//! Eloqua Bulk API integration
//!
//! This module provides:
//! - Basic authentication header construction
//! - The `BulkApi` seam the export engine talks through
//! - A blocking HTTP client implementing it

mod auth;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod traits;

pub use auth::BasicAuth;
pub use client::{ApiStatusError, EloquaClient};
pub use traits::BulkApi;

/// Bulk API response types
pub mod types {
    use serde::{Deserialize, Serialize};

    use crate::models::Record;

    /// Paged collection envelope used by every list endpoint
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListResponse<T> {
        #[serde(default = "Vec::new")]
        pub items: Vec<T>,
        #[serde(default)]
        pub has_more: bool,
        #[serde(default)]
        pub total_results: u64,
        #[serde(default)]
        pub offset: Option<u64>,
        #[serde(default)]
        pub limit: Option<u64>,
        #[serde(default)]
        pub count: Option<u64>,
    }

    impl<T> ListResponse<T> {
        pub fn new(items: Vec<T>, has_more: bool, total_results: u64) -> Self {
            let count = items.len() as u64;
            Self {
                items,
                has_more,
                total_results,
                offset: None,
                limit: None,
                count: Some(count),
            }
        }
    }

    /// One page of exported records
    pub type ResultPage = ListResponse<Record>;

    /// Field definition from `/{entity}/fields`
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FieldDefinition {
        #[serde(default)]
        pub name: Option<String>,
        pub internal_name: String,
        pub statement: String,
        #[serde(default)]
        pub data_type: Option<String>,
        /// Activity types carrying this field (activity fields only)
        #[serde(default)]
        pub activity_types: Option<Vec<String>>,
    }

    /// Response to export definition creation
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExportResponse {
        pub uri: String,
        #[serde(default)]
        pub name: Option<String>,
    }

    /// Body of `POST /syncs`
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SyncRequest {
        pub synced_instance_uri: String,
    }

    /// Sync lifecycle as reported by the vendor
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum SyncStatus {
        Pending,
        Active,
        Success,
        Warning,
        Error,
    }

    impl SyncStatus {
        /// Still running (`pending` is reported before a sync starts)
        pub fn is_running(&self) -> bool {
            matches!(self, SyncStatus::Pending | SyncStatus::Active)
        }
    }

    /// Response to sync creation and status lookups
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SyncResponse {
        pub uri: String,
        pub status: SyncStatus,
        #[serde(default)]
        pub synced_instance_uri: Option<String>,
    }

    /// One entry of `{sync}/logs`
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SyncLogEntry {
        pub severity: String,
        pub message: String,
        #[serde(default)]
        pub status_code: Option<String>,
        #[serde(default)]
        pub count: Option<u64>,
    }

    impl SyncLogEntry {
        /// Informational entries carry no diagnostic value for failures
        pub fn is_informational(&self) -> bool {
            self.severity.eq_ignore_ascii_case("information")
        }
    }

    /// `urls` section of the login identity response
    #[derive(Debug, Clone, Deserialize)]
    pub struct IdentityUrls {
        pub base: String,
    }

    /// Response of the fixed identity endpoint used to resolve the pod base URL
    #[derive(Debug, Clone, Deserialize)]
    pub struct IdentityResponse {
        pub urls: IdentityUrls,
    }
}

#[cfg(test)]
mod tests {
    use super::types::*;

    #[test]
    fn test_parse_data_page() {
        let json = r#"{
            "totalResults": 2,
            "limit": 50000,
            "offset": 0,
            "count": 2,
            "hasMore": false,
            "items": [
                {"c_emailaddress": "a@example.com", "c_datemodified": "2024-01-01 10:00:00.000"},
                {"c_emailaddress": "b@example.com", "c_datemodified": "2024-01-02 10:00:00.000"}
            ]
        }"#;

        let page: ResultPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_results, 2);
        assert!(!page.has_more);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0]["c_emailaddress"], "a@example.com");
    }

    #[test]
    fn test_parse_empty_data_page() {
        let json = r#"{"totalResults": 0, "limit": 50000, "offset": 0, "count": 0, "hasMore": false}"#;
        let page: ResultPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_results, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_parse_sync_status() {
        let json = r#"{"syncedInstanceUri": "/contacts/exports/42", "status": "pending", "uri": "/syncs/7"}"#;
        let sync: SyncResponse = serde_json::from_str(json).unwrap();
        assert_eq!(sync.uri, "/syncs/7");
        assert!(sync.status.is_running());
        assert_eq!(sync.synced_instance_uri.as_deref(), Some("/contacts/exports/42"));

        let warning: SyncStatus = serde_json::from_str(r#""warning""#).unwrap();
        assert!(!warning.is_running());
    }

    #[test]
    fn test_parse_fields() {
        let json = r#"{
            "items": [
                {
                    "name": "Activity Date",
                    "internalName": "ActivityDate",
                    "statement": "{{Activity.CreatedAt}}",
                    "dataType": "date",
                    "activityTypes": ["EmailOpen", "EmailSend"]
                },
                {"internalName": "C_EmailAddress", "statement": "{{Contact.Field(C_EmailAddress)}}"}
            ],
            "totalResults": 2,
            "hasMore": false
        }"#;

        let fields: ListResponse<FieldDefinition> = serde_json::from_str(json).unwrap();
        assert_eq!(fields.items.len(), 2);
        assert_eq!(
            fields.items[0].activity_types.as_deref(),
            Some(&["EmailOpen".to_string(), "EmailSend".to_string()][..])
        );
        assert!(fields.items[1].activity_types.is_none());
    }

    #[test]
    fn test_log_severity() {
        let info = SyncLogEntry {
            severity: "information".to_string(),
            message: "Total records staged for export.".to_string(),
            status_code: Some("ELQ-00001".to_string()),
            count: Some(10),
        };
        assert!(info.is_informational());

        let error = SyncLogEntry {
            severity: "error".to_string(),
            ..info
        };
        assert!(!error.is_informational());
    }
}
