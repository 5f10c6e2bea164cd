//! Eloqua Bulk API HTTP client
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic. One client holds
//! the agent, the auth header and the resolved base URL; all of them are
//! read-only after construction so a client can be shared across threads.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use ureq::Agent;

use super::BasicAuth;
use super::BulkApi;
use super::types::{
    ExportResponse, FieldDefinition, IdentityResponse, ListResponse, ResultPage, SyncLogEntry,
    SyncRequest, SyncResponse,
};
use crate::config::ExportSettings;
use crate::export::ExportDefinition;
use crate::models::BulkEntity;

/// Error for a non-2xx response, keeping the body for diagnosis
#[derive(Debug, thiserror::Error)]
#[error("Eloqua API returned HTTP {status} for {method} {url}: {body}")]
pub struct ApiStatusError {
    pub status: u16,
    pub method: &'static str,
    pub url: String,
    pub body: String,
}

/// Enforces a minimum gap between consecutive requests
struct Throttle {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Throttle {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Block until the delay since the previous request has passed.
    ///
    /// The lock is held while sleeping so parallel workers queue up behind
    /// each other instead of bursting.
    fn wait(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

/// Blocking client for the Eloqua Bulk API 2.0
pub struct EloquaClient {
    agent: Agent,
    auth: BasicAuth,
    base_url: String,
    throttle: Throttle,
}

impl EloquaClient {
    /// Identity endpoint that resolves the account's pod
    const LOGIN_URL: &'static str = "https://login.eloqua.com/id";

    /// Bulk API root, relative to the pod base URL
    const BULK_PATH: &'static str = "/api/bulk/2.0";

    /// Resolve the account's base URL and create a client for it
    pub fn connect(auth: BasicAuth, settings: &ExportSettings) -> Result<Self> {
        let mut client = Self::with_base_url(auth, "", settings)?;
        let base_url = client.discover_base_url()?;
        debug!("Resolved Eloqua base URL: {}", base_url);
        client.base_url = base_url;
        Ok(client)
    }

    /// Create a client against a known base URL (skips discovery)
    pub fn with_base_url(auth: BasicAuth, base_url: &str, settings: &ExportSettings) -> Result<Self> {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(settings.request_timeout()))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            agent,
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle: Throttle::new(settings.request_delay()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the identity endpoint which pod hosts this account
    fn discover_base_url(&self) -> Result<String> {
        let body: serde_json::Value = self
            .get_json(Self::LOGIN_URL, &[])
            .context("Failed to resolve Eloqua base URL")?;

        // The endpoint answers with a bare JSON string when credentials are rejected
        if let Some(message) = body.as_str() {
            bail!("Eloqua rejected credentials for site '{}': {}", self.auth.sitename(), message);
        }

        let identity: IdentityResponse =
            serde_json::from_value(body).context("Failed to parse identity response")?;
        let base = url::Url::parse(&identity.urls.base)
            .with_context(|| format!("Invalid base URL from identity endpoint: {}", identity.urls.base))?;

        Ok(base.as_str().trim_end_matches('/').to_string())
    }

    /// Build a bulk API URL from a path or vendor URI (e.g. `/syncs/12`)
    fn bulk_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, Self::BULK_PATH, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        self.throttle.wait();
        debug!("GET {}", url);

        let mut request = self
            .agent
            .get(url)
            .header("Authorization", self.auth.header_value())
            .header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let mut response = request
            .call()
            .with_context(|| format!("Failed to send GET {}", url))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(ApiStatusError {
                status,
                method: "GET",
                url: url.to_string(),
                body,
            }
            .into());
        }

        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse response from GET {}", url))
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        self.throttle.wait();
        debug!("POST {}", url);

        let mut response = self
            .agent
            .post(url)
            .header("Authorization", self.auth.header_value())
            .header("Accept", "application/json")
            .send_json(body)
            .with_context(|| format!("Failed to send POST {}", url))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(ApiStatusError {
                status,
                method: "POST",
                url: url.to_string(),
                body,
            }
            .into());
        }

        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse response from POST {}", url))
    }
}

impl BulkApi for EloquaClient {
    fn list_fields(
        &self,
        entity: BulkEntity,
        offset: usize,
        limit: usize,
    ) -> Result<ListResponse<FieldDefinition>> {
        let url = self.bulk_url(&format!("{}/fields", entity.path()));
        self.get_json(
            &url,
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
    }

    fn create_export(
        &self,
        entity: BulkEntity,
        definition: &ExportDefinition,
    ) -> Result<ExportResponse> {
        let url = self.bulk_url(&format!("{}/exports", entity.path()));
        self.post_json(&url, definition)
    }

    fn create_sync(&self, export_uri: &str) -> Result<SyncResponse> {
        let url = self.bulk_url("syncs");
        let body = SyncRequest {
            synced_instance_uri: export_uri.to_string(),
        };
        self.post_json(&url, &body)
    }

    fn get_sync(&self, sync_uri: &str) -> Result<SyncResponse> {
        self.get_json(&self.bulk_url(sync_uri), &[])
    }

    fn list_sync_logs(&self, sync_uri: &str) -> Result<Vec<SyncLogEntry>> {
        let url = self.bulk_url(&format!("{}/logs", sync_uri.trim_end_matches('/')));
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let page: ListResponse<SyncLogEntry> = self.get_json(
                &url,
                &[("offset", offset.to_string()), ("limit", "1000".to_string())],
            )?;
            offset += page.items.len();
            let done = !page.has_more || page.items.is_empty();
            entries.extend(page.items);
            if done {
                break;
            }
        }

        Ok(entries)
    }

    fn fetch_data(&self, sync_uri: &str, offset: usize, limit: usize) -> Result<ResultPage> {
        let url = self.bulk_url(&format!("{}/data", sync_uri.trim_end_matches('/')));
        self.get_json(
            &url,
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
    }
}
