//! Eloqua Basic authentication
//!
//! Eloqua authenticates every request with a Basic header built from
//! `site\user:password`. The header is computed once and then shared
//! read-only by every request.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Precomputed Basic authorization for one Eloqua user
#[derive(Clone)]
pub struct BasicAuth {
    sitename: String,
    username: String,
    header_value: String,
}

impl BasicAuth {
    pub fn new(sitename: &str, username: &str, password: &str) -> Self {
        let credentials = format!("{}\\{}:{}", sitename, username, password);
        let header_value = format!("Basic {}", STANDARD.encode(credentials));

        Self {
            sitename: sitename.to_string(),
            username: username.to_string(),
            header_value,
        }
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> &str {
        &self.header_value
    }

    pub fn sitename(&self) -> &str {
        &self.sitename
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("sitename", &self.sitename)
            .field("username", &self.username)
            .field("header_value", &"<redacted>")
            .finish()
    }
}
