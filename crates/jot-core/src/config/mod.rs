//! Remote backend configuration.
//!
//! The client needs an endpoint URL and a project identifier, both
//! environment-supplied. Database, collection, and bucket identifiers are
//! fixed constants of the hosted project.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Database holding the notes collection.
pub const DATABASE_ID: &str = "notes-db";
/// Document collection for notes.
pub const COLLECTION_ID: &str = "notes";
/// Storage bucket for note images.
pub const BUCKET_ID: &str = "note-images";

const ENDPOINT_ENV: &str = "APPWRITE_ENDPOINT";
const PROJECT_ENV: &str = "APPWRITE_PROJECT_ID";
const TIMEOUT_ENV: &str = "APPWRITE_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub project_id: String,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(endpoint: impl AsRef<str>, project_id: impl Into<String>) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint.as_ref())?;
        let project_id = project_id.into().trim().to_string();
        if project_id.is_empty() {
            return Err(Error::Config("project id must not be empty".to_string()));
        }

        Ok(Self {
            endpoint,
            project_id,
            timeout: default_timeout(),
        })
    }

    /// Read the endpoint and project id from the environment.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .map_err(|_| Error::Config(format!("{ENDPOINT_ENV} is not set")))?;
        let project_id = std::env::var(PROJECT_ENV)
            .map_err(|_| Error::Config(format!("{PROJECT_ENV} is not set")))?;

        let mut config = Self::new(endpoint, project_id)?;
        if let Some(timeout) = parse_timeout_secs(std::env::var(TIMEOUT_ENV).ok())? {
            config.timeout = timeout;
        }
        Ok(config)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

const fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

fn normalize_endpoint(raw: &str) -> Result<String> {
    let endpoint = raw.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(Error::Config("endpoint must not be empty".to_string()));
    }
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(Error::Config(
            "endpoint must include http:// or https://".to_string(),
        ));
    }
    Ok(endpoint.to_string())
}

fn parse_timeout_secs(raw: Option<String>) -> Result<Option<Duration>> {
    let Some(raw) = raw else { return Ok(None) };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let secs: u64 = raw
        .parse()
        .map_err(|_| Error::Config(format!("{TIMEOUT_ENV} must be a whole number of seconds")))?;
    if secs == 0 {
        return Err(Error::Config(format!("{TIMEOUT_ENV} must be at least 1")));
    }
    Ok(Some(Duration::from_secs(secs)))
}
