//! HTTP implementation of the directory lookup port.
//!
//! Talks to the patient directory service over its `{success, message, data}`
//! envelope with a bounded timeout. Errors are mapped to
//! [`ClinopsError::Directory`] so no HTTP-client types leak upward.

use super::{DirectoryLookup, Person};
use crate::domain::errors::ClinopsError;
use crate::domain::ids::PatientId;
use crate::domain::result::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Directory response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Person>,
}

/// reqwest-backed directory client.
pub struct HttpDirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    /// Creates a client for the directory at `base_url` with a request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the underlying HTTP client cannot
    /// be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClinopsError::Configuration(format!("directory client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn person_url(&self, id: PatientId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

#[async_trait]
impl DirectoryLookup for HttpDirectoryClient {
    async fn fetch_person(&self, id: PatientId) -> Result<Person> {
        let url = self.person_url(id);
        tracing::debug!(patient_id = %id, url = %url, "directory lookup");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClinopsError::Directory(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClinopsError::Directory(format!(
                "directory returned {status} for person {id}"
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ClinopsError::Directory(format!("invalid response body: {e}")))?;

        if !envelope.success {
            return Err(ClinopsError::Directory(
                envelope
                    .message
                    .unwrap_or_else(|| "lookup unsuccessful".to_string()),
            ));
        }

        envelope
            .data
            .ok_or_else(|| ClinopsError::Directory(format!("no data for person {id}")))
    }
}
