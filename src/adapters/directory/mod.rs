//! Patient directory lookup.
//!
//! The directory is an external collaborator used two ways:
//!
//! - **Existence check** at booking time, through the fallible
//!   [`DirectoryLookup`] port (a failure rejects the booking).
//! - **Best-effort enrichment** on read paths, through [`NameResolver`],
//!   which never fails its caller: any error is swallowed and replaced with
//!   the `"Unknown"` placeholder. Enrichment runs after the owning mutation
//!   has committed and outside any engine lock.

pub mod client;

pub use client::HttpDirectoryClient;

use crate::domain::ids::PatientId;
use crate::domain::result::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Placeholder substituted when a name cannot be resolved.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A person record as the directory exposes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    /// `"First Last"` display form.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fallible directory port.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Fetches a person by id.
    ///
    /// # Errors
    ///
    /// Returns [`ClinopsError::Directory`](crate::domain::ClinopsError::Directory)
    /// on transport failure, timeout, or an unknown id.
    async fn fetch_person(&self, id: PatientId) -> Result<Person>;
}

/// Non-fallible wrapper around the directory port.
///
/// This is the read-path face of the directory: it resolves a display name
/// or degrades to [`UNKNOWN_NAME`], and its failure never propagates into
/// the operation it decorates.
#[derive(Clone)]
pub struct NameResolver {
    lookup: Arc<dyn DirectoryLookup>,
}

impl NameResolver {
    /// Wraps a directory port.
    pub fn new(lookup: Arc<dyn DirectoryLookup>) -> Self {
        Self { lookup }
    }

    /// Resolves a patient's display name, substituting the placeholder on
    /// any failure.
    pub async fn display_name(&self, id: PatientId) -> String {
        match self.lookup.fetch_person(id).await {
            Ok(person) => person.display_name(),
            Err(err) => {
                tracing::warn!(patient_id = %id, error = %err, "name lookup failed, using placeholder");
                UNKNOWN_NAME.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClinopsError;

    struct FixedDirectory;

    #[async_trait]
    impl DirectoryLookup for FixedDirectory {
        async fn fetch_person(&self, id: PatientId) -> Result<Person> {
            if id.value() == 1 {
                Ok(Person {
                    id,
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                })
            } else {
                Err(ClinopsError::Directory("no such person".into()))
            }
        }
    }

    #[tokio::test]
    async fn test_resolver_returns_display_name() {
        let resolver = NameResolver::new(Arc::new(FixedDirectory));
        assert_eq!(
            resolver.display_name(PatientId::new(1)).await,
            "Ada Lovelace"
        );
    }

    #[tokio::test]
    async fn test_resolver_degrades_to_placeholder() {
        let resolver = NameResolver::new(Arc::new(FixedDirectory));
        assert_eq!(resolver.display_name(PatientId::new(99)).await, UNKNOWN_NAME);
    }
}
