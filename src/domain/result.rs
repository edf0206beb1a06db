//! Result type alias used throughout the crate.

use crate::domain::errors::ClinopsError;

/// Shorthand for `Result<T, ClinopsError>`.
pub type Result<T> = std::result::Result<T, ClinopsError>;
