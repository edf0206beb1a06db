//! Domain error types.
//!
//! All errors are domain-specific and don't expose third-party types. The
//! taxonomy follows three families: unknown ids, business-rule violations
//! and upstream failures; [`ClinopsError::kind`] classifies a value into one
//! of them so the HTTP layer can map errors to status codes without
//! matching every variant.

use crate::domain::ids::{DoctorId, DrugId, InvoiceId, PatientId, PrescriptionId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type used throughout the crate.
#[derive(Debug, Error)]
pub enum ClinopsError {
    /// An entity id that does not exist in its store.
    #[error("{entity} not found with id: {id}")]
    NotFound {
        /// Entity name, e.g. `"Invoice"`.
        entity: &'static str,
        /// The id that failed to resolve, as supplied by the caller.
        id: String,
    },

    /// The doctor already has an appointment within the conflict window.
    #[error("Doctor {doctor_id} has another appointment within 30 minutes of {requested}")]
    SchedulingConflict {
        /// Doctor whose calendar rejected the booking.
        doctor_id: DoctorId,
        /// The requested appointment instant.
        requested: DateTime<Utc>,
    },

    /// The patient id could not be verified against the directory at booking
    /// time. Unlike read-path enrichment this failure is surfaced, because a
    /// booking for a non-existent patient must be rejected.
    #[error("Patient not found with id: {0}")]
    PatientNotFound(PatientId),

    /// Payment applied to an invoice that is already settled.
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(InvoiceId),

    /// Cancellation of a settled invoice.
    #[error("Cannot cancel a paid invoice (id: {0})")]
    CannotCancelPaid(InvoiceId),

    /// Payment applied to a cancelled invoice. Cancelled is terminal; no
    /// payment may resurrect the invoice.
    #[error("Invoice {0} is cancelled")]
    InvoiceCancelled(InvoiceId),

    /// A dispense or stock adjustment would take inventory below zero.
    #[error("Insufficient stock for drug '{drug}': available {available}, requested {requested}")]
    InsufficientStock {
        /// Display name of the drug that fell short.
        drug: String,
        /// Units currently on hand.
        available: u32,
        /// Units the operation asked for.
        requested: u32,
    },

    /// An item referenced a drug id that is not in the inventory.
    #[error("Drug not found with id: {0}")]
    DrugNotFound(DrugId),

    /// Dispense or cancel on a prescription that was already dispensed.
    #[error("Prescription {0} is already dispensed")]
    AlreadyDispensed(PrescriptionId),

    /// Malformed or out-of-range caller input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration file or environment problems.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Directory lookup failure. Callers on the read path recover from this
    /// locally with a placeholder name; it never aborts a committed mutation.
    #[error("Directory lookup failed: {0}")]
    Directory(String),

    /// Anything unexpected; surfaced as a generic 500.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown id → 404.
    NotFound,
    /// Rejected business rule or bad input → 400.
    BusinessRule,
    /// Upstream collaborator failure, recovered locally where possible.
    Upstream,
    /// Unexpected internal fault → 500.
    Internal,
}

impl ClinopsError {
    /// Convenience constructor for [`ClinopsError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies this error for status-code mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            // An unknown drug id is a missing entity wherever it surfaces,
            // prescription creation included.
            Self::NotFound { .. } | Self::DrugNotFound(_) => ErrorKind::NotFound,
            Self::SchedulingConflict { .. }
            | Self::PatientNotFound(_)
            | Self::AlreadyPaid(_)
            | Self::CannotCancelPaid(_)
            | Self::InvoiceCancelled(_)
            | Self::InsufficientStock { .. }
            | Self::AlreadyDispensed(_)
            | Self::Validation(_) => ErrorKind::BusinessRule,
            Self::Directory(_) => ErrorKind::Upstream,
            Self::Configuration(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ClinopsError::not_found("Invoice", 12u64);
        assert_eq!(err.to_string(), "Invoice not found with id: 12");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unknown_drug_is_not_found() {
        let err = ClinopsError::DrugNotFound(DrugId::new(9));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Drug not found with id: 9");
    }

    #[test]
    fn test_business_rule_kinds() {
        assert_eq!(
            ClinopsError::AlreadyPaid(InvoiceId::new(1)).kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            ClinopsError::InsufficientStock {
                drug: "Amoxicillin".into(),
                available: 3,
                requested: 100,
            }
            .kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            ClinopsError::Validation("bad status".into()).kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            ClinopsError::InvoiceCancelled(InvoiceId::new(1)).kind(),
            ErrorKind::BusinessRule
        );
    }

    #[test]
    fn test_insufficient_stock_message_names_the_drug() {
        let err = ClinopsError::InsufficientStock {
            drug: "Ibuprofen".into(),
            available: 6,
            requested: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("Ibuprofen"));
        assert!(msg.contains("available 6"));
        assert!(msg.contains("requested 10"));
    }

    #[test]
    fn test_directory_failures_are_upstream() {
        let err = ClinopsError::Directory("connect timeout".into());
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = ClinopsError::Internal("boom".into());
        let _: &dyn std::error::Error = &err;
    }
}
