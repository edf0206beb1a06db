//! Domain models and types.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientId`], [`DoctorId`], [`DrugId`], …)
//! - **Entities** ([`Appointment`], [`Invoice`], [`Prescription`], [`Drug`])
//! - **Error taxonomy** ([`ClinopsError`], [`ErrorKind`])
//! - **Result alias** ([`Result`])
//!
//! Entities set their own timestamps and defaults in explicit constructors;
//! there are no hidden lifecycle hooks. The invariants the engines preserve
//! (ledger reconciliation, stock non-negativity) live as close to the data
//! as possible: `Invoice::apply_payment_amount` and `Drug::remove_stock` are
//! the only mutation paths for their respective fields.

pub mod appointment;
pub mod drug;
pub mod errors;
pub mod ids;
pub mod invoice;
pub mod prescription;
pub mod result;

pub use appointment::{Appointment, AppointmentStatus};
pub use drug::{Drug, DrugSpec};
pub use errors::{ClinopsError, ErrorKind};
pub use ids::{
    AppointmentId, DoctorId, DrugId, IdSequence, InvoiceId, PatientId, PaymentId, PrescriptionId,
    ReferenceGenerator,
};
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, Payment, PaymentMethod, PaymentStatus};
pub use prescription::{Prescription, PrescriptionItem, PrescriptionStatus};
pub use result::Result;
