//! Strongly-typed entity identifiers and reference-number generation.
//!
//! Every entity id is a newtype over `u64` so that a patient id can never be
//! passed where a drug id is expected. Human-facing reference numbers
//! (`INV-…`, `RX-…`, `SKU-…`) come from [`ReferenceGenerator`], which combines
//! a per-type monotonic counter with a random suffix so that concurrent
//! creation cannot collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw numeric id.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw numeric value.
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>()
                    .map(Self)
                    .map_err(|_| format!("invalid {}: {s:?}", stringify!($name)))
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a patient record in the patient directory.
    PatientId
);
entity_id!(
    /// Identifier of a doctor.
    DoctorId
);
entity_id!(
    /// Identifier of an appointment.
    AppointmentId
);
entity_id!(
    /// Identifier of an invoice.
    InvoiceId
);
entity_id!(
    /// Identifier of a payment record.
    PaymentId
);
entity_id!(
    /// Identifier of a prescription.
    PrescriptionId
);
entity_id!(
    /// Identifier of a drug in the inventory.
    DrugId
);

/// Allocates sequential entity ids.
///
/// Each store owns one sequence; ids start at 1 so that 0 never appears in
/// responses.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    /// Creates a sequence starting at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next id in the sequence.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates unique, human-readable reference numbers such as
/// `INV-000042-9F3A`.
///
/// The counter makes the reference unique within a process; the random
/// suffix keeps references from colliding across restarts, replacing the
/// wall-clock-millis scheme that is unsafe under concurrent creation.
#[derive(Debug)]
pub struct ReferenceGenerator {
    prefix: &'static str,
    counter: AtomicU64,
}

impl ReferenceGenerator {
    /// Creates a generator for the given prefix (e.g. `"INV"`, `"RX"`).
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: AtomicU64::new(1),
        }
    }

    /// Produces the next reference number.
    pub fn next(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let suffix: u16 = rand::random();
        format!("{}-{:06}-{:04X}", self.prefix, seq, suffix)
    }
}
