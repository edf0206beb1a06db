//! Business logic: the three invariant-preserving engines.
//!
//! - [`scheduling`] — no doctor double-booked within the ±30-minute window.
//! - [`billing`] — ledger reconciliation between payments and invoice status.
//! - [`pharmacy`] — atomic multi-item dispensing against shared stock.
//!
//! The engines are peers: none calls another, they share only the
//! cross-service ids and the [`locks`] primitive that gives each of them
//! per-entity serialization.

pub mod billing;
pub mod locks;
pub mod pharmacy;
pub mod scheduling;

pub use billing::BillingService;
pub use locks::KeyedLocks;
pub use pharmacy::{FulfillmentService, Inventory};
pub use scheduling::SchedulingService;
