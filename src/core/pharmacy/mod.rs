//! Pharmacy: drug inventory and prescription fulfillment.
//!
//! The two halves share one stock pool. [`Inventory`] owns the drugs and
//! their row locks; [`FulfillmentService`] borrows those locks for its
//! two-phase dispense so direct stock adjustments and dispensing can never
//! interleave on the same drug.

pub mod fulfillment;
pub mod inventory;

pub use fulfillment::{
    CreatePrescriptionRequest, FulfillmentService, PrescriptionItemRequest, PrescriptionView,
};
pub use inventory::Inventory;
