//! Appointment scheduling.
//!
//! The invariant guarded here: no doctor is double-booked within the
//! ±30-minute conflict window. Everything else on an appointment is
//! unguarded status bookkeeping.

mod engine;

pub use engine::{AppointmentView, BookingRequest, SchedulingService, CONFLICT_WINDOW_MINUTES};
