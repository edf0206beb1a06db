//! Appointment entity and status lifecycle.
//!
//! Appointments are never physically deleted; cancellation is a status
//! change. Timestamps and defaults are set explicitly by the constructor,
//! not by hidden persistence hooks.

use crate::domain::ids::{AppointmentId, DoctorId, PatientId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default appointment length when the caller does not supply one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Lifecycle status of an appointment.
///
/// Transitions are deliberately unguarded: any status is reachable from any
/// other via an explicit status update, matching the scheduling policy of
/// the system this replaces. `Completed`, `Cancelled` and `NoShow` are
/// terminal by convention only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scheduled => "SCHEDULED",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        };
        f.write_str(s)
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    /// Parses the wire form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(Self::Scheduled),
            "CONFIRMED" => Ok(Self::Confirmed),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "NO_SHOW" => Ok(Self::NoShow),
            other => Err(format!("unknown appointment status: {other:?}")),
        }
    }
}

/// A booked slot on a doctor's calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    /// The instant the visit is scheduled for.
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub duration_minutes: u32,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Creates a freshly booked appointment in `Scheduled` status.
    pub fn new(
        id: AppointmentId,
        patient_id: PatientId,
        doctor_id: DoctorId,
        scheduled_at: DateTime<Utc>,
        duration_minutes: Option<u32>,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            patient_id,
            doctor_id,
            scheduled_at,
            status: AppointmentStatus::Scheduled,
            duration_minutes: duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            reason,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status change and touches `updated_at`.
    pub fn set_status(&mut self, status: AppointmentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Whether this appointment has been cancelled. Cancelled slots do not
    /// block rebooking.
    pub fn is_cancelled(&self) -> bool {
        self.status == AppointmentStatus::Cancelled
    }
}
