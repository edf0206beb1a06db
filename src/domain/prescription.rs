//! Prescription entity and its dispense lifecycle.

use crate::domain::ids::{DoctorId, DrugId, PatientId, PrescriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fulfillment status of a prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
    /// Carried for wire compatibility; the two-phase dispense never leaves a
    /// prescription half-filled, so nothing sets this in practice.
    PartiallyDispensed,
    Cancelled,
    Expired,
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Dispensed => "DISPENSED",
            Self::PartiallyDispensed => "PARTIALLY_DISPENSED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

impl FromStr for PrescriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "DISPENSED" => Ok(Self::Dispensed),
            "PARTIALLY_DISPENSED" => Ok(Self::PartiallyDispensed),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(format!("unknown prescription status: {other:?}")),
        }
    }
}

/// One drug line on a prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItem {
    pub drug_id: DrugId,
    pub quantity: u32,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<u32>,
    pub instructions: Option<String>,
    pub dispensed_quantity: u32,
    pub dispensed: bool,
}

impl PrescriptionItem {
    /// Creates an undispensed item.
    pub fn new(
        drug_id: DrugId,
        quantity: u32,
        dosage: Option<String>,
        frequency: Option<String>,
        duration_days: Option<u32>,
        instructions: Option<String>,
    ) -> Self {
        Self {
            drug_id,
            quantity,
            dosage,
            frequency,
            duration_days,
            instructions,
            dispensed_quantity: 0,
            dispensed: false,
        }
    }

    /// Marks the full quantity handed out.
    pub fn mark_dispensed(&mut self) {
        self.dispensed_quantity = self.quantity;
        self.dispensed = true;
    }
}

/// A multi-item prescription written by a doctor for a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: PrescriptionId,
    pub prescription_number: String,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub items: Vec<PrescriptionItem>,
    pub status: PrescriptionStatus,
    pub notes: Option<String>,
    pub prescribed_at: DateTime<Utc>,
    pub dispensed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    /// Creates a pending prescription. Inventory is untouched at this point.
    pub fn new(
        id: PrescriptionId,
        prescription_number: String,
        patient_id: PatientId,
        doctor_id: DoctorId,
        items: Vec<PrescriptionItem>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            prescription_number,
            patient_id,
            doctor_id,
            items,
            status: PrescriptionStatus::Pending,
            notes,
            prescribed_at: now,
            dispensed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks every item dispensed and settles the prescription. Called only
    /// after the fulfillment engine has validated and decremented stock for
    /// the entire item list.
    pub fn mark_dispensed(&mut self) {
        for item in &mut self.items {
            item.mark_dispensed();
        }
        self.status = PrescriptionStatus::Dispensed;
        let now = Utc::now();
        self.dispensed_at = Some(now);
        self.updated_at = now;
    }

    /// Marks the prescription cancelled. The caller must have rejected
    /// dispensed prescriptions first.
    pub fn cancel(&mut self) {
        debug_assert!(self.status != PrescriptionStatus::Dispensed);
        self.status = PrescriptionStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    /// Whether the prescription has already been dispensed.
    pub fn is_dispensed(&self) -> bool {
        self.status == PrescriptionStatus::Dispensed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Prescription {
        Prescription::new(
            PrescriptionId::new(1),
            "RX-000001-TEST".into(),
            PatientId::new(3),
            DoctorId::new(9),
            vec![
                PrescriptionItem::new(
                    DrugId::new(1),
                    10,
                    Some("500mg".into()),
                    Some("2x daily".into()),
                    Some(5),
                    None,
                ),
                PrescriptionItem::new(DrugId::new(2), 4, None, None, None, None),
            ],
            None,
        )
    }

    #[test]
    fn test_new_prescription_is_pending() {
        let rx = sample();
        assert_eq!(rx.status, PrescriptionStatus::Pending);
        assert!(rx.dispensed_at.is_none());
        assert!(rx.items.iter().all(|i| !i.dispensed));
        assert!(rx.items.iter().all(|i| i.dispensed_quantity == 0));
    }

    #[test]
    fn test_mark_dispensed_fills_every_item() {
        let mut rx = sample();
        rx.mark_dispensed();
        assert!(rx.is_dispensed());
        assert!(rx.dispensed_at.is_some());
        for item in &rx.items {
            assert!(item.dispensed);
            assert_eq!(item.dispensed_quantity, item.quantity);
        }
    }

    #[test]
    fn test_cancel_pending() {
        let mut rx = sample();
        rx.cancel();
        assert_eq!(rx.status, PrescriptionStatus::Cancelled);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "partially_dispensed".parse::<PrescriptionStatus>(),
            Ok(PrescriptionStatus::PartiallyDispensed)
        );
        assert!("FILLED".parse::<PrescriptionStatus>().is_err());
    }
}
