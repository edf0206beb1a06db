//! Drug inventory entity.
//!
//! Stock is the shared mutable resource of the pharmacy: both the
//! fulfillment engine and direct stock adjustments mutate it, and it must
//! never go negative. The quantity is a `u32` so the type system rules out
//! negative stock; subtraction goes through [`Drug::remove_stock`], which
//! rejects drops below zero instead of wrapping.

use crate::domain::errors::ClinopsError;
use crate::domain::ids::DrugId;
use crate::domain::result::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stocked pharmacy product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    pub id: DrugId,
    pub name: String,
    pub generic_name: Option<String>,
    /// Unique stock-keeping unit, generated at creation.
    pub sku: String,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub stock_quantity: u32,
    /// Stock at or below this level counts as "low".
    pub reorder_level: u32,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub requires_prescription: bool,
    /// Soft-delete flag; inactive drugs disappear from listings but keep
    /// their history.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for creating or updating a drug.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugSpec {
    pub name: String,
    pub generic_name: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub reorder_level: u32,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    #[serde(default)]
    pub requires_prescription: bool,
}

impl Drug {
    /// Creates an active drug from a spec with a generated SKU.
    pub fn new(id: DrugId, sku: String, spec: DrugSpec) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: spec.name,
            generic_name: spec.generic_name,
            sku,
            manufacturer: spec.manufacturer,
            category: spec.category,
            description: spec.description,
            unit_price: spec.unit_price,
            stock_quantity: spec.stock_quantity,
            reorder_level: spec.reorder_level,
            expiry_date: spec.expiry_date,
            batch_number: spec.batch_number,
            requires_prescription: spec.requires_prescription,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the descriptive fields from a spec. Stock is not touched;
    /// it changes only through the explicit stock operations.
    pub fn update_details(&mut self, spec: DrugSpec) {
        self.name = spec.name;
        self.generic_name = spec.generic_name;
        self.manufacturer = spec.manufacturer;
        self.category = spec.category;
        self.description = spec.description;
        self.unit_price = spec.unit_price;
        self.reorder_level = spec.reorder_level;
        if spec.expiry_date.is_some() {
            self.expiry_date = spec.expiry_date;
        }
        self.batch_number = spec.batch_number;
        self.updated_at = Utc::now();
    }

    /// Adds received units to stock, failing if the total would overflow.
    pub fn add_stock(&mut self, quantity: u32) -> Result<()> {
        match self.stock_quantity.checked_add(quantity) {
            Some(total) => {
                self.stock_quantity = total;
                self.updated_at = Utc::now();
                Ok(())
            }
            None => Err(ClinopsError::Validation(format!(
                "stock addition overflows: {} on hand + {} received",
                self.stock_quantity, quantity
            ))),
        }
    }

    /// Removes units from stock, failing if that would go below zero.
    pub fn remove_stock(&mut self, quantity: u32) -> Result<()> {
        match self.stock_quantity.checked_sub(quantity) {
            Some(remaining) => {
                self.stock_quantity = remaining;
                self.updated_at = Utc::now();
                Ok(())
            }
            None => Err(ClinopsError::InsufficientStock {
                drug: self.name.clone(),
                available: self.stock_quantity,
                requested: quantity,
            }),
        }
    }

    /// Whether current stock is at or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }

    /// Soft-deletes the drug.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spec(stock: u32, reorder: u32) -> DrugSpec {
        DrugSpec {
            name: "Amoxicillin".into(),
            generic_name: Some("amoxicillin".into()),
            manufacturer: None,
            category: Some("antibiotic".into()),
            description: None,
            unit_price: dec!(4.50),
            stock_quantity: stock,
            reorder_level: reorder,
            expiry_date: None,
            batch_number: None,
            requires_prescription: true,
        }
    }

    #[test]
    fn test_new_drug_is_active() {
        let drug = Drug::new(DrugId::new(1), "SKU-000001-AAAA".into(), spec(10, 5));
        assert!(drug.active);
        assert_eq!(drug.stock_quantity, 10);
    }

    #[test]
    fn test_remove_stock_happy_path() {
        let mut drug = Drug::new(DrugId::new(1), "SKU".into(), spec(10, 5));
        drug.remove_stock(4).unwrap();
        assert_eq!(drug.stock_quantity, 6);
    }

    #[test]
    fn test_remove_stock_never_goes_negative() {
        let mut drug = Drug::new(DrugId::new(1), "SKU".into(), spec(6, 5));
        let err = drug.remove_stock(10).unwrap_err();
        assert!(matches!(
            err,
            ClinopsError::InsufficientStock {
                available: 6,
                requested: 10,
                ..
            }
        ));
        // Rejected removal leaves stock untouched.
        assert_eq!(drug.stock_quantity, 6);
    }

    #[test]
    fn test_add_stock_overflow_is_rejected() {
        let mut drug = Drug::new(DrugId::new(1), "SKU".into(), spec(u32::MAX - 1, 5));
        drug.add_stock(1).unwrap();
        assert_eq!(drug.stock_quantity, u32::MAX);

        let err = drug.add_stock(1).unwrap_err();
        assert!(matches!(err, ClinopsError::Validation(_)));
        // Rejected addition leaves stock untouched.
        assert_eq!(drug.stock_quantity, u32::MAX);
    }

    #[test]
    fn test_low_stock_boundary() {
        let mut drug = Drug::new(DrugId::new(1), "SKU".into(), spec(6, 5));
        assert!(!drug.is_low_stock());
        drug.remove_stock(1).unwrap();
        assert!(drug.is_low_stock());
    }

    #[test]
    fn test_update_details_leaves_stock_alone() {
        let mut drug = Drug::new(DrugId::new(1), "SKU".into(), spec(10, 5));
        let mut changed = spec(999, 2);
        changed.name = "Amoxicillin 500".into();
        drug.update_details(changed);
        assert_eq!(drug.name, "Amoxicillin 500");
        assert_eq!(drug.reorder_level, 2);
        assert_eq!(drug.stock_quantity, 10);
    }

    #[test]
    fn test_deactivate_is_soft() {
        let mut drug = Drug::new(DrugId::new(1), "SKU".into(), spec(10, 5));
        drug.deactivate();
        assert!(!drug.active);
        assert_eq!(drug.stock_quantity, 10);
    }
}
