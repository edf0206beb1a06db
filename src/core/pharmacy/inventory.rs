//! Drug inventory store and stock operations.
//!
//! Stock is the shared mutable resource of the pharmacy. Direct adjustments
//! and the fulfillment engine both go through this store; every mutation
//! path funnels into [`Drug::remove_stock`]/[`Drug::add_stock`], so stock
//! can never go negative.

use crate::core::locks::KeyedLocks;
use crate::domain::drug::{Drug, DrugSpec};
use crate::domain::errors::ClinopsError;
use crate::domain::ids::{DrugId, IdSequence, ReferenceGenerator};
use crate::domain::result::Result;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::OwnedMutexGuard;

/// The drug inventory.
///
/// Per-drug keyed locks serialize stock movement on the same drug while
/// leaving unrelated drugs fully parallel. The fulfillment engine borrows
/// those locks for its two-phase dispense.
pub struct Inventory {
    drugs: RwLock<HashMap<DrugId, Drug>>,
    ids: IdSequence,
    skus: ReferenceGenerator,
    drug_locks: KeyedLocks<DrugId>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self {
            drugs: RwLock::new(HashMap::new()),
            ids: IdSequence::new(),
            skus: ReferenceGenerator::new("SKU"),
            drug_locks: KeyedLocks::new(),
        }
    }

    /// Registers a new active drug with a generated SKU.
    pub fn create_drug(&self, spec: DrugSpec) -> Drug {
        let drug = Drug::new(DrugId::new(self.ids.next()), self.skus.next(), spec);
        self.write().insert(drug.id, drug.clone());
        tracing::info!(drug_id = %drug.id, sku = %drug.sku, name = %drug.name, "drug created");
        drug
    }

    /// Updates a drug's descriptive fields. Stock is untouched.
    pub fn update_drug(&self, id: DrugId, spec: DrugSpec) -> Result<Drug> {
        let mut drugs = self.write();
        let drug = drugs.get_mut(&id).ok_or(ClinopsError::DrugNotFound(id))?;
        drug.update_details(spec);
        Ok(drug.clone())
    }

    /// Fetches one drug.
    pub fn get(&self, id: DrugId) -> Result<Drug> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or(ClinopsError::DrugNotFound(id))
    }

    /// All active drugs, ordered by id.
    pub fn list_active(&self) -> Vec<Drug> {
        self.collect(|d| d.active)
    }

    /// Active drugs whose name or generic name contains the query,
    /// case-insensitively.
    pub fn search(&self, name: &str) -> Vec<Drug> {
        let needle = name.to_lowercase();
        self.collect(|d| {
            d.active
                && (d.name.to_lowercase().contains(&needle)
                    || d.generic_name
                        .as_deref()
                        .is_some_and(|g| g.to_lowercase().contains(&needle)))
        })
    }

    /// Active drugs at or below their reorder level.
    pub fn low_stock(&self) -> Vec<Drug> {
        self.collect(|d| d.active && d.is_low_stock())
    }

    /// Active drugs expiring within the next `days` days.
    pub fn expiring_within(&self, days: u32) -> Vec<Drug> {
        let cutoff = Utc::now().date_naive() + Duration::days(i64::from(days));
        self.collect(|d| d.active && d.expiry_date.is_some_and(|e| e <= cutoff))
    }

    /// Adds or removes stock.
    ///
    /// Runs under the drug's row lock so a concurrent pair of removals
    /// cannot both pass the availability check.
    ///
    /// # Errors
    ///
    /// [`ClinopsError::InsufficientStock`] if a removal would take stock
    /// below zero, [`ClinopsError::Validation`] if an addition would
    /// overflow the counter; the stock is left unchanged either way.
    pub async fn adjust_stock(&self, id: DrugId, quantity: u32, addition: bool) -> Result<Drug> {
        let _row = self.drug_locks.lock(id).await;

        let mut drugs = self.write();
        let drug = drugs.get_mut(&id).ok_or(ClinopsError::DrugNotFound(id))?;
        if addition {
            drug.add_stock(quantity)?;
        } else {
            drug.remove_stock(quantity)?;
        }
        tracing::info!(
            drug_id = %id,
            stock = drug.stock_quantity,
            low_stock = drug.is_low_stock(),
            "stock adjusted"
        );
        Ok(drug.clone())
    }

    /// Soft-deletes a drug.
    pub fn deactivate(&self, id: DrugId) -> Result<()> {
        let mut drugs = self.write();
        let drug = drugs.get_mut(&id).ok_or(ClinopsError::DrugNotFound(id))?;
        drug.deactivate();
        tracing::info!(drug_id = %id, "drug deactivated");
        Ok(())
    }

    /// Whether a drug id exists (active or not).
    pub fn exists(&self, id: DrugId) -> bool {
        self.read().contains_key(&id)
    }

    /// Acquires the row locks for a set of drugs in ascending id order.
    ///
    /// Held by the fulfillment engine across both phases of a dispense.
    pub(crate) async fn lock_rows(
        &self,
        ids: impl IntoIterator<Item = DrugId>,
    ) -> Vec<OwnedMutexGuard<()>> {
        self.drug_locks.lock_all(ids).await
    }

    /// Two-phase stock withdrawal: validates every requested quantity
    /// against current stock before decrementing anything. On any shortfall
    /// the whole withdrawal is rejected and no stock moves.
    ///
    /// The caller must hold the row locks for every id in `wants`.
    pub(crate) fn withdraw_all(&self, wants: &[(DrugId, u32)]) -> Result<()> {
        let mut drugs = self.write();

        // Phase 1: validate the entire list.
        for &(id, quantity) in wants {
            let drug = drugs.get(&id).ok_or(ClinopsError::DrugNotFound(id))?;
            if drug.stock_quantity < quantity {
                return Err(ClinopsError::InsufficientStock {
                    drug: drug.name.clone(),
                    available: drug.stock_quantity,
                    requested: quantity,
                });
            }
        }

        // Phase 2: apply. Validation above guarantees these succeed.
        for &(id, quantity) in wants {
            if let Some(drug) = drugs.get_mut(&id) {
                drug.remove_stock(quantity)?;
            }
        }
        Ok(())
    }

    fn collect(&self, keep: impl Fn(&Drug) -> bool) -> Vec<Drug> {
        let mut out: Vec<Drug> = self.read().values().filter(|d| keep(d)).cloned().collect();
        out.sort_by_key(|d| d.id);
        out
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<DrugId, Drug>> {
        self.drugs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<DrugId, Drug>> {
        self.drugs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}
