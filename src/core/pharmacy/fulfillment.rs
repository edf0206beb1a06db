//! Prescription fulfillment.
//!
//! Dispensing is two-phase: every item is validated against stock before a
//! single unit moves, then the whole withdrawal is applied. A multi-item
//! prescription therefore either fully dispenses or leaves inventory and
//! prescription exactly as they were.

use crate::adapters::directory::{DirectoryLookup, NameResolver};
use crate::core::locks::KeyedLocks;
use crate::core::pharmacy::inventory::Inventory;
use crate::domain::errors::ClinopsError;
use crate::domain::ids::{DoctorId, DrugId, IdSequence, PatientId, PrescriptionId, ReferenceGenerator};
use crate::domain::prescription::{Prescription, PrescriptionItem, PrescriptionStatus};
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// One drug line of a create-prescription request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItemRequest {
    pub drug_id: DrugId,
    pub quantity: u32,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<u32>,
    pub instructions: Option<String>,
}

/// Caller input for writing a prescription.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    #[serde(default)]
    pub items: Vec<PrescriptionItemRequest>,
    pub notes: Option<String>,
}

/// A prescription enriched with the patient's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub patient_name: String,
}

/// The fulfillment engine.
pub struct FulfillmentService {
    prescriptions: RwLock<HashMap<PrescriptionId, Prescription>>,
    ids: IdSequence,
    rx_refs: ReferenceGenerator,
    rx_locks: KeyedLocks<PrescriptionId>,
    inventory: Arc<Inventory>,
    names: NameResolver,
}

impl FulfillmentService {
    /// Creates a fulfillment engine over a shared inventory.
    pub fn new(inventory: Arc<Inventory>, directory: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            prescriptions: RwLock::new(HashMap::new()),
            ids: IdSequence::new(),
            rx_refs: ReferenceGenerator::new("RX"),
            rx_locks: KeyedLocks::new(),
            inventory,
            names: NameResolver::new(directory),
        }
    }

    /// Writes a prescription.
    ///
    /// Every item must reference an existing drug; stock is not touched at
    /// creation.
    ///
    /// # Errors
    ///
    /// [`ClinopsError::DrugNotFound`] on the first unknown drug id.
    pub async fn create_prescription(
        &self,
        request: CreatePrescriptionRequest,
    ) -> Result<PrescriptionView> {
        let mut items = Vec::with_capacity(request.items.len());
        for item in request.items {
            if !self.inventory.exists(item.drug_id) {
                return Err(ClinopsError::DrugNotFound(item.drug_id));
            }
            items.push(PrescriptionItem::new(
                item.drug_id,
                item.quantity,
                item.dosage,
                item.frequency,
                item.duration_days,
                item.instructions,
            ));
        }

        let prescription = Prescription::new(
            PrescriptionId::new(self.ids.next()),
            self.rx_refs.next(),
            request.patient_id,
            request.doctor_id,
            items,
            request.notes,
        );
        self.write().insert(prescription.id, prescription.clone());

        tracing::info!(
            prescription_id = %prescription.id,
            prescription_number = %prescription.prescription_number,
            items = prescription.items.len(),
            "prescription created"
        );
        Ok(self.enrich(prescription).await)
    }

    /// Dispenses a prescription against inventory.
    ///
    /// Acquires the prescription's lock and the row locks of every involved
    /// drug (in ascending id order), validates the full item list against
    /// stock, and only then decrements. On any shortfall nothing changes:
    /// no stock moves and the prescription stays in its current status.
    ///
    /// # Errors
    ///
    /// - [`ClinopsError::AlreadyDispensed`] if already dispensed.
    /// - [`ClinopsError::InsufficientStock`] naming the first drug that
    ///   fell short.
    pub async fn dispense(&self, id: PrescriptionId) -> Result<PrescriptionView> {
        let _rx = self.rx_locks.lock(id).await;

        let wants = {
            let prescriptions = self.read();
            let prescription = prescriptions
                .get(&id)
                .ok_or_else(|| ClinopsError::not_found("Prescription", id))?;
            if prescription.is_dispensed() {
                return Err(ClinopsError::AlreadyDispensed(id));
            }

            // Aggregate per drug so duplicate lines validate against their
            // combined quantity.
            let mut wants: BTreeMap<DrugId, u32> = BTreeMap::new();
            for item in &prescription.items {
                *wants.entry(item.drug_id).or_insert(0) += item.quantity;
            }
            wants.into_iter().collect::<Vec<_>>()
        };

        // Hold every involved drug row across validate and apply.
        let _rows = self
            .inventory
            .lock_rows(wants.iter().map(|&(drug_id, _)| drug_id))
            .await;

        self.inventory.withdraw_all(&wants).inspect_err(|err| {
            tracing::info!(prescription_id = %id, error = %err, "dispense rejected");
        })?;

        let prescription = {
            let mut prescriptions = self.write();
            let prescription = prescriptions
                .get_mut(&id)
                .ok_or_else(|| ClinopsError::not_found("Prescription", id))?;
            prescription.mark_dispensed();
            prescription.clone()
        };

        tracing::info!(prescription_id = %id, "prescription dispensed");
        Ok(self.enrich(prescription).await)
    }

    /// Cancels a prescription.
    ///
    /// # Errors
    ///
    /// [`ClinopsError::AlreadyDispensed`] if it was already dispensed.
    pub async fn cancel(&self, id: PrescriptionId) -> Result<()> {
        let _rx = self.rx_locks.lock(id).await;

        let mut prescriptions = self.write();
        let prescription = prescriptions
            .get_mut(&id)
            .ok_or_else(|| ClinopsError::not_found("Prescription", id))?;
        if prescription.is_dispensed() {
            return Err(ClinopsError::AlreadyDispensed(id));
        }
        prescription.cancel();
        tracing::info!(prescription_id = %id, "prescription cancelled");
        Ok(())
    }

    /// Fetches a single prescription, name-enriched.
    pub async fn get(&self, id: PrescriptionId) -> Result<PrescriptionView> {
        let prescription = self
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ClinopsError::not_found("Prescription", id))?;
        Ok(self.enrich(prescription).await)
    }

    /// All prescriptions, ordered by id.
    pub async fn list_all(&self) -> Vec<PrescriptionView> {
        self.enrich_all(self.collect(|_| true)).await
    }

    /// Prescriptions for one patient, ordered by id.
    pub async fn list_by_patient(&self, patient_id: PatientId) -> Vec<PrescriptionView> {
        self.enrich_all(self.collect(|p| p.patient_id == patient_id))
            .await
    }

    /// Prescriptions still awaiting dispense.
    pub async fn list_pending(&self) -> Vec<PrescriptionView> {
        self.enrich_all(self.collect(|p| p.status == PrescriptionStatus::Pending))
            .await
    }

    fn collect(&self, keep: impl Fn(&Prescription) -> bool) -> Vec<Prescription> {
        let mut out: Vec<Prescription> =
            self.read().values().filter(|p| keep(p)).cloned().collect();
        out.sort_by_key(|p| p.id);
        out
    }

    async fn enrich(&self, prescription: Prescription) -> PrescriptionView {
        PrescriptionView {
            patient_name: self.names.display_name(prescription.patient_id).await,
            prescription,
        }
    }

    async fn enrich_all(&self, prescriptions: Vec<Prescription>) -> Vec<PrescriptionView> {
        let mut views = Vec::with_capacity(prescriptions.len());
        for prescription in prescriptions {
            views.push(self.enrich(prescription).await);
        }
        views
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PrescriptionId, Prescription>> {
        self.prescriptions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PrescriptionId, Prescription>> {
        self.prescriptions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::directory::Person;
    use crate::domain::drug::DrugSpec;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct NoDirectory;

    #[async_trait]
    impl DirectoryLookup for NoDirectory {
        async fn fetch_person(&self, _id: PatientId) -> Result<Person> {
            Err(ClinopsError::Directory("offline".into()))
        }
    }

    fn setup() -> (Arc<Inventory>, FulfillmentService) {
        let inventory = Arc::new(Inventory::new());
        let svc = FulfillmentService::new(inventory.clone(), Arc::new(NoDirectory));
        (inventory, svc)
    }

    fn drug(inventory: &Inventory, name: &str, stock: u32) -> DrugId {
        inventory
            .create_drug(DrugSpec {
                name: name.into(),
                generic_name: None,
                manufacturer: None,
                category: None,
                description: None,
                unit_price: dec!(2.00),
                stock_quantity: stock,
                reorder_level: 5,
                expiry_date: None,
                batch_number: None,
                requires_prescription: true,
            })
            .id
    }

    fn item(drug_id: DrugId, quantity: u32) -> PrescriptionItemRequest {
        PrescriptionItemRequest {
            drug_id,
            quantity,
            dosage: None,
            frequency: None,
            duration_days: None,
            instructions: None,
        }
    }

    fn request(items: Vec<PrescriptionItemRequest>) -> CreatePrescriptionRequest {
        CreatePrescriptionRequest {
            patient_id: PatientId::new(1),
            doctor_id: DoctorId::new(2),
            items,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_drug() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 10);
        let err = svc
            .create_prescription(request(vec![item(d1, 2), item(DrugId::new(404), 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinopsError::DrugNotFound(_)));
        assert!(svc.list_all().await.is_empty());
        // Creation never touches stock.
        assert_eq!(inventory.get(d1).unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_dispense_decrements_all_items() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 50);
        let d2 = drug(&inventory, "Insulin", 20);

        let rx = svc
            .create_prescription(request(vec![item(d1, 5), item(d2, 2)]))
            .await
            .unwrap();
        let view = svc.dispense(rx.prescription.id).await.unwrap();

        assert_eq!(view.prescription.status, PrescriptionStatus::Dispensed);
        assert!(view.prescription.dispensed_at.is_some());
        assert!(view
            .prescription
            .items
            .iter()
            .all(|i| i.dispensed && i.dispensed_quantity == i.quantity));
        assert_eq!(inventory.get(d1).unwrap().stock_quantity, 45);
        assert_eq!(inventory.get(d2).unwrap().stock_quantity, 18);
    }

    #[tokio::test]
    async fn test_dispense_shortfall_leaves_everything_untouched() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 50);
        let d2 = drug(&inventory, "Insulin", 3);

        let rx = svc
            .create_prescription(request(vec![item(d1, 5), item(d2, 100)]))
            .await
            .unwrap();
        let err = svc.dispense(rx.prescription.id).await.unwrap_err();

        assert!(matches!(err, ClinopsError::InsufficientStock { .. }));
        // The first item passed validation but was not decremented.
        assert_eq!(inventory.get(d1).unwrap().stock_quantity, 50);
        assert_eq!(inventory.get(d2).unwrap().stock_quantity, 3);

        let after = svc.get(rx.prescription.id).await.unwrap();
        assert_eq!(after.prescription.status, PrescriptionStatus::Pending);
        assert!(after.prescription.items.iter().all(|i| !i.dispensed));
    }

    #[tokio::test]
    async fn test_duplicate_lines_validate_combined_quantity() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 9);

        // Two lines of 5 against a stock of 9 must fail as a whole.
        let rx = svc
            .create_prescription(request(vec![item(d1, 5), item(d1, 5)]))
            .await
            .unwrap();
        let err = svc.dispense(rx.prescription.id).await.unwrap_err();
        assert!(matches!(
            err,
            ClinopsError::InsufficientStock {
                available: 9,
                requested: 10,
                ..
            }
        ));
        assert_eq!(inventory.get(d1).unwrap().stock_quantity, 9);
    }

    #[tokio::test]
    async fn test_double_dispense_is_rejected() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 10);
        let rx = svc
            .create_prescription(request(vec![item(d1, 5)]))
            .await
            .unwrap();

        svc.dispense(rx.prescription.id).await.unwrap();
        let err = svc.dispense(rx.prescription.id).await.unwrap_err();
        assert!(matches!(err, ClinopsError::AlreadyDispensed(_)));
        // Stock only moved once.
        assert_eq!(inventory.get(d1).unwrap().stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 10);

        let pending = svc
            .create_prescription(request(vec![item(d1, 5)]))
            .await
            .unwrap();
        svc.cancel(pending.prescription.id).await.unwrap();
        let got = svc.get(pending.prescription.id).await.unwrap();
        assert_eq!(got.prescription.status, PrescriptionStatus::Cancelled);

        let dispensed = svc
            .create_prescription(request(vec![item(d1, 5)]))
            .await
            .unwrap();
        svc.dispense(dispensed.prescription.id).await.unwrap();
        let err = svc.cancel(dispensed.prescription.id).await.unwrap_err();
        assert!(matches!(err, ClinopsError::AlreadyDispensed(_)));
    }

    #[tokio::test]
    async fn test_pending_listing_tracks_lifecycle() {
        let (inventory, svc) = setup();
        let d1 = drug(&inventory, "Amoxicillin", 10);
        let a = svc
            .create_prescription(request(vec![item(d1, 1)]))
            .await
            .unwrap();
        svc.create_prescription(request(vec![item(d1, 1)]))
            .await
            .unwrap();

        assert_eq!(svc.list_pending().await.len(), 2);
        svc.dispense(a.prescription.id).await.unwrap();
        assert_eq!(svc.list_pending().await.len(), 1);
    }
}
