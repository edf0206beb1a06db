//! End-to-end pharmacy tests: inventory plus two-phase dispensing.

use async_trait::async_trait;
use clinops::adapters::directory::{DirectoryLookup, Person};
use clinops::core::pharmacy::{
    CreatePrescriptionRequest, FulfillmentService, Inventory, PrescriptionItemRequest,
};
use clinops::domain::drug::DrugSpec;
use clinops::domain::errors::ClinopsError;
use clinops::domain::ids::{DoctorId, DrugId, PatientId};
use clinops::domain::prescription::PrescriptionStatus;
use clinops::domain::result::Result;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct AllPatients;

#[async_trait]
impl DirectoryLookup for AllPatients {
    async fn fetch_person(&self, id: PatientId) -> Result<Person> {
        Ok(Person {
            id,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
        })
    }
}

fn setup() -> (Arc<Inventory>, FulfillmentService) {
    let inventory = Arc::new(Inventory::new());
    let svc = FulfillmentService::new(inventory.clone(), Arc::new(AllPatients));
    (inventory, svc)
}

fn drug_spec(name: &str, stock: u32) -> DrugSpec {
    DrugSpec {
        name: name.into(),
        generic_name: None,
        manufacturer: Some("Acme Pharma".into()),
        category: Some("antibiotic".into()),
        description: None,
        unit_price: dec!(3.50),
        stock_quantity: stock,
        reorder_level: 5,
        expiry_date: None,
        batch_number: Some("B-100".into()),
        requires_prescription: true,
    }
}

fn item(drug_id: DrugId, quantity: u32) -> PrescriptionItemRequest {
    PrescriptionItemRequest {
        drug_id,
        quantity,
        dosage: Some("500mg".into()),
        frequency: Some("twice daily".into()),
        duration_days: Some(7),
        instructions: None,
    }
}

fn rx_request(items: Vec<PrescriptionItemRequest>) -> CreatePrescriptionRequest {
    CreatePrescriptionRequest {
        patient_id: PatientId::new(1),
        doctor_id: DoctorId::new(2),
        items,
        notes: None,
    }
}

#[tokio::test]
async fn test_prescribe_and_dispense_round_trip() {
    let (inventory, svc) = setup();
    let amox = inventory.create_drug(drug_spec("Amoxicillin", 40));
    let ibup = inventory.create_drug(drug_spec("Ibuprofen", 25));

    let rx = svc
        .create_prescription(rx_request(vec![item(amox.id, 14), item(ibup.id, 10)]))
        .await
        .unwrap();
    assert_eq!(rx.prescription.status, PrescriptionStatus::Pending);
    assert!(rx.prescription.prescription_number.starts_with("RX-"));
    assert_eq!(rx.patient_name, "Jane Doe");

    let dispensed = svc.dispense(rx.prescription.id).await.unwrap();
    assert_eq!(dispensed.prescription.status, PrescriptionStatus::Dispensed);
    assert_eq!(inventory.get(amox.id).unwrap().stock_quantity, 26);
    assert_eq!(inventory.get(ibup.id).unwrap().stock_quantity, 15);
}

#[tokio::test]
async fn test_shortfall_on_last_item_rolls_back_nothing_applied() {
    let (inventory, svc) = setup();
    let amox = inventory.create_drug(drug_spec("Amoxicillin", 40));
    let insulin = inventory.create_drug(drug_spec("Insulin", 2));

    let rx = svc
        .create_prescription(rx_request(vec![item(amox.id, 14), item(insulin.id, 5)]))
        .await
        .unwrap();
    let err = svc.dispense(rx.prescription.id).await.unwrap_err();

    match err {
        ClinopsError::InsufficientStock {
            drug,
            available,
            requested,
        } => {
            assert_eq!(drug, "Insulin");
            assert_eq!(available, 2);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(inventory.get(amox.id).unwrap().stock_quantity, 40);
    assert_eq!(inventory.get(insulin.id).unwrap().stock_quantity, 2);
    let after = svc.get(rx.prescription.id).await.unwrap();
    assert_eq!(after.prescription.status, PrescriptionStatus::Pending);
}

#[tokio::test]
async fn test_dispense_to_exactly_zero_is_allowed() {
    let (inventory, svc) = setup();
    let drug = inventory.create_drug(drug_spec("Insulin", 5));
    let rx = svc
        .create_prescription(rx_request(vec![item(drug.id, 5)]))
        .await
        .unwrap();

    svc.dispense(rx.prescription.id).await.unwrap();
    let after = inventory.get(drug.id).unwrap();
    assert_eq!(after.stock_quantity, 0);
    // Zero stock trips the low-stock report.
    assert!(after.is_low_stock());
    assert_eq!(inventory.low_stock().len(), 1);
}

#[tokio::test]
async fn test_stock_adjustments_and_reorder_flag() {
    let (inventory, _svc) = setup();
    let drug = inventory.create_drug(drug_spec("Aspirin", 10));

    let after = inventory.adjust_stock(drug.id, 4, false).await.unwrap();
    assert_eq!(after.stock_quantity, 6);
    assert!(!after.is_low_stock());

    let after = inventory.adjust_stock(drug.id, 2, false).await.unwrap();
    assert_eq!(after.stock_quantity, 4);
    assert!(after.is_low_stock());

    let err = inventory.adjust_stock(drug.id, 10, false).await.unwrap_err();
    assert!(matches!(err, ClinopsError::InsufficientStock { .. }));
    assert_eq!(inventory.get(drug.id).unwrap().stock_quantity, 4);

    let after = inventory.adjust_stock(drug.id, 20, true).await.unwrap();
    assert_eq!(after.stock_quantity, 24);
}

#[tokio::test]
async fn test_update_preserves_stock_and_sku() {
    let (inventory, _svc) = setup();
    let drug = inventory.create_drug(drug_spec("Aspirin", 10));
    let original_sku = drug.sku.clone();

    let mut spec = drug_spec("Aspirin Forte", 999);
    spec.unit_price = dec!(4.00);
    let updated = inventory.update_drug(drug.id, spec).unwrap();

    assert_eq!(updated.name, "Aspirin Forte");
    assert_eq!(updated.unit_price, dec!(4.00));
    // Stock and SKU are not writable through updates.
    assert_eq!(updated.stock_quantity, 10);
    assert_eq!(updated.sku, original_sku);
}

#[tokio::test]
async fn test_deactivated_drug_leaves_listings_but_blocks_nothing_existing() {
    let (inventory, svc) = setup();
    let drug = inventory.create_drug(drug_spec("Aspirin", 10));
    let rx = svc
        .create_prescription(rx_request(vec![item(drug.id, 2)]))
        .await
        .unwrap();

    inventory.deactivate(drug.id).unwrap();
    assert!(inventory.list_active().is_empty());
    assert!(inventory.search("aspirin").is_empty());

    // An existing prescription still dispenses against remaining stock.
    svc.dispense(rx.prescription.id).await.unwrap();
    assert_eq!(inventory.get(drug.id).unwrap().stock_quantity, 8);
}

#[tokio::test]
async fn test_prescription_for_unknown_drug_is_rejected_up_front() {
    let (inventory, svc) = setup();
    let drug = inventory.create_drug(drug_spec("Aspirin", 10));

    let err = svc
        .create_prescription(rx_request(vec![
            item(drug.id, 2),
            item(DrugId::new(999), 1),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClinopsError::DrugNotFound(_)));
    assert!(svc.list_all().await.is_empty());
}
