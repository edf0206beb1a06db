//! Prescription and drug endpoints.

use super::envelope::{ApiResponse, ApiResult};
use super::AppState;
use crate::core::pharmacy::CreatePrescriptionRequest;
use crate::domain::drug::DrugSpec;
use crate::domain::ids::{DrugId, PatientId, PrescriptionId};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

// --- prescriptions ---

pub async fn create_prescription(
    State(state): State<AppState>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> ApiResult {
    let view = state.fulfillment.create_prescription(request).await?;
    Ok(ApiResponse::created("Prescription created", view))
}

pub async fn list_prescriptions(State(state): State<AppState>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Prescriptions fetched",
        state.fulfillment.list_all().await,
    ))
}

pub async fn get_prescription(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let view = state.fulfillment.get(PrescriptionId::new(id)).await?;
    Ok(ApiResponse::ok("Prescription fetched", view))
}

pub async fn prescriptions_by_patient(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult {
    Ok(ApiResponse::ok(
        "Prescriptions fetched",
        state.fulfillment.list_by_patient(PatientId::new(id)).await,
    ))
}

pub async fn pending_prescriptions(State(state): State<AppState>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Prescriptions fetched",
        state.fulfillment.list_pending().await,
    ))
}

pub async fn dispense(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let view = state.fulfillment.dispense(PrescriptionId::new(id)).await?;
    Ok(ApiResponse::ok("Prescription dispensed", view))
}

pub async fn cancel_prescription(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    state.fulfillment.cancel(PrescriptionId::new(id)).await?;
    Ok(ApiResponse::message("Prescription cancelled"))
}

// --- drugs ---

pub async fn create_drug(
    State(state): State<AppState>,
    Json(spec): Json<DrugSpec>,
) -> ApiResult {
    let drug = state.inventory.create_drug(spec);
    Ok(ApiResponse::created("Drug created", drug))
}

pub async fn list_drugs(State(state): State<AppState>) -> ApiResult {
    Ok(ApiResponse::ok("Drugs fetched", state.inventory.list_active()))
}

pub async fn get_drug(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let drug = state.inventory.get(DrugId::new(id))?;
    Ok(ApiResponse::ok("Drug fetched", drug))
}

pub async fn update_drug(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(spec): Json<DrugSpec>,
) -> ApiResult {
    let drug = state.inventory.update_drug(DrugId::new(id), spec)?;
    Ok(ApiResponse::ok("Drug updated", drug))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub name: String,
}

pub async fn search_drugs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    Ok(ApiResponse::ok(
        "Drugs fetched",
        state.inventory.search(&params.name),
    ))
}

pub async fn low_stock(State(state): State<AppState>) -> ApiResult {
    Ok(ApiResponse::ok("Drugs fetched", state.inventory.low_stock()))
}

#[derive(Debug, Deserialize)]
pub struct ExpiringParams {
    #[serde(default = "default_expiry_days")]
    pub days: u32,
}

fn default_expiry_days() -> u32 {
    30
}

pub async fn expiring(
    State(state): State<AppState>,
    Query(params): Query<ExpiringParams>,
) -> ApiResult {
    Ok(ApiResponse::ok(
        "Drugs fetched",
        state.inventory.expiring_within(params.days),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub quantity: u32,
    /// True to receive stock, false to remove it.
    pub is_addition: bool,
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(adjustment): Json<StockAdjustment>,
) -> ApiResult {
    let drug = state
        .inventory
        .adjust_stock(DrugId::new(id), adjustment.quantity, adjustment.is_addition)
        .await?;
    Ok(ApiResponse::ok("Stock adjusted", drug))
}

pub async fn deactivate_drug(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    state.inventory.deactivate(DrugId::new(id))?;
    Ok(ApiResponse::message("Drug deactivated"))
}
