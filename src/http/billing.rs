//! Invoice and payment endpoints.

use super::envelope::{ApiResponse, ApiResult};
use super::AppState;
use crate::core::billing::{CreateInvoiceRequest, PaymentRequest};
use crate::domain::ids::{InvoiceId, PatientId};
use axum::extract::{Path, State};
use axum::Json;

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> ApiResult {
    let view = state.billing.create_invoice(request).await?;
    Ok(ApiResponse::created("Invoice created", view))
}

pub async fn list_all(State(state): State<AppState>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Invoices fetched",
        state.billing.list_all().await,
    ))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let view = state.billing.get(InvoiceId::new(id)).await?;
    Ok(ApiResponse::ok("Invoice fetched", view))
}

pub async fn list_by_patient(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Invoices fetched",
        state.billing.list_by_patient(PatientId::new(id)).await,
    ))
}

pub async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> ApiResult {
    let views = state.billing.list_by_status(&status).await?;
    Ok(ApiResponse::ok("Invoices fetched", views))
}

pub async fn pay(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult {
    let view = state.billing.apply_payment(InvoiceId::new(id), request).await?;
    Ok(ApiResponse::ok("Payment applied", view))
}

pub async fn payments(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let records = state.billing.payments_for(InvoiceId::new(id))?;
    Ok(ApiResponse::ok("Payments fetched", records))
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    state.billing.cancel(InvoiceId::new(id)).await?;
    Ok(ApiResponse::message("Invoice cancelled"))
}

pub async fn patient_summary(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let summary = state.billing.patient_summary(PatientId::new(id)).await;
    Ok(ApiResponse::ok("Billing summary fetched", summary))
}
