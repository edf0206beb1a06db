//! Appointment endpoints.

use super::envelope::{ApiError, ApiResponse, ApiResult};
use super::AppState;
use crate::core::scheduling::BookingRequest;
use crate::domain::errors::ClinopsError;
use crate::domain::ids::{AppointmentId, DoctorId, PatientId};
use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

pub async fn book(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> ApiResult {
    let view = state.scheduling.book(request).await?;
    Ok(ApiResponse::created("Appointment booked", view))
}

pub async fn list_all(State(state): State<AppState>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Appointments fetched",
        state.scheduling.list_all().await,
    ))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let view = state.scheduling.get(AppointmentId::new(id)).await?;
    Ok(ApiResponse::ok("Appointment fetched", view))
}

pub async fn list_by_patient(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Appointments fetched",
        state.scheduling.list_by_patient(PatientId::new(id)).await,
    ))
}

pub async fn list_by_doctor(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    Ok(ApiResponse::ok(
        "Appointments fetched",
        state.scheduling.list_by_doctor(DoctorId::new(id)).await,
    ))
}

pub async fn list_by_date(State(state): State<AppState>, Path(date): Path<String>) -> ApiResult {
    let date: NaiveDate = date
        .parse()
        .map_err(|_| ApiError(ClinopsError::Validation(format!("invalid date: {date:?}"))))?;
    Ok(ApiResponse::ok(
        "Appointments fetched",
        state.scheduling.list_by_date(date).await,
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult {
    let view = state
        .scheduling
        .set_status(AppointmentId::new(id), &update.status)
        .await?;
    Ok(ApiResponse::ok("Appointment status updated", view))
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    state.scheduling.cancel(AppointmentId::new(id)).await?;
    Ok(ApiResponse::message("Appointment cancelled"))
}
