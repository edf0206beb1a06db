//! HTTP surface: shared state, router and handlers.
//!
//! Every handler unwraps the caller's input, delegates to an engine and
//! wraps the outcome in the `{success, message, data}` envelope. No business
//! rule lives here.

pub mod appointments;
pub mod billing;
pub mod envelope;
pub mod pharmacy;

pub use envelope::{ApiError, ApiResponse, ApiResult};

use crate::adapters::directory::DirectoryLookup;
use crate::core::billing::BillingService;
use crate::core::pharmacy::{FulfillmentService, Inventory};
use crate::core::scheduling::SchedulingService;
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;

/// Shared application state: one instance of each engine.
///
/// Cheaply cloneable; handlers get a clone per request.
#[derive(Clone)]
pub struct AppState {
    pub scheduling: Arc<SchedulingService>,
    pub billing: Arc<BillingService>,
    pub inventory: Arc<Inventory>,
    pub fulfillment: Arc<FulfillmentService>,
}

impl AppState {
    /// Wires the engines to a directory port.
    pub fn new(directory: Arc<dyn DirectoryLookup>) -> Self {
        let inventory = Arc::new(Inventory::new());
        Self {
            scheduling: Arc::new(SchedulingService::new(directory.clone())),
            billing: Arc::new(BillingService::new(directory.clone())),
            fulfillment: Arc::new(FulfillmentService::new(inventory.clone(), directory)),
            inventory,
        }
    }
}

/// Builds the full route table.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // scheduling
        .route(
            "/appointments",
            get(appointments::list_all).post(appointments::book),
        )
        .route(
            "/appointments/:id",
            get(appointments::get).delete(appointments::cancel),
        )
        .route("/appointments/:id/status", patch(appointments::set_status))
        .route(
            "/appointments/patient/:id",
            get(appointments::list_by_patient),
        )
        .route(
            "/appointments/doctor/:id",
            get(appointments::list_by_doctor),
        )
        .route("/appointments/date/:date", get(appointments::list_by_date))
        // billing
        .route("/invoices", get(billing::list_all).post(billing::create))
        .route("/invoices/:id", get(billing::get).delete(billing::cancel))
        .route("/invoices/:id/pay", post(billing::pay))
        .route("/invoices/:id/payments", get(billing::payments))
        .route("/invoices/patient/:id", get(billing::list_by_patient))
        .route("/invoices/status/:status", get(billing::list_by_status))
        .route("/billing/summary/:id", get(billing::patient_summary))
        // pharmacy
        .route(
            "/prescriptions",
            get(pharmacy::list_prescriptions).post(pharmacy::create_prescription),
        )
        .route("/prescriptions/pending", get(pharmacy::pending_prescriptions))
        .route(
            "/prescriptions/:id",
            get(pharmacy::get_prescription).delete(pharmacy::cancel_prescription),
        )
        .route("/prescriptions/:id/dispense", post(pharmacy::dispense))
        .route(
            "/prescriptions/patient/:id",
            get(pharmacy::prescriptions_by_patient),
        )
        .route(
            "/drugs",
            get(pharmacy::list_drugs).post(pharmacy::create_drug),
        )
        .route("/drugs/search", get(pharmacy::search_drugs))
        .route("/drugs/low-stock", get(pharmacy::low_stock))
        .route("/drugs/expiring", get(pharmacy::expiring))
        .route(
            "/drugs/:id",
            get(pharmacy::get_drug)
                .put(pharmacy::update_drug)
                .delete(pharmacy::deactivate_drug),
        )
        .route("/drugs/:id/stock", patch(pharmacy::adjust_stock))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
