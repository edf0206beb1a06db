//! # Clinops - Clinical Operations Service
//!
//! Clinops is a clinical-operations HTTP service covering three transactional
//! engines for a small clinic:
//!
//! - **Scheduling** - appointment booking with doctor double-booking detection
//! - **Billing** - invoices and a payment ledger that reconciles paid amounts
//! - **Pharmacy** - drug inventory and two-phase prescription dispensing
//!
//! ## Architecture
//!
//! Clinops follows a layered architecture:
//!
//! - [`http`] - Axum routes, handlers and the response envelope
//! - [`core`] - Business logic (scheduling, billing, pharmacy, keyed locks)
//! - [`adapters`] - External integrations (patient directory)
//! - [`domain`] - Core domain types, ids and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clinops::adapters::directory::HttpDirectoryClient;
//! use clinops::config::ClinopsConfig;
//! use clinops::http::{create_router, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClinopsConfig::default();
//!     let directory = HttpDirectoryClient::new(
//!         config.directory.base_url.clone(),
//!         config.directory.timeout(),
//!     )?;
//!     let app = create_router(AppState::new(Arc::new(directory)));
//!
//!     let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::errors::ClinopsError`]; the HTTP
//! layer maps its [`domain::errors::ErrorKind`] onto status codes, so business
//! rejections surface as 400 and unknown ids as 404.
//!
//! ## Logging
//!
//! Clinops uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(doctor_id = 7, "Booking appointment");
//! warn!(patient_id = 3, "Directory lookup failed, using placeholder name");
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod http;
pub mod logging;
