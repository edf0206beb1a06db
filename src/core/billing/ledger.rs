//! The billing ledger.
//!
//! Owns invoices and their append-only payment records. Payment application
//! is the reconciliation rule: it is the only path that grows `paid_amount`
//! and the only path that settles an invoice. Per-invoice locks make the
//! read-increment-reconcile sequence atomic under concurrent requests.

use crate::adapters::directory::{DirectoryLookup, NameResolver};
use crate::core::locks::KeyedLocks;
use crate::domain::errors::ClinopsError;
use crate::domain::ids::{
    AppointmentId, IdSequence, InvoiceId, PatientId, PaymentId, ReferenceGenerator,
};
use crate::domain::invoice::{Invoice, InvoiceItem, InvoiceStatus, Payment, PaymentMethod};
use crate::domain::result::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One line of a create-invoice request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemRequest {
    pub description: String,
    pub item_type: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Caller input for creating an invoice.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub patient_id: PatientId,
    pub appointment_id: Option<AppointmentId>,
    #[serde(default)]
    pub items: Vec<InvoiceItemRequest>,
    pub notes: Option<String>,
}

/// Caller input for applying a payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub method: String,
}

/// An invoice enriched with the patient's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub patient_name: String,
}

/// Aggregated billing position of one patient.
///
/// Billed excludes cancelled invoices; paid counts every invoice. Missing
/// aggregates are zero, never null.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBillingSummary {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
}

/// The billing ledger service.
pub struct BillingService {
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
    payments: RwLock<Vec<Payment>>,
    invoice_ids: IdSequence,
    payment_ids: IdSequence,
    invoice_refs: ReferenceGenerator,
    txn_refs: ReferenceGenerator,
    invoice_locks: KeyedLocks<InvoiceId>,
    names: NameResolver,
}

impl BillingService {
    /// Creates an empty ledger backed by the given directory port.
    pub fn new(directory: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            invoices: RwLock::new(HashMap::new()),
            payments: RwLock::new(Vec::new()),
            invoice_ids: IdSequence::new(),
            payment_ids: IdSequence::new(),
            invoice_refs: ReferenceGenerator::new("INV"),
            txn_refs: ReferenceGenerator::new("TXN"),
            invoice_locks: KeyedLocks::new(),
            names: NameResolver::new(directory),
        }
    }

    /// Creates a pending invoice from line items.
    ///
    /// Line totals, subtotal and total are computed once here and never
    /// recomputed; tax and discount are carried at zero.
    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<InvoiceView> {
        let items: Vec<InvoiceItem> = request
            .items
            .into_iter()
            .map(|i| InvoiceItem::new(i.description, i.item_type, i.quantity, i.unit_price))
            .collect();

        let invoice = Invoice::new(
            InvoiceId::new(self.invoice_ids.next()),
            self.invoice_refs.next(),
            request.patient_id,
            request.appointment_id,
            items,
            request.notes,
        );
        self.write_invoices().insert(invoice.id, invoice.clone());

        tracing::info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total_amount,
            "invoice created"
        );
        Ok(self.enrich(invoice).await)
    }

    /// Applies a payment to an invoice.
    ///
    /// Appends an immutable completed payment record, grows `paid_amount`
    /// and reconciles the status (`Partial`, or `Paid` with `paid_at` once
    /// the total is covered). Runs under the invoice's lock so two
    /// concurrent payments cannot both read the same `paid_amount`.
    ///
    /// # Errors
    ///
    /// - [`ClinopsError::AlreadyPaid`] if the invoice is settled.
    /// - [`ClinopsError::InvoiceCancelled`] if the invoice is cancelled;
    ///   Paid and Cancelled are both terminal, so no payment reopens either.
    /// - [`ClinopsError::Validation`] on a non-positive amount or unknown
    ///   payment method.
    pub async fn apply_payment(
        &self,
        invoice_id: InvoiceId,
        request: PaymentRequest,
    ) -> Result<InvoiceView> {
        if request.amount <= Decimal::ZERO {
            return Err(ClinopsError::Validation(format!(
                "payment amount must be positive, got {}",
                request.amount
            )));
        }
        let method: PaymentMethod = request
            .method
            .parse()
            .map_err(|e: String| ClinopsError::Validation(e))?;

        let invoice = {
            let _row = self.invoice_locks.lock(invoice_id).await;

            let mut invoices = self.write_invoices();
            let invoice = invoices
                .get_mut(&invoice_id)
                .ok_or_else(|| ClinopsError::not_found("Invoice", invoice_id))?;

            if invoice.is_paid() {
                return Err(ClinopsError::AlreadyPaid(invoice_id));
            }
            if invoice.status == InvoiceStatus::Cancelled {
                return Err(ClinopsError::InvoiceCancelled(invoice_id));
            }

            let payment = Payment::completed(
                PaymentId::new(self.payment_ids.next()),
                self.txn_refs.next(),
                invoice_id,
                request.amount,
                method,
            );
            self.write_payments().push(payment);

            invoice.apply_payment_amount(request.amount);
            invoice.clone()
        };

        tracing::info!(
            invoice_id = %invoice_id,
            amount = %request.amount,
            paid_amount = %invoice.paid_amount,
            status = %invoice.status,
            "payment applied"
        );
        Ok(self.enrich(invoice).await)
    }

    /// Cancels an invoice.
    ///
    /// # Errors
    ///
    /// [`ClinopsError::CannotCancelPaid`] if the invoice is settled.
    pub async fn cancel(&self, invoice_id: InvoiceId) -> Result<()> {
        let _row = self.invoice_locks.lock(invoice_id).await;

        let mut invoices = self.write_invoices();
        let invoice = invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| ClinopsError::not_found("Invoice", invoice_id))?;

        if invoice.is_paid() {
            return Err(ClinopsError::CannotCancelPaid(invoice_id));
        }

        invoice.cancel();
        tracing::info!(invoice_id = %invoice_id, "invoice cancelled");
        Ok(())
    }

    /// Fetches a single invoice, name-enriched.
    pub async fn get(&self, invoice_id: InvoiceId) -> Result<InvoiceView> {
        let invoice = self
            .read_invoices()
            .get(&invoice_id)
            .cloned()
            .ok_or_else(|| ClinopsError::not_found("Invoice", invoice_id))?;
        Ok(self.enrich(invoice).await)
    }

    /// All invoices, ordered by id.
    pub async fn list_all(&self) -> Vec<InvoiceView> {
        self.enrich_all(self.collect(|_| true)).await
    }

    /// Invoices for one patient, ordered by id.
    pub async fn list_by_patient(&self, patient_id: PatientId) -> Vec<InvoiceView> {
        self.enrich_all(self.collect(|i| i.patient_id == patient_id))
            .await
    }

    /// Invoices in a given status, parsed from its wire form.
    pub async fn list_by_status(&self, status: &str) -> Result<Vec<InvoiceView>> {
        let status: InvoiceStatus = status
            .parse()
            .map_err(|e: String| ClinopsError::Validation(e))?;
        Ok(self.enrich_all(self.collect(|i| i.status == status)).await)
    }

    /// Payment records for one invoice, oldest first.
    pub fn payments_for(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>> {
        if !self.read_invoices().contains_key(&invoice_id) {
            return Err(ClinopsError::not_found("Invoice", invoice_id));
        }
        Ok(self
            .payments
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    /// Aggregated billing position for a patient.
    pub async fn patient_summary(&self, patient_id: PatientId) -> PatientBillingSummary {
        let (total_billed, total_paid) = {
            let invoices = self.read_invoices();
            let billed = invoices
                .values()
                .filter(|i| i.patient_id == patient_id && i.status != InvoiceStatus::Cancelled)
                .map(|i| i.total_amount)
                .sum();
            let paid = invoices
                .values()
                .filter(|i| i.patient_id == patient_id)
                .map(|i| i.paid_amount)
                .sum::<Decimal>();
            (billed, paid)
        };

        PatientBillingSummary {
            patient_id,
            patient_name: self.names.display_name(patient_id).await,
            total_billed,
            total_paid,
            outstanding: total_billed - total_paid,
        }
    }

    fn collect(&self, keep: impl Fn(&Invoice) -> bool) -> Vec<Invoice> {
        let mut out: Vec<Invoice> = self
            .read_invoices()
            .values()
            .filter(|i| keep(i))
            .cloned()
            .collect();
        out.sort_by_key(|i| i.id);
        out
    }

    async fn enrich(&self, invoice: Invoice) -> InvoiceView {
        InvoiceView {
            patient_name: self.names.display_name(invoice.patient_id).await,
            invoice,
        }
    }

    async fn enrich_all(&self, invoices: Vec<Invoice>) -> Vec<InvoiceView> {
        let mut views = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            views.push(self.enrich(invoice).await);
        }
        views
    }

    fn read_invoices(&self) -> std::sync::RwLockReadGuard<'_, HashMap<InvoiceId, Invoice>> {
        self.invoices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_invoices(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<InvoiceId, Invoice>> {
        self.invoices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_payments(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Payment>> {
        self.payments
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
