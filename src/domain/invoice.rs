//! Invoice, invoice line items and payment records.
//!
//! The ledger invariant lives here: `Paid ⇔ paid_amount ≥ total_amount`,
//! `paid_amount` only ever grows, and a paid invoice never leaves `Paid`.
//! [`Invoice::apply_payment_amount`] is the only code path that touches
//! `paid_amount` or flips the reconciliation status.

use crate::domain::ids::{AppointmentId, InvoiceId, PatientId, PaymentId};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days until a freshly created invoice falls due.
pub const DUE_IN_DAYS: i64 = 30;

/// Settlement status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
    /// Carried for wire compatibility; nothing sets it in this version.
    Overdue,
    Cancelled,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PARTIAL" => Ok(Self::Partial),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown invoice status: {other:?}")),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Insurance,
    BankTransfer,
    Check,
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "CREDIT_CARD" => Ok(Self::CreditCard),
            "DEBIT_CARD" => Ok(Self::DebitCard),
            "INSURANCE" => Ok(Self::Insurance),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "CHECK" => Ok(Self::Check),
            other => Err(format!("unknown payment method: {other:?}")),
        }
    }
}

/// Processing status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// One line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub item_type: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// `unit_price × quantity`, fixed at creation.
    pub line_total: Decimal,
}

impl InvoiceItem {
    /// Builds a line item, computing its total.
    pub fn new(
        description: impl Into<String>,
        item_type: Option<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        let line_total = unit_price * Decimal::from(quantity);
        Self {
            description: description.into(),
            item_type,
            quantity,
            unit_price,
            line_total,
        }
    }
}

/// An immutable, append-only record of money received against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub transaction_id: String,
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a completed payment against an invoice.
    pub fn completed(
        id: PaymentId,
        transaction_id: String,
        invoice_id: InvoiceId,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            transaction_id,
            invoice_id,
            amount,
            method,
            status: PaymentStatus::Completed,
            paid_at: now,
            created_at: now,
        }
    }
}

/// A patient invoice with its line items and running paid total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub appointment_id: Option<AppointmentId>,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    /// `subtotal + tax − discount`, fixed at creation.
    pub total_amount: Decimal,
    /// Monotonically non-decreasing; only grows through
    /// [`Invoice::apply_payment_amount`].
    pub paid_amount: Decimal,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a pending invoice, totalling the supplied line items.
    ///
    /// Tax and discount are carried but fixed at zero in this version.
    pub fn new(
        id: InvoiceId,
        invoice_number: String,
        patient_id: PatientId,
        appointment_id: Option<AppointmentId>,
        items: Vec<InvoiceItem>,
        notes: Option<String>,
    ) -> Self {
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
        let now = Utc::now();
        Self {
            id,
            invoice_number,
            patient_id,
            appointment_id,
            items,
            subtotal,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: subtotal,
            paid_amount: Decimal::ZERO,
            status: InvoiceStatus::Pending,
            notes,
            due_date: now + Duration::days(DUE_IN_DAYS),
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Accumulates a payment and reconciles status.
    ///
    /// Sole mutation path for `paid_amount`/settlement status. The caller
    /// must have rejected payments against paid or cancelled invoices
    /// before calling this; both states are terminal.
    pub fn apply_payment_amount(&mut self, amount: Decimal) {
        debug_assert!(self.status != InvoiceStatus::Paid);
        debug_assert!(self.status != InvoiceStatus::Cancelled);
        self.paid_amount += amount;
        if self.paid_amount >= self.total_amount {
            self.status = InvoiceStatus::Paid;
            self.paid_at = Some(Utc::now());
        } else {
            self.status = InvoiceStatus::Partial;
        }
        self.updated_at = Utc::now();
    }

    /// Marks the invoice cancelled. The caller must have rejected paid
    /// invoices first.
    pub fn cancel(&mut self) {
        debug_assert!(self.status != InvoiceStatus::Paid);
        self.status = InvoiceStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    /// Whether the invoice is fully settled.
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}
