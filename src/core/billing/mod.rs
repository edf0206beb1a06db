//! Invoice lifecycle and payment reconciliation.

mod ledger;

pub use ledger::{
    BillingService, CreateInvoiceRequest, InvoiceItemRequest, InvoiceView, PatientBillingSummary,
    PaymentRequest,
};
