use std::sync::Arc;

use thiserror::Error;

use rentdesk_core::{ExpectedVersion, RentId, SalesInvoiceId, StockEntryId};
use rentdesk_invoicing::SalesInvoice;
use rentdesk_rental::Rent;
use rentdesk_stock::StockEntry;

/// Document store operation error.
///
/// These are **infrastructure errors** (missing records, stale writes,
/// rejected writes) as opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{doctype} {name} not found")]
    NotFound { doctype: &'static str, name: String },

    #[error("{doctype} {name} already exists")]
    Duplicate { doctype: &'static str, name: String },

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("write rejected for {doctype} {name}: {reason}")]
    Rejected {
        doctype: &'static str,
        name: String,
        reason: String,
    },

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(doctype: &'static str, name: impl ToString) -> Self {
        Self::NotFound {
            doctype,
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Host document store, as seen by the invoice hooks.
///
/// Mirrors the host ORM operations the hooks rely on: get by name, query by
/// filter, field writes (expressed as whole-document saves of typed
/// documents) and insert/submit/cancel.
///
/// Rent writes take an [`ExpectedVersion`] so that two invoices settling the
/// same rent cannot silently overwrite each other's reconciliation.
pub trait DocumentStore: Send + Sync {
    fn get_rent(&self, name: &RentId) -> Result<Rent, StoreError>;

    /// Replace the stored rent if its stored version matches `expected`.
    fn save_rent(&self, rent: &Rent, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn get_sales_invoice(&self, name: &SalesInvoiceId) -> Result<SalesInvoice, StoreError>;

    fn save_sales_invoice(&self, invoice: &SalesInvoice) -> Result<(), StoreError>;

    /// Submitted invoices linked to `rent`, optionally excluding one invoice.
    fn submitted_invoices_for_rent(
        &self,
        rent: &RentId,
        exclude: Option<&SalesInvoiceId>,
    ) -> Result<Vec<SalesInvoice>, StoreError>;

    /// Allocate the next stock entry name from a naming series (e.g. `MAT-STE-`).
    fn next_stock_entry_name(&self, series: &str) -> Result<StockEntryId, StoreError>;

    /// Insert a new stock entry; fails with `Duplicate` if the name is taken.
    fn insert_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError>;

    fn get_stock_entry(&self, name: &StockEntryId) -> Result<StockEntry, StoreError>;

    fn save_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError>;

    /// Names of submitted stock entries whose `sales_invoice` is `invoice`.
    fn submitted_stock_entries_for_invoice(
        &self,
        invoice: &SalesInvoiceId,
    ) -> Result<Vec<StockEntryId>, StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn get_rent(&self, name: &RentId) -> Result<Rent, StoreError> {
        (**self).get_rent(name)
    }

    fn save_rent(&self, rent: &Rent, expected: ExpectedVersion) -> Result<(), StoreError> {
        (**self).save_rent(rent, expected)
    }

    fn get_sales_invoice(&self, name: &SalesInvoiceId) -> Result<SalesInvoice, StoreError> {
        (**self).get_sales_invoice(name)
    }

    fn save_sales_invoice(&self, invoice: &SalesInvoice) -> Result<(), StoreError> {
        (**self).save_sales_invoice(invoice)
    }

    fn submitted_invoices_for_rent(
        &self,
        rent: &RentId,
        exclude: Option<&SalesInvoiceId>,
    ) -> Result<Vec<SalesInvoice>, StoreError> {
        (**self).submitted_invoices_for_rent(rent, exclude)
    }

    fn next_stock_entry_name(&self, series: &str) -> Result<StockEntryId, StoreError> {
        (**self).next_stock_entry_name(series)
    }

    fn insert_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError> {
        (**self).insert_stock_entry(entry)
    }

    fn get_stock_entry(&self, name: &StockEntryId) -> Result<StockEntry, StoreError> {
        (**self).get_stock_entry(name)
    }

    fn save_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError> {
        (**self).save_stock_entry(entry)
    }

    fn submitted_stock_entries_for_invoice(
        &self,
        invoice: &SalesInvoiceId,
    ) -> Result<Vec<StockEntryId>, StoreError> {
        (**self).submitted_stock_entries_for_invoice(invoice)
    }
}
