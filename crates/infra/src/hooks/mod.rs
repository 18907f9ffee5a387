//! Sales Invoice lifecycle hooks.
//!
//! - `on_submit`: reconcile the linked rent and create the stock mirror
//! - `on_change`: mirror the invoice status text onto the rent
//! - `on_cancel`: best-effort compensation, one reported result per step

pub mod report;
pub mod sales_invoice;
pub mod table;

use thiserror::Error;

use rentdesk_core::{DomainError, RentId};

use crate::store::StoreError;

pub use report::{CancelReport, CancelStep, Indicator, StepOutcome, UserMessage};
pub use sales_invoice::{SalesInvoiceHooks, SubmitOutcome};
pub use table::{DocEvent, HookOutcome, HookTable, InvoiceHook};

/// Hook failure.
///
/// `RentNotFound` renders as the message shown to the user.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Rent document {0} does not exist.")]
    RentNotFound(RentId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HookError {
    /// Map a store lookup failure for `rent`, turning "not found" into
    /// [`HookError::RentNotFound`].
    pub fn from_rent_lookup(rent: &RentId, err: StoreError) -> Self {
        if err.is_not_found() {
            HookError::RentNotFound(rent.clone())
        } else {
            HookError::Store(err)
        }
    }
}
