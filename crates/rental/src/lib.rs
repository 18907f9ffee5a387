//! Rental domain module.
//!
//! Business rules for rental agreements: the `Rent` aggregate, the return
//! reconciliation rule that derives its status from invoiced returns, and the
//! quantity helpers used when drafting a settling invoice. Deterministic
//! domain logic only (no IO, no storage).

pub mod quantities;
pub mod reconcile;
pub mod rent;

pub use quantities::{
    DailyQuantity, QuantityCheck, QuantityViolation, RemainingItem, daily_quantity,
    remaining_quantities, validate_quantities,
};
pub use reconcile::{Reconciliation, ReturnLine, decide_status, reconcile};
pub use rent::{
    InvoiceStatusSynced, LinkStockEntry, RecordReturn, Rent, RentCommand, RentEvent, RentStatus,
    ResetStatus, ReturnRecorded, SalesInvoiceUnlinked, StatusReset, StockEntryLinked,
    StockEntryUnlinked, SyncInvoiceStatus, TimeLog, UnlinkSalesInvoice, UnlinkStockEntry,
};
