//! Invoicing domain module.
//!
//! The Sales Invoice document as seen by the rental hooks: its link to a
//! rent, its docstatus lifecycle and the returned quantity carried on each
//! line.

pub mod invoice;

pub use invoice::{InvoiceStatus, SalesInvoice, SalesInvoiceItem};
