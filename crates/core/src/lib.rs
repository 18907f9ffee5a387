//! `rentdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the rental,
//! invoicing and stock modules (no infrastructure concerns).

pub mod aggregate;
pub mod docstatus;
pub mod document;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use docstatus::DocStatus;
pub use document::Document;
pub use error::{DomainError, DomainResult};
pub use id::{CostCenterId, CustomerId, ItemCode, RentId, SalesInvoiceId, StockEntryId, WarehouseId};
pub use value_object::{Quantity, ValueObject};
