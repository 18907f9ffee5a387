//! Stock movement module.
//!
//! Stock Entry documents mirroring the goods movement of a settling invoice.

pub mod entry;

pub use entry::{StockEntry, StockEntryDetail, StockEntryType};
