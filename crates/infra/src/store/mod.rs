//! Document persistence owned by the host.
//!
//! The hooks only ever talk to the host through [`DocumentStore`];
//! [`InMemoryDocumentStore`] stands in for it in tests and local runs.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{DocumentStore, StoreError};
