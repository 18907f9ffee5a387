//! Infrastructure layer: document store, per-rent locking, configuration and
//! the Sales Invoice lifecycle hooks that tie everything together.

pub mod config;
pub mod hooks;
pub mod locks;
pub mod store;

mod integration_tests;

pub use config::HookConfig;
pub use hooks::{
    CancelReport, CancelStep, DocEvent, HookError, HookOutcome, HookTable, Indicator, InvoiceHook,
    SalesInvoiceHooks, StepOutcome, SubmitOutcome, UserMessage,
};
pub use locks::RentLocks;
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};
