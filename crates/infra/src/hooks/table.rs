//! Doctype hook registration and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use rentdesk_core::Document;
use rentdesk_events::{EventBus, EventEnvelope};
use rentdesk_invoicing::SalesInvoice;

use super::report::CancelReport;
use super::sales_invoice::{SalesInvoiceHooks, SubmitOutcome};
use super::HookError;
use crate::store::DocumentStore;

/// Document lifecycle event a hook can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocEvent {
    OnSubmit,
    OnChange,
    OnCancel,
}

/// What a single hook did.
#[derive(Debug)]
pub enum HookOutcome {
    /// The invoice is not linked to anything the hook handles.
    Skipped,
    Submitted(SubmitOutcome),
    Changed,
    Cancelled(CancelReport),
}

/// A callback invoked for Sales Invoice lifecycle events.
pub trait InvoiceHook: Send + Sync {
    fn handle(&self, event: DocEvent, invoice: &SalesInvoice) -> Result<HookOutcome, HookError>;
}

impl<S, B> InvoiceHook for SalesInvoiceHooks<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    fn handle(&self, event: DocEvent, invoice: &SalesInvoice) -> Result<HookOutcome, HookError> {
        match event {
            DocEvent::OnSubmit => Ok(self
                .on_submit(invoice)?
                .map_or(HookOutcome::Skipped, HookOutcome::Submitted)),
            DocEvent::OnChange => {
                if invoice.rent().is_none() {
                    return Ok(HookOutcome::Skipped);
                }
                self.on_change(invoice)?;
                Ok(HookOutcome::Changed)
            }
            DocEvent::OnCancel => Ok(HookOutcome::Cancelled(self.on_cancel(invoice))),
        }
    }
}

/// Hooks registered against the Sales Invoice doctype.
///
/// Hooks run in registration order; the first error stops dispatch and is
/// returned so the host can abort the document transition.
#[derive(Default)]
pub struct HookTable {
    hooks: HashMap<DocEvent, Vec<Arc<dyn InvoiceHook>>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doctype(&self) -> &'static str {
        SalesInvoice::DOCTYPE
    }

    pub fn register(&mut self, event: DocEvent, hook: Arc<dyn InvoiceHook>) -> &mut Self {
        self.hooks.entry(event).or_default().push(hook);
        self
    }

    /// Register one hook for submit, change and cancel.
    pub fn register_all(&mut self, hook: Arc<dyn InvoiceHook>) -> &mut Self {
        for event in [DocEvent::OnSubmit, DocEvent::OnChange, DocEvent::OnCancel] {
            self.register(event, hook.clone());
        }
        self
    }

    pub fn handlers(&self, event: DocEvent) -> usize {
        self.hooks.get(&event).map_or(0, Vec::len)
    }

    pub fn fire(&self, event: DocEvent, invoice: &SalesInvoice) -> Result<Vec<HookOutcome>, HookError> {
        let Some(hooks) = self.hooks.get(&event) else {
            tracing::debug!(?event, invoice = %invoice.name(), "no hooks registered");
            return Ok(Vec::new());
        };

        let mut outcomes = Vec::with_capacity(hooks.len());
        for hook in hooks {
            match hook.handle(event, invoice) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    tracing::error!(?event, invoice = %invoice.name(), error = %err, "hook failed");
                    return Err(err);
                }
            }
        }
        Ok(outcomes)
    }
}

impl core::fmt::Debug for HookTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut counts: Vec<(DocEvent, usize)> =
            self.hooks.iter().map(|(event, hooks)| (*event, hooks.len())).collect();
        counts.sort_by_key(|(event, _)| *event as u8);
        f.debug_struct("HookTable")
            .field("doctype", &self.doctype())
            .field("hooks", &counts)
            .finish()
    }
}
