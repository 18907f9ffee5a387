//! Outcome reporting for hook runs: user-facing messages and the per-step
//! compensation report produced by invoice cancellation.

use serde::Serialize;

use rentdesk_core::{RentId, SalesInvoiceId, StockEntryId};

use super::HookError;

/// Colour hint for a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Green,
    Blue,
    Yellow,
    Orange,
    Red,
}

/// A message for the host to show the user (alert/toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub indicator: Indicator,
    pub text: String,
}

impl UserMessage {
    pub fn new(indicator: Indicator, text: impl Into<String>) -> Self {
        Self {
            indicator,
            text: text.into(),
        }
    }
}

/// Compensation steps run when a settling invoice is cancelled, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelStep {
    UnlinkSalesInvoice,
    FindStockEntries,
    ClearRentStockEntry,
    UnlinkStockEntry,
    CancelStockEntry,
    ResetRentStatus,
    CancelSalesInvoice,
}

impl CancelStep {
    pub fn label(self) -> &'static str {
        match self {
            CancelStep::UnlinkSalesInvoice => "unlink sales invoice from rent",
            CancelStep::FindStockEntries => "find stock entries",
            CancelStep::ClearRentStockEntry => "clear stock entry from rent",
            CancelStep::UnlinkStockEntry => "unlink rent from stock entry",
            CancelStep::CancelStockEntry => "cancel stock entry",
            CancelStep::ResetRentStatus => "reset rent status",
            CancelStep::CancelSalesInvoice => "cancel sales invoice",
        }
    }
}

/// Result of one compensation step. `target` names the document the step
/// acted on when it acts on one of several (e.g. each stock entry).
#[derive(Debug)]
pub struct StepOutcome {
    pub step: CancelStep,
    pub target: Option<String>,
    pub result: Result<(), HookError>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregated outcome of invoice cancellation.
///
/// Steps never abort each other; a failure is recorded here (and logged)
/// and the remaining steps still run.
#[derive(Debug)]
pub struct CancelReport {
    pub invoice: SalesInvoiceId,
    pub rent: Option<RentId>,
    pub stock_entries: Vec<StockEntryId>,
    pub steps: Vec<StepOutcome>,
    pub messages: Vec<UserMessage>,
}

impl CancelReport {
    pub fn new(invoice: SalesInvoiceId, rent: Option<RentId>) -> Self {
        Self {
            invoice,
            rent,
            stock_entries: Vec::new(),
            steps: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn record(&mut self, step: CancelStep, target: Option<String>, result: Result<(), HookError>) {
        self.steps.push(StepOutcome {
            step,
            target,
            result,
        });
    }

    pub fn message(&mut self, indicator: Indicator, text: impl Into<String>) {
        self.messages.push(UserMessage::new(indicator, text));
    }

    /// True when every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(StepOutcome::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.is_ok())
    }

    pub fn step(&self, step: CancelStep) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(move |s| s.step == step)
    }

    /// Stock entries whose cancellation succeeded.
    pub fn cancelled_stock_entries(&self) -> Vec<&str> {
        self.step(CancelStep::CancelStockEntry)
            .filter(|s| s.is_ok())
            .filter_map(|s| s.target.as_deref())
            .collect()
    }
}
