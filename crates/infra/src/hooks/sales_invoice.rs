//! Hooks registered against the Sales Invoice doctype.
//!
//! ```text
//! submit ─► lock rent ─► load prior invoices ─► reconcile ─► insert submitted mirror
//!        ─► write rent: return + mirror link (version-checked)
//!        └► rent write failed: cancel the mirror again
//!
//! cancel ─► 0 unlink invoice ─► 1 find mirrors ─► 2 clear rent.stock_entry
//!        ─► 3 unlink mirrors ─► 4 cancel mirrors ─► 5 reset rent status
//! ```
//!
//! Rent writes go through [`SalesInvoiceHooks::update_rent`], which holds the
//! rent's lock for the whole read-decide-write and publishes the resulting
//! events once the write has landed.

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;

use rentdesk_core::aggregate::execute;
use rentdesk_core::{AggregateRoot, DomainError, ExpectedVersion, RentId, SalesInvoiceId, StockEntryId};
use rentdesk_events::{EventBus, EventEnvelope};
use rentdesk_invoicing::{SalesInvoice, SalesInvoiceItem};
use rentdesk_rental::{
    LinkStockEntry, QuantityCheck, RecordReturn, Reconciliation, RemainingItem, Rent, RentCommand,
    RentEvent, RentStatus, ResetStatus, ReturnLine, SyncInvoiceStatus, UnlinkSalesInvoice,
    UnlinkStockEntry, daily_quantity, reconcile, remaining_quantities, validate_quantities,
};
use rentdesk_stock::StockEntry;

use super::report::{CancelReport, CancelStep, Indicator, StepOutcome};
use super::HookError;
use crate::config::HookConfig;
use crate::locks::RentLocks;
use crate::store::DocumentStore;

/// What a submitted settling invoice did to its rent.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub rent: RentId,
    pub previous_status: RentStatus,
    pub status: RentStatus,
    pub reconciliation: Reconciliation,
    pub stock_entry: Option<StockEntryId>,
}

/// Sales Invoice lifecycle hooks over a host document store and an event bus.
#[derive(Debug)]
pub struct SalesInvoiceHooks<S, B> {
    store: S,
    bus: B,
    locks: RentLocks,
    config: HookConfig,
}

impl<S, B> SalesInvoiceHooks<S, B> {
    pub fn new(store: S, bus: B, config: HookConfig) -> Self {
        Self {
            store,
            bus,
            locks: RentLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }
}

impl<S, B> SalesInvoiceHooks<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Reconcile the linked rent and mirror the stock movement.
    ///
    /// Invoices without a rent are ignored (`Ok(None)`). A missing rent is an
    /// error the host should show to the user and use to abort the submit.
    pub fn on_submit(&self, invoice: &SalesInvoice) -> Result<Option<SubmitOutcome>, HookError> {
        let Some(rent_id) = invoice.rent() else {
            tracing::debug!(invoice = %invoice.name(), "sales invoice not linked to a rent");
            return Ok(None);
        };

        // Nothing is written to the rent until the mirror exists, so a failed
        // mirror leaves the rent as it was.
        let mut mirror: Option<StockEntryId> = None;
        let result = self.update_rent(rent_id, |rent| {
            let prior = self.settled_lines(rent_id, Some(invoice.name()))?;

            let outcome = reconcile(rent.time_logs(), &prior, &invoice.return_lines());
            let mut commands = vec![RentCommand::RecordReturn(RecordReturn {
                rent_id: rent_id.clone(),
                sales_invoice: invoice.name().clone(),
                status: outcome.status,
                occurred_at: Utc::now(),
            })];

            if self.config.mirror_on_submit {
                let name = self.insert_stock_mirror(invoice)?;
                commands.push(RentCommand::LinkStockEntry(LinkStockEntry {
                    rent_id: rent_id.clone(),
                    stock_entry: name.clone(),
                    occurred_at: Utc::now(),
                }));
                mirror = Some(name);
            }
            Ok((commands, (outcome, rent.status())))
        });

        let (rent, (reconciliation, previous_status)) = match result {
            Ok(updated) => updated,
            Err(err) => {
                if let Some(name) = &mirror {
                    self.withdraw_stock_mirror(name);
                }
                return Err(err);
            }
        };

        tracing::info!(
            rent = %rent_id,
            invoice = %invoice.name(),
            from = %previous_status,
            to = %rent.status(),
            stock_entry = ?mirror.as_ref().map(StockEntryId::as_str),
            "rent reconciled against settling invoices"
        );

        Ok(Some(SubmitOutcome {
            rent: rent_id.clone(),
            previous_status,
            status: rent.status(),
            reconciliation,
            stock_entry: mirror,
        }))
    }

    /// Mirror the invoice status text onto the linked rent.
    pub fn on_change(&self, invoice: &SalesInvoice) -> Result<(), HookError> {
        let Some(rent_id) = invoice.rent() else {
            return Ok(());
        };

        self.update_rent(rent_id, |_| {
            Ok((
                vec![RentCommand::SyncInvoiceStatus(SyncInvoiceStatus {
                    rent_id: rent_id.clone(),
                    invoice_status: invoice.status().to_string(),
                    occurred_at: Utc::now(),
                })],
                (),
            ))
        })?;
        Ok(())
    }

    /// Undo what `on_submit` linked, step by step.
    ///
    /// Every step runs even when an earlier one failed; failures are logged
    /// and recorded in the returned report. The rent status goes back to
    /// Submitted regardless of other invoices still settling the rent.
    pub fn on_cancel(&self, invoice: &SalesInvoice) -> CancelReport {
        let invoice_id = invoice.name();
        let rent_id = invoice.rent();
        let mut report = CancelReport::new(invoice_id.clone(), rent_id.cloned());

        if let Some(rent_id) = rent_id {
            let result = self
                .update_rent(rent_id, |_| {
                    Ok((
                        vec![RentCommand::UnlinkSalesInvoice(UnlinkSalesInvoice {
                            rent_id: rent_id.clone(),
                            occurred_at: Utc::now(),
                        })],
                        (),
                    ))
                })
                .map(drop);
            log_step(CancelStep::UnlinkSalesInvoice, invoice_id, rent_id.as_str(), &result);
            report.record(CancelStep::UnlinkSalesInvoice, Some(rent_id.to_string()), result);
        }

        let stock_entries = match self.store.submitted_stock_entries_for_invoice(invoice_id) {
            Ok(found) => {
                tracing::info!(invoice = %invoice_id, count = found.len(), "found stock entries to cancel");
                report.record(CancelStep::FindStockEntries, None, Ok(()));
                found
            }
            Err(err) => {
                let err = HookError::from(err);
                tracing::error!(invoice = %invoice_id, error = %err, "cancel step failed: find stock entries");
                report.record(CancelStep::FindStockEntries, None, Err(err));
                Vec::new()
            }
        };
        report.stock_entries = stock_entries.clone();

        if let Some(rent_id) = rent_id {
            let result = self
                .update_rent(rent_id, |rent| {
                    let commands = match rent.stock_entry() {
                        Some(linked) if stock_entries.contains(linked) => {
                            vec![RentCommand::UnlinkStockEntry(UnlinkStockEntry {
                                rent_id: rent_id.clone(),
                                stock_entry: linked.clone(),
                                occurred_at: Utc::now(),
                            })]
                        }
                        _ => Vec::new(),
                    };
                    Ok((commands, ()))
                })
                .map(drop);
            log_step(CancelStep::ClearRentStockEntry, invoice_id, rent_id.as_str(), &result);
            report.record(CancelStep::ClearRentStockEntry, Some(rent_id.to_string()), result);
        }

        for entry in &stock_entries {
            let result = self.unlink_stock_entry(entry);
            log_step(CancelStep::UnlinkStockEntry, invoice_id, entry.as_str(), &result);
            report.record(CancelStep::UnlinkStockEntry, Some(entry.to_string()), result);
        }

        for entry in &stock_entries {
            let result = self.cancel_stock_entry(entry);
            log_step(CancelStep::CancelStockEntry, invoice_id, entry.as_str(), &result);
            match &result {
                Ok(()) => report.message(
                    Indicator::Green,
                    format!("Stock Entry {entry} has been cancelled."),
                ),
                Err(err) => report.message(
                    Indicator::Red,
                    format!("Failed to cancel Stock Entry {entry}: {err}"),
                ),
            }
            report.record(CancelStep::CancelStockEntry, Some(entry.to_string()), result);
        }

        if let Some(rent_id) = rent_id {
            let result = self
                .update_rent(rent_id, |_| {
                    Ok((
                        vec![RentCommand::ResetStatus(ResetStatus {
                            rent_id: rent_id.clone(),
                            occurred_at: Utc::now(),
                        })],
                        (),
                    ))
                })
                .map(drop);
            log_step(CancelStep::ResetRentStatus, invoice_id, rent_id.as_str(), &result);
            match &result {
                Ok(()) => report.message(
                    Indicator::Green,
                    format!("Rent {rent_id} has been unlinked and status reset to Submitted."),
                ),
                Err(err @ HookError::RentNotFound(_)) => {
                    report.message(Indicator::Yellow, err.to_string())
                }
                Err(err) => report.message(
                    Indicator::Red,
                    format!("Failed to update Rent {rent_id}: {err}"),
                ),
            }
            report.record(CancelStep::ResetRentStatus, Some(rent_id.to_string()), result);
        }

        if !report.is_clean() {
            tracing::warn!(
                invoice = %invoice_id,
                failed = report.failures().count(),
                "sales invoice cancellation finished with failed steps"
            );
        }
        report
    }

    /// Cancel a submitted invoice, then unlink its rent and stock mirrors.
    ///
    /// Anything but a submitted invoice is rejected before any step runs. Once
    /// the invoice is cancelled the compensation steps run as in `on_cancel`.
    pub fn cancel_with_unlink(&self, name: &SalesInvoiceId) -> Result<CancelReport, HookError> {
        let mut invoice = self.store.get_sales_invoice(name)?;
        if !invoice.docstatus().is_submitted() {
            return Err(DomainError::invalid_transition(format!(
                "sales invoice {name} is not submitted"
            ))
            .into());
        }

        invoice.cancel()?;
        self.store.save_sales_invoice(&invoice)?;
        tracing::info!(invoice = %name, "sales invoice cancelled");

        let mut report = self.on_cancel(&invoice);
        report.message(Indicator::Green, format!("Sales Invoice {name} has been cancelled."));
        report.steps.insert(
            0,
            StepOutcome {
                step: CancelStep::CancelSalesInvoice,
                target: Some(name.to_string()),
                result: Ok(()),
            },
        );
        Ok(report)
    }

    /// Outstanding time log rows for a rent, net of every submitted invoice.
    pub fn remaining_for(&self, rent_id: &RentId) -> Result<Vec<RemainingItem>, HookError> {
        let rent = self.load_rent(rent_id)?;
        let settled = self.settled_lines(rent_id, None)?;
        Ok(remaining_quantities(&rent, &settled))
    }

    /// Prefill lines for a new invoice settling everything still outstanding.
    ///
    /// Each line returns its row's remaining quantity. With `daily` pricing
    /// the billed quantity is the remaining quantity times the days since the
    /// rent date; otherwise it equals the remaining quantity.
    pub fn draft_lines(
        &self,
        rent_id: &RentId,
        posting_date: NaiveDate,
        daily: bool,
    ) -> Result<Vec<SalesInvoiceItem>, HookError> {
        let rent = self.load_rent(rent_id)?;
        let settled = self.settled_lines(rent_id, None)?;

        let lines = remaining_quantities(&rent, &settled)
            .into_iter()
            .map(|item| {
                let (qty, days) = if daily {
                    let billed = daily_quantity(item.remaining_qty, rent.date(), posting_date);
                    (billed.qty, Some(billed.days))
                } else {
                    (item.remaining_qty, None)
                };
                SalesInvoiceItem {
                    item_code: item.item_code,
                    item_name: item.item_name,
                    qty,
                    rate: item.rate,
                    rent_qty: item.remaining_qty,
                    rent_detail: Some(item.rent_detail),
                    uom: item.uom,
                    days,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(rent = %rent_id, lines = lines.len(), daily, "drafted settling invoice lines");
        Ok(lines)
    }

    /// Check a draft invoice's returns against what is still outstanding on
    /// its rent. Unlinked drafts are always valid.
    pub fn validate_draft(&self, invoice: &SalesInvoice) -> Result<QuantityCheck, HookError> {
        let Some(rent_id) = invoice.rent() else {
            return Ok(QuantityCheck {
                is_valid: true,
                violations: Vec::new(),
            });
        };

        let rent = self.load_rent(rent_id)?;
        let settled = self.settled_lines(rent_id, Some(invoice.name()))?;
        let check = validate_quantities(&rent, &settled, &invoice.return_lines());

        if !check.is_valid {
            tracing::warn!(
                rent = %rent_id,
                invoice = %invoice.name(),
                violations = check.violations.len(),
                "draft returns more than remains on the rent"
            );
        }
        Ok(check)
    }

    fn load_rent(&self, rent_id: &RentId) -> Result<Rent, HookError> {
        self.store
            .get_rent(rent_id)
            .map_err(|err| HookError::from_rent_lookup(rent_id, err))
    }

    fn settled_lines(
        &self,
        rent_id: &RentId,
        exclude: Option<&SalesInvoiceId>,
    ) -> Result<Vec<ReturnLine>, HookError> {
        Ok(self
            .store
            .submitted_invoices_for_rent(rent_id, exclude)?
            .iter()
            .flat_map(SalesInvoice::return_lines)
            .collect())
    }

    fn insert_stock_mirror(&self, invoice: &SalesInvoice) -> Result<StockEntryId, HookError> {
        let name = self.store.next_stock_entry_name(&self.config.stock_entry_series)?;
        let mut entry = StockEntry::mirror_of(name, self.config.stock_entry_type, invoice)?;
        entry.submit()?;
        self.store.insert_stock_entry(&entry)?;

        tracing::info!(
            invoice = %invoice.name(),
            stock_entry = %entry.name(),
            lines = entry.items().len(),
            "stock mirror submitted"
        );
        Ok(entry.name().clone())
    }

    /// Cancel a mirror whose rent write did not land.
    fn withdraw_stock_mirror(&self, name: &StockEntryId) {
        match self.cancel_stock_entry(name) {
            Ok(()) => tracing::warn!(stock_entry = %name, "rent write failed, stock mirror cancelled"),
            Err(err) => tracing::error!(
                stock_entry = %name,
                error = %err,
                "rent write failed and the stock mirror could not be cancelled"
            ),
        }
    }

    fn unlink_stock_entry(&self, name: &StockEntryId) -> Result<(), HookError> {
        let mut entry = self.store.get_stock_entry(name)?;
        entry.unlink_rent();
        self.store.save_stock_entry(&entry)?;
        Ok(())
    }

    fn cancel_stock_entry(&self, name: &StockEntryId) -> Result<(), HookError> {
        let mut entry = self.store.get_stock_entry(name)?;
        entry.cancel()?;
        self.store.save_stock_entry(&entry)?;
        Ok(())
    }

    /// Run `decide` against the current rent under its lock, apply the
    /// commands it returns, and write the rent back if anything changed.
    ///
    /// The write is checked against the version that was read, so a writer
    /// bypassing these hooks surfaces as a concurrency error.
    pub(crate) fn update_rent<T, F>(&self, rent_id: &RentId, decide: F) -> Result<(Rent, T), HookError>
    where
        F: FnOnce(&Rent) -> Result<(Vec<RentCommand>, T), HookError>,
    {
        let lock = self.locks.lock_for(rent_id);
        let result = {
            let _guard = RentLocks::hold(&lock);
            self.update_rent_locked(rent_id, decide)
        };
        self.locks.release(rent_id, lock);
        result
    }

    fn update_rent_locked<T, F>(&self, rent_id: &RentId, decide: F) -> Result<(Rent, T), HookError>
    where
        F: FnOnce(&Rent) -> Result<(Vec<RentCommand>, T), HookError>,
    {
        let mut rent = self.load_rent(rent_id)?;
        let loaded_version = rent.version();

        let (commands, decided) = decide(&rent)?;

        let mut events = Vec::new();
        for command in &commands {
            events.extend(execute(&mut rent, command)?);
        }

        if !events.is_empty() {
            self.store
                .save_rent(&rent, ExpectedVersion::Exact(loaded_version))?;
            self.publish(rent_id, loaded_version, &events);
        }

        Ok((rent, decided))
    }

    /// Publish rent events after a successful write. Failures are logged only:
    /// the rent is already persisted.
    fn publish(&self, rent_id: &RentId, base_version: u64, events: &[RentEvent]) {
        for (offset, event) in events.iter().enumerate() {
            let sequence = base_version + offset as u64 + 1;
            let envelope = match EventEnvelope::from_typed("Rent", rent_id.as_str(), sequence, event) {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::warn!(rent = %rent_id, error = %err, "failed to serialize rent event");
                    continue;
                }
            };
            if let Err(err) = self.bus.publish(envelope) {
                tracing::warn!(rent = %rent_id, error = ?err, "failed to publish rent event");
            }
        }
    }
}

fn log_step(step: CancelStep, invoice: &SalesInvoiceId, document: &str, result: &Result<(), HookError>) {
    match result {
        Ok(()) => tracing::info!(invoice = %invoice, document, step = step.label(), "cancel step done"),
        Err(err) => tracing::error!(
            invoice = %invoice,
            document,
            step = step.label(),
            error = %err,
            "cancel step failed"
        ),
    }
}
