//! Integration tests for the Sales Invoice hooks against the in-memory store.
//!
//! Tests: invoice submit/change/cancel → rent reconciliation → stock mirror → bus
//!
//! Verifies:
//! - Rent status follows the cumulative returns of every settling invoice
//! - Cancellation unlinks exactly the invoice's own mirrors
//! - A failing compensation step does not stop the others
//! - Concurrent submits for one rent do not lose returns

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use rentdesk_core::{
        AggregateRoot, CustomerId, DocStatus, DomainError, ItemCode, Quantity, RentId, SalesInvoiceId, StockEntryId,
    };
    use rentdesk_events::{EventBus, EventEnvelope, InMemoryEventBus};
    use rentdesk_invoicing::{InvoiceStatus, SalesInvoice, SalesInvoiceItem};
    use rentdesk_rental::{Rent, RentStatus, TimeLog};

    use crate::config::HookConfig;
    use crate::hooks::{
        CancelStep, DocEvent, HookError, HookOutcome, HookTable, Indicator, SalesInvoiceHooks,
    };
    use crate::store::{DocumentStore, InMemoryDocumentStore};

    type Bus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
    type Hooks = SalesInvoiceHooks<Arc<InMemoryDocumentStore>, Bus>;

    const RENT: &str = "RENT-0001";

    fn rent_id() -> RentId {
        RentId::new(RENT).unwrap()
    }

    fn qty(v: f64) -> Quantity {
        Quantity::new(v).unwrap()
    }

    fn time_log(idx: u32, code: &str, expected: f64) -> TimeLog {
        TimeLog {
            idx,
            item_code: ItemCode::new(code).unwrap(),
            item_name: format!("{code} name"),
            qty: qty(expected),
            rate: 1_500,
            uom: Some("Nos".to_string()),
        }
    }

    fn setup_with(config: HookConfig, logs: Vec<TimeLog>) -> (Hooks, Arc<InMemoryDocumentStore>, Bus) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let rent = Rent::new(
            rent_id(),
            Some(CustomerId::new("Acme").unwrap()),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            logs,
        )
        .unwrap();
        store.insert_rent(rent).unwrap();

        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let hooks = SalesInvoiceHooks::new(store.clone(), bus.clone(), config);
        (hooks, store, bus)
    }

    fn setup() -> (Hooks, Arc<InMemoryDocumentStore>, Bus) {
        setup_with(HookConfig::default(), vec![time_log(1, "ItemA", 10.0)])
    }

    fn draft(name: &str, rent: &str, returns: &[(&str, f64)]) -> SalesInvoice {
        let items = returns
            .iter()
            .map(|(code, returned)| SalesInvoiceItem {
                item_code: ItemCode::new(*code).unwrap(),
                item_name: format!("{code} name"),
                qty: qty(*returned),
                rate: 1_500,
                rent_qty: qty(*returned),
                rent_detail: Some(1),
                uom: None,
                days: None,
            })
            .collect();
        SalesInvoice::new(
            SalesInvoiceId::new(name).unwrap(),
            CustomerId::new("Acme").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            items,
        )
        .unwrap()
        .with_rent(RentId::new(rent).unwrap())
    }

    /// Submit the way the host does: persist the submitted invoice, then run the hook.
    fn submit(hooks: &Hooks, store: &InMemoryDocumentStore, mut invoice: SalesInvoice) -> SalesInvoice {
        invoice.submit().unwrap();
        store.save_sales_invoice(&invoice).unwrap();
        hooks.on_submit(&invoice).unwrap();
        invoice
    }

    fn rent(store: &InMemoryDocumentStore) -> Rent {
        store.get_rent(&rent_id()).unwrap()
    }

    fn entry(store: &InMemoryDocumentStore, name: &str) -> rentdesk_stock::StockEntry {
        store.get_stock_entry(&StockEntryId::new(name).unwrap()).unwrap()
    }

    #[test]
    fn returns_accumulate_across_invoices() {
        let (hooks, store, _bus) = setup();

        let mut first = draft("SINV-0001", RENT, &[("ItemA", 4.0)]);
        first.submit().unwrap();
        store.save_sales_invoice(&first).unwrap();
        let outcome = hooks.on_submit(&first).unwrap().unwrap();

        assert_eq!(outcome.previous_status, RentStatus::Submitted);
        assert_eq!(outcome.status, RentStatus::PartialReturned);
        assert_eq!(outcome.stock_entry.as_ref().unwrap().as_str(), "MAT-STE-00001");
        assert_eq!(rent(&store).sales_invoice().unwrap().as_str(), "SINV-0001");

        submit(&hooks, &store, draft("SINV-0002", RENT, &[("ItemA", 6.0)]));

        let rent = rent(&store);
        assert_eq!(rent.status(), RentStatus::Returned);
        assert_eq!(rent.sales_invoice().unwrap().as_str(), "SINV-0002");
        assert_eq!(rent.stock_entry().unwrap().as_str(), "MAT-STE-00002");
    }

    #[test]
    fn submit_mirrors_invoice_lines_as_stock_movement() {
        let (hooks, store, _bus) = setup_with(
            HookConfig::default(),
            vec![time_log(1, "ItemA", 10.0), time_log(2, "ItemB", 3.0)],
        );

        submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 10.0), ("ItemB", 1.0)]));

        let mirror = entry(&store, "MAT-STE-00001");
        assert_eq!(mirror.docstatus(), DocStatus::Submitted);
        assert_eq!(mirror.rent().unwrap().as_str(), RENT);
        assert_eq!(mirror.sales_invoice().unwrap().as_str(), "SINV-0001");
        assert_eq!(mirror.items().len(), 2);
        assert_eq!(mirror.items()[1].qty, qty(1.0));
        assert_eq!(rent(&store).status(), RentStatus::PartialReturned);
    }

    #[test]
    fn unexpected_items_do_not_move_status() {
        let (hooks, store, _bus) = setup();

        submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemZ", 50.0)]));

        assert_eq!(rent(&store).status(), RentStatus::Submitted);
    }

    #[test]
    fn cancelling_second_invoice_resets_status_and_unlinks_only_its_mirror() {
        let (hooks, store, _bus) = setup();
        submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));
        submit(&hooks, &store, draft("SINV-0002", RENT, &[("ItemA", 6.0)]));

        let report = hooks
            .cancel_with_unlink(&SalesInvoiceId::new("SINV-0002").unwrap())
            .unwrap();
        assert!(report.is_clean(), "unexpected failures: {:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(report.cancelled_stock_entries(), vec!["MAT-STE-00002"]);

        // Status goes back to Submitted even though SINV-0001 still returns 4.
        let rent = rent(&store);
        assert_eq!(rent.status(), RentStatus::Submitted);
        assert!(rent.sales_invoice().is_none());
        assert!(rent.stock_entry().is_none());

        let cancelled = entry(&store, "MAT-STE-00002");
        assert_eq!(cancelled.docstatus(), DocStatus::Cancelled);
        assert!(cancelled.rent().is_none());
        assert!(cancelled.customer().is_none());

        let kept = entry(&store, "MAT-STE-00001");
        assert_eq!(kept.docstatus(), DocStatus::Submitted);
        assert_eq!(kept.rent().unwrap().as_str(), RENT);

        let invoice = store
            .get_sales_invoice(&SalesInvoiceId::new("SINV-0002").unwrap())
            .unwrap();
        assert_eq!(invoice.docstatus(), DocStatus::Cancelled);
    }

    #[test]
    fn cancelling_an_older_invoice_keeps_the_current_mirror_linked() {
        let (hooks, store, _bus) = setup();
        let first = submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));
        submit(&hooks, &store, draft("SINV-0002", RENT, &[("ItemA", 2.0)]));

        let report = hooks.on_cancel(&first);

        assert_eq!(report.stock_entries, vec![StockEntryId::new("MAT-STE-00001").unwrap()]);
        assert_eq!(rent(&store).stock_entry().unwrap().as_str(), "MAT-STE-00002");
        assert_eq!(entry(&store, "MAT-STE-00002").docstatus(), DocStatus::Submitted);
        assert_eq!(entry(&store, "MAT-STE-00001").docstatus(), DocStatus::Cancelled);
    }

    #[test]
    fn missing_rent_fails_submit_with_user_message() {
        let (hooks, store, _bus) = setup();

        let mut invoice = draft("SINV-0001", "RENT-0404", &[("ItemA", 1.0)]);
        invoice.submit().unwrap();
        let err = hooks.on_submit(&invoice).unwrap_err();

        assert!(matches!(err, HookError::RentNotFound(_)));
        assert_eq!(err.to_string(), "Rent document RENT-0404 does not exist.");
        assert!(store.stock_entries().unwrap().is_empty());
    }

    #[test]
    fn invoice_without_rent_is_ignored() {
        let (hooks, store, _bus) = setup();

        let mut invoice = SalesInvoice::new(
            SalesInvoiceId::new("SINV-0001").unwrap(),
            CustomerId::new("Acme").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            draft("SINV-0001", RENT, &[("ItemA", 1.0)]).items().to_vec(),
        )
        .unwrap();
        invoice.submit().unwrap();

        assert!(hooks.on_submit(&invoice).unwrap().is_none());
        hooks.on_change(&invoice).unwrap();
        assert!(store.stock_entries().unwrap().is_empty());
        assert_eq!(rent(&store).version(), 0);
    }

    #[test]
    fn cancel_with_missing_rent_still_cancels_mirrors() {
        let (hooks, store, _bus) = setup();
        let invoice = submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));

        // Same invoice, but pointing at a rent that has since disappeared.
        let orphan = SalesInvoice::new(
            invoice.name().clone(),
            invoice.customer().clone(),
            invoice.posting_date(),
            invoice.items().to_vec(),
        )
        .unwrap()
        .with_rent(RentId::new("RENT-0404").unwrap());

        let report = hooks.on_cancel(&orphan);

        assert_eq!(report.cancelled_stock_entries(), vec!["MAT-STE-00001"]);
        assert!(report.step(CancelStep::ResetRentStatus).all(|s| !s.is_ok()));
        assert!(report.messages.iter().any(|m| {
            m.indicator == Indicator::Yellow && m.text == "Rent document RENT-0404 does not exist."
        }));
    }

    #[test]
    fn failing_mirror_write_does_not_block_rent_reset() {
        let (hooks, store, _bus) = setup();
        let invoice = submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));
        store.reject_writes_to("MAT-STE-00001").unwrap();

        let report = hooks.on_cancel(&invoice);

        let failed: Vec<CancelStep> = report.failures().map(|s| s.step).collect();
        assert_eq!(failed, vec![CancelStep::UnlinkStockEntry, CancelStep::CancelStockEntry]);
        assert!(report.messages.iter().any(|m| {
            m.indicator == Indicator::Red && m.text.starts_with("Failed to cancel Stock Entry MAT-STE-00001:")
        }));
        assert!(report.messages.iter().any(|m| {
            m.indicator == Indicator::Green
                && m.text == "Rent RENT-0001 has been unlinked and status reset to Submitted."
        }));

        let rent = rent(&store);
        assert_eq!(rent.status(), RentStatus::Submitted);
        assert!(rent.stock_entry().is_none());
        assert_eq!(entry(&store, "MAT-STE-00001").docstatus(), DocStatus::Submitted);
    }

    #[test]
    fn status_changes_are_mirrored_on_the_rent() {
        let (hooks, store, _bus) = setup();
        let mut invoice = submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));

        invoice.set_status(InvoiceStatus::PartlyPaid).unwrap();
        hooks.on_change(&invoice).unwrap();
        assert_eq!(rent(&store).sales_invoice_status(), Some("Partly Paid"));

        let version = rent(&store).version();
        hooks.on_change(&invoice).unwrap();
        assert_eq!(rent(&store).version(), version);
    }

    #[test]
    fn cancel_with_unlink_requires_a_submitted_invoice() {
        let (hooks, store, _bus) = setup();
        store
            .save_sales_invoice(&draft("SINV-0001", RENT, &[("ItemA", 4.0)]))
            .unwrap();

        let err = hooks
            .cancel_with_unlink(&SalesInvoiceId::new("SINV-0001").unwrap())
            .unwrap_err();
        assert!(matches!(err, HookError::Domain(DomainError::InvalidTransition(_))));
    }

    #[test]
    fn mirror_can_be_disabled() {
        let config = HookConfig {
            mirror_on_submit: false,
            ..HookConfig::default()
        };
        let (hooks, store, _bus) = setup_with(config, vec![time_log(1, "ItemA", 10.0)]);

        let mut invoice = draft("SINV-0001", RENT, &[("ItemA", 10.0)]);
        invoice.submit().unwrap();
        let outcome = hooks.on_submit(&invoice).unwrap().unwrap();

        assert_eq!(outcome.status, RentStatus::Returned);
        assert!(outcome.stock_entry.is_none());
        assert!(store.stock_entries().unwrap().is_empty());
    }

    #[test]
    fn rent_changes_are_published_in_version_order() {
        let (hooks, store, bus) = setup();
        let sub = bus.subscribe();

        submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));

        let published = sub.drain();
        let types: Vec<&str> = published.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["rental.rent.return_recorded", "rental.rent.stock_entry_linked"]);

        let sequence: Vec<u64> = published.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequence, vec![1, 2]);
        assert!(published.iter().all(|e| e.doctype() == "Rent" && e.document() == RENT));
        assert_eq!(published[0].payload()["ReturnRecorded"]["status"], serde_json::json!("Partial Returned"));
        assert_eq!(rent(&store).version(), 2);
    }

    #[test]
    fn concurrent_submits_for_one_rent_keep_every_return() {
        let (hooks, store, _bus) = setup();
        let hooks = Arc::new(hooks);

        let handles: Vec<_> = ["SINV-0001", "SINV-0002"]
            .into_iter()
            .map(|name| {
                let hooks = hooks.clone();
                let store = store.clone();
                std::thread::spawn(move || {
                    submit(&hooks, &store, draft(name, RENT, &[("ItemA", 5.0)]));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(rent(&store).status(), RentStatus::Returned);
        assert_eq!(store.stock_entries().unwrap().len(), 2);
    }

    #[test]
    fn drafting_helpers_net_out_submitted_returns() {
        let (hooks, store, _bus) = setup();
        submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0)]));

        let remaining = hooks.remaining_for(&rent_id()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].remaining_qty, qty(6.0));

        let check = hooks
            .validate_draft(&draft("SINV-0002", RENT, &[("ItemA", 7.0)]))
            .unwrap();
        assert!(!check.is_valid);
        assert_eq!(check.violations[0].remaining_qty, qty(6.0));

        assert!(hooks
            .validate_draft(&draft("SINV-0002", RENT, &[("ItemA", 6.0)]))
            .unwrap()
            .is_valid);
    }

    #[test]
    fn hook_table_dispatches_to_sales_invoice_hooks() {
        let (hooks, store, _bus) = setup();
        let mut table = HookTable::new();
        table.register_all(Arc::new(hooks));

        let mut invoice = draft("SINV-0001", RENT, &[("ItemA", 10.0)]);
        invoice.submit().unwrap();
        store.save_sales_invoice(&invoice).unwrap();

        let outcomes = table.fire(DocEvent::OnSubmit, &invoice).unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [HookOutcome::Submitted(o)] if o.status == RentStatus::Returned
        ));

        let outcomes = table.fire(DocEvent::OnCancel, &invoice).unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [HookOutcome::Cancelled(report)] if report.is_clean()
        ));
        assert_eq!(rent(&store).status(), RentStatus::Submitted);
    }

    #[test]
    fn failed_mirror_leaves_rent_untouched() {
        let (hooks, store, bus) = setup();
        let sub = bus.subscribe();
        store.reject_writes_to("MAT-STE-00001").unwrap();

        let mut invoice = draft("SINV-0001", RENT, &[("ItemA", 10.0)]);
        invoice.submit().unwrap();
        let err = hooks.on_submit(&invoice).unwrap_err();
        assert!(matches!(err, HookError::Store(_)));

        let rent = rent(&store);
        assert_eq!(rent.status(), RentStatus::Submitted);
        assert!(rent.sales_invoice().is_none());
        assert!(rent.stock_entry().is_none());
        assert_eq!(rent.version(), 0);
        assert!(store.stock_entries().unwrap().is_empty());
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn failed_rent_write_cancels_the_new_mirror() {
        let (hooks, store, _bus) = setup();
        store.reject_writes_to(RENT).unwrap();

        let mut invoice = draft("SINV-0001", RENT, &[("ItemA", 4.0)]);
        invoice.submit().unwrap();
        assert!(hooks.on_submit(&invoice).is_err());

        assert_eq!(rent(&store).status(), RentStatus::Submitted);
        let mirror = entry(&store, "MAT-STE-00001");
        assert_eq!(mirror.docstatus(), DocStatus::Cancelled);
        assert!(!mirror.mirrors(invoice.name()));
    }

    #[test]
    fn draft_lines_prefill_what_remains() {
        let (hooks, store, _bus) = setup_with(
            HookConfig::default(),
            vec![time_log(1, "ItemA", 10.0), time_log(2, "ItemB", 3.0)],
        );
        submit(&hooks, &store, draft("SINV-0001", RENT, &[("ItemA", 4.0), ("ItemB", 3.0)]));

        let posting = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let lines = hooks.draft_lines(&rent_id(), posting, false).unwrap();

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.item_code.as_str(), "ItemA");
        assert_eq!(line.rent_detail, Some(1));
        assert_eq!(line.rent_qty, qty(6.0));
        assert_eq!(line.qty, qty(6.0));
        assert_eq!(line.rate, 1_500);
        assert_eq!(line.uom.as_deref(), Some("Nos"));
        assert_eq!(line.days, None);
    }

    #[test]
    fn draft_lines_bill_per_day_under_daily_pricing() {
        let (hooks, _store, _bus) = setup();

        // Rent starts 2024-03-01.
        let posting = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let lines = hooks.draft_lines(&rent_id(), posting, true).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].days, Some(7));
        assert_eq!(lines[0].rent_qty, qty(10.0));
        assert_eq!(lines[0].qty, qty(70.0));

        let missing = hooks
            .draft_lines(&RentId::new("RENT-0404").unwrap(), posting, true)
            .unwrap_err();
        assert!(matches!(missing, HookError::RentNotFound(_)));
    }
}
