use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rentdesk_core::{AggregateRoot, Document, ExpectedVersion, RentId, SalesInvoiceId, StockEntryId};
use rentdesk_invoicing::SalesInvoice;
use rentdesk_rental::Rent;
use rentdesk_stock::StockEntry;

use super::r#trait::{DocumentStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    rents: HashMap<RentId, Rent>,
    invoices: BTreeMap<SalesInvoiceId, SalesInvoice>,
    stock_entries: BTreeMap<StockEntryId, StockEntry>,
    series: HashMap<String, u64>,
    /// Document names whose writes fail (fault injection for tests).
    rejected: HashSet<String>,
}

impl Tables {
    fn ensure_writable(&self, doctype: &'static str, name: &str) -> Result<(), StoreError> {
        if self.rejected.contains(name) {
            return Err(StoreError::Rejected {
                doctype,
                name: name.to_string(),
                reason: "writes to this document are rejected".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory document store.
///
/// Intended for tests/dev. Invoices and stock entries are kept ordered by
/// name so queries return deterministic results.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    tables: RwLock<Tables>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Seed a rent (the rent pre-exists from the hooks' point of view).
    pub fn insert_rent(&self, rent: Rent) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.rents.contains_key(rent.id()) {
            return Err(StoreError::Duplicate {
                doctype: "Rent",
                name: rent.id().to_string(),
            });
        }
        tables.rents.insert(rent.id().clone(), rent);
        Ok(())
    }

    /// Make every subsequent write to the named document fail.
    pub fn reject_writes_to(&self, name: impl Into<String>) -> Result<(), StoreError> {
        self.write()?.rejected.insert(name.into());
        Ok(())
    }

    /// Snapshot of every stock entry (any docstatus), ordered by name.
    pub fn stock_entries(&self) -> Result<Vec<StockEntry>, StoreError> {
        Ok(self.read()?.stock_entries.values().cloned().collect())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get_rent(&self, name: &RentId) -> Result<Rent, StoreError> {
        self.read()?
            .rents
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Rent", name))
    }

    fn save_rent(&self, rent: &Rent, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.ensure_writable("Rent", rent.id().as_str())?;

        let stored = tables
            .rents
            .get(rent.id())
            .ok_or_else(|| StoreError::not_found("Rent", rent.id()))?;

        expected
            .check(stored.version())
            .map_err(|err| StoreError::Concurrency(format!("rent {}: {err}", rent.id())))?;

        tables.rents.insert(rent.id().clone(), rent.clone());
        Ok(())
    }

    fn get_sales_invoice(&self, name: &SalesInvoiceId) -> Result<SalesInvoice, StoreError> {
        self.read()?
            .invoices
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(SalesInvoice::DOCTYPE, name))
    }

    fn save_sales_invoice(&self, invoice: &SalesInvoice) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.ensure_writable(SalesInvoice::DOCTYPE, invoice.name().as_str())?;
        tables.invoices.insert(invoice.name().clone(), invoice.clone());
        Ok(())
    }

    fn submitted_invoices_for_rent(
        &self,
        rent: &RentId,
        exclude: Option<&SalesInvoiceId>,
    ) -> Result<Vec<SalesInvoice>, StoreError> {
        Ok(self
            .read()?
            .invoices
            .values()
            .filter(|inv| inv.settles(rent) && inv.docstatus().is_submitted())
            .filter(|inv| Some(inv.name()) != exclude)
            .cloned()
            .collect())
    }

    fn next_stock_entry_name(&self, series: &str) -> Result<StockEntryId, StoreError> {
        let mut tables = self.write()?;
        let counter = tables.series.entry(series.to_string()).or_insert(0);
        *counter += 1;
        let next = *counter;

        StockEntryId::new(format!("{series}{next:05}")).map_err(|e| StoreError::Rejected {
            doctype: StockEntry::DOCTYPE,
            name: series.to_string(),
            reason: e.to_string(),
        })
    }

    fn insert_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.ensure_writable(StockEntry::DOCTYPE, entry.name().as_str())?;
        if tables.stock_entries.contains_key(entry.name()) {
            return Err(StoreError::Duplicate {
                doctype: StockEntry::DOCTYPE,
                name: entry.name().to_string(),
            });
        }
        tables.stock_entries.insert(entry.name().clone(), entry.clone());
        Ok(())
    }

    fn get_stock_entry(&self, name: &StockEntryId) -> Result<StockEntry, StoreError> {
        self.read()?
            .stock_entries
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(StockEntry::DOCTYPE, name))
    }

    fn save_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.ensure_writable(StockEntry::DOCTYPE, entry.name().as_str())?;
        if !tables.stock_entries.contains_key(entry.name()) {
            return Err(StoreError::not_found(StockEntry::DOCTYPE, entry.name()));
        }
        tables.stock_entries.insert(entry.name().clone(), entry.clone());
        Ok(())
    }

    fn submitted_stock_entries_for_invoice(
        &self,
        invoice: &SalesInvoiceId,
    ) -> Result<Vec<StockEntryId>, StoreError> {
        Ok(self
            .read()?
            .stock_entries
            .values()
            .filter(|entry| entry.mirrors(invoice))
            .map(|entry| entry.name().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rentdesk_core::aggregate::execute;
    use rentdesk_core::{CustomerId, ItemCode, Quantity};
    use rentdesk_invoicing::SalesInvoiceItem;
    use rentdesk_rental::{RentCommand, ResetStatus};

    fn rent() -> Rent {
        Rent::new(
            RentId::new("RENT-0001").unwrap(),
            None,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            vec![],
        )
        .unwrap()
    }

    fn invoice(name: &str, rent: Option<&str>, submit: bool) -> SalesInvoice {
        let mut inv = SalesInvoice::new(
            SalesInvoiceId::new(name).unwrap(),
            CustomerId::new("Acme").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            vec![SalesInvoiceItem {
                item_code: ItemCode::new("ItemA").unwrap(),
                item_name: "Item A".to_string(),
                qty: Quantity::new(1.0).unwrap(),
                rate: 100,
                rent_qty: Quantity::new(1.0).unwrap(),
                rent_detail: None,
                uom: None,
                days: None,
            }],
        )
        .unwrap();
        if let Some(rent) = rent {
            inv = inv.with_rent(RentId::new(rent).unwrap());
        }
        if submit {
            inv.submit().unwrap();
        }
        inv
    }

    #[test]
    fn stale_rent_write_is_rejected() {
        let store = InMemoryDocumentStore::new();
        store.insert_rent(rent()).unwrap();

        let mut first = store.get_rent(&RentId::new("RENT-0001").unwrap()).unwrap();
        let mut second = first.clone();
        let reset = RentCommand::ResetStatus(ResetStatus {
            rent_id: first.id().clone(),
            occurred_at: Utc::now(),
        });

        execute(&mut first, &reset).unwrap();
        store.save_rent(&first, ExpectedVersion::Exact(0)).unwrap();

        execute(&mut second, &reset).unwrap();
        let err = store.save_rent(&second, ExpectedVersion::Exact(0)).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
    }

    #[test]
    fn missing_rent_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store.get_rent(&RentId::new("RENT-404").unwrap()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn invoice_query_filters_rent_docstatus_and_exclusion() {
        let store = InMemoryDocumentStore::new();
        store.save_sales_invoice(&invoice("SINV-1", Some("RENT-0001"), true)).unwrap();
        store.save_sales_invoice(&invoice("SINV-2", Some("RENT-0001"), true)).unwrap();
        store.save_sales_invoice(&invoice("SINV-3", Some("RENT-0001"), false)).unwrap();
        store.save_sales_invoice(&invoice("SINV-4", Some("RENT-0002"), true)).unwrap();
        store.save_sales_invoice(&invoice("SINV-5", None, true)).unwrap();

        let rent = RentId::new("RENT-0001").unwrap();
        let exclude = SalesInvoiceId::new("SINV-2").unwrap();
        let found = store.submitted_invoices_for_rent(&rent, Some(&exclude)).unwrap();

        let names: Vec<&str> = found.iter().map(|i| i.name().as_str()).collect();
        assert_eq!(names, vec!["SINV-1"]);
    }

    #[test]
    fn naming_series_is_sequential_per_prefix() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.next_stock_entry_name("MAT-STE-").unwrap().as_str(), "MAT-STE-00001");
        assert_eq!(store.next_stock_entry_name("MAT-STE-").unwrap().as_str(), "MAT-STE-00002");
        assert_eq!(store.next_stock_entry_name("RNT-STE-").unwrap().as_str(), "RNT-STE-00001");
    }

    #[test]
    fn rejected_documents_fail_writes() {
        let store = InMemoryDocumentStore::new();
        store.insert_rent(rent()).unwrap();
        store.reject_writes_to("RENT-0001").unwrap();

        let r = store.get_rent(&RentId::new("RENT-0001").unwrap()).unwrap();
        assert!(matches!(
            store.save_rent(&r, ExpectedVersion::Any),
            Err(StoreError::Rejected { .. })
        ));
    }
}
