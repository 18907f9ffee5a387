use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use rentdesk_core::{
    Aggregate, AggregateRoot, CustomerId, DomainError, ItemCode, Quantity, RentId,
    SalesInvoiceId, StockEntryId,
};
use rentdesk_events::Event;

/// Return progress of a rental agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RentStatus {
    #[default]
    Submitted,
    #[serde(rename = "Partial Returned")]
    PartialReturned,
    Returned,
}

impl RentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RentStatus::Submitted => "Submitted",
            RentStatus::PartialReturned => "Partial Returned",
            RentStatus::Returned => "Returned",
        }
    }
}

impl core::fmt::Display for RentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time log line: an item rented out and the quantity expected back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLog {
    /// Row position on the rent (1-based), referenced by invoice lines as `rent_detail`.
    pub idx: u32,
    pub item_code: ItemCode,
    pub item_name: String,
    pub qty: Quantity,
    /// Rate in smallest currency unit (e.g., cents).
    pub rate: u64,
    pub uom: Option<String>,
}

/// Aggregate root: Rent (rental agreement).
///
/// The rent pre-exists in submitted state; invoice hooks only move its return
/// status and its back-references to the settling invoice and stock mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rent {
    id: RentId,
    customer: Option<CustomerId>,
    date: NaiveDate,
    time_logs: Vec<TimeLog>,
    status: RentStatus,
    sales_invoice: Option<SalesInvoiceId>,
    sales_invoice_status: Option<String>,
    stock_entry: Option<StockEntryId>,
    version: u64,
}

impl Rent {
    pub fn new(
        id: RentId,
        customer: Option<CustomerId>,
        date: NaiveDate,
        time_logs: Vec<TimeLog>,
    ) -> Result<Self, DomainError> {
        for log in &time_logs {
            if log.qty.value() < 0.0 {
                return Err(DomainError::validation(format!(
                    "time log {} has a negative quantity",
                    log.idx
                )));
            }
        }

        Ok(Self {
            id,
            customer,
            date,
            time_logs,
            status: RentStatus::Submitted,
            sales_invoice: None,
            sales_invoice_status: None,
            stock_entry: None,
            version: 0,
        })
    }

    pub fn customer(&self) -> Option<&CustomerId> {
        self.customer.as_ref()
    }

    /// Rental start date (daily billing counts from here).
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_logs(&self) -> &[TimeLog] {
        &self.time_logs
    }

    pub fn status(&self) -> RentStatus {
        self.status
    }

    /// Most recent settling invoice.
    pub fn sales_invoice(&self) -> Option<&SalesInvoiceId> {
        self.sales_invoice.as_ref()
    }

    pub fn sales_invoice_status(&self) -> Option<&str> {
        self.sales_invoice_status.as_deref()
    }

    pub fn stock_entry(&self) -> Option<&StockEntryId> {
        self.stock_entry.as_ref()
    }
}

impl AggregateRoot for Rent {
    type Id = RentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordReturn (a settling invoice was submitted).
///
/// `status` is the reconciliation outcome; `None` keeps the current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReturn {
    pub rent_id: RentId,
    pub sales_invoice: SalesInvoiceId,
    pub status: Option<RentStatus>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SyncInvoiceStatus (mirror the settling invoice's status text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInvoiceStatus {
    pub rent_id: RentId,
    pub invoice_status: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UnlinkSalesInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkSalesInvoice {
    pub rent_id: RentId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LinkStockEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStockEntry {
    pub rent_id: RentId,
    pub stock_entry: StockEntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UnlinkStockEntry. A no-op unless the rent points at `stock_entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkStockEntry {
    pub rent_id: RentId,
    pub stock_entry: StockEntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResetStatus (back to Submitted, unconditionally).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetStatus {
    pub rent_id: RentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentCommand {
    RecordReturn(RecordReturn),
    SyncInvoiceStatus(SyncInvoiceStatus),
    UnlinkSalesInvoice(UnlinkSalesInvoice),
    LinkStockEntry(LinkStockEntry),
    UnlinkStockEntry(UnlinkStockEntry),
    ResetStatus(ResetStatus),
}

impl RentCommand {
    pub fn rent_id(&self) -> &RentId {
        match self {
            RentCommand::RecordReturn(c) => &c.rent_id,
            RentCommand::SyncInvoiceStatus(c) => &c.rent_id,
            RentCommand::UnlinkSalesInvoice(c) => &c.rent_id,
            RentCommand::LinkStockEntry(c) => &c.rent_id,
            RentCommand::UnlinkStockEntry(c) => &c.rent_id,
            RentCommand::ResetStatus(c) => &c.rent_id,
        }
    }
}

/// Event: ReturnRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecorded {
    pub rent_id: RentId,
    pub sales_invoice: SalesInvoiceId,
    pub previous_status: RentStatus,
    pub status: RentStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceStatusSynced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStatusSynced {
    pub rent_id: RentId,
    pub invoice_status: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SalesInvoiceUnlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesInvoiceUnlinked {
    pub rent_id: RentId,
    pub sales_invoice: Option<SalesInvoiceId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockEntryLinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntryLinked {
    pub rent_id: RentId,
    pub stock_entry: StockEntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockEntryUnlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntryUnlinked {
    pub rent_id: RentId,
    pub stock_entry: StockEntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusReset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReset {
    pub rent_id: RentId,
    pub previous_status: RentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentEvent {
    ReturnRecorded(ReturnRecorded),
    InvoiceStatusSynced(InvoiceStatusSynced),
    SalesInvoiceUnlinked(SalesInvoiceUnlinked),
    StockEntryLinked(StockEntryLinked),
    StockEntryUnlinked(StockEntryUnlinked),
    StatusReset(StatusReset),
}

impl Event for RentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RentEvent::ReturnRecorded(_) => "rental.rent.return_recorded",
            RentEvent::InvoiceStatusSynced(_) => "rental.rent.invoice_status_synced",
            RentEvent::SalesInvoiceUnlinked(_) => "rental.rent.sales_invoice_unlinked",
            RentEvent::StockEntryLinked(_) => "rental.rent.stock_entry_linked",
            RentEvent::StockEntryUnlinked(_) => "rental.rent.stock_entry_unlinked",
            RentEvent::StatusReset(_) => "rental.rent.status_reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RentEvent::ReturnRecorded(e) => e.occurred_at,
            RentEvent::InvoiceStatusSynced(e) => e.occurred_at,
            RentEvent::SalesInvoiceUnlinked(e) => e.occurred_at,
            RentEvent::StockEntryLinked(e) => e.occurred_at,
            RentEvent::StockEntryUnlinked(e) => e.occurred_at,
            RentEvent::StatusReset(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Rent {
    type Command = RentCommand;
    type Event = RentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RentEvent::ReturnRecorded(e) => {
                self.status = e.status;
                self.sales_invoice = Some(e.sales_invoice.clone());
            }
            RentEvent::InvoiceStatusSynced(e) => {
                self.sales_invoice_status = Some(e.invoice_status.clone());
            }
            RentEvent::SalesInvoiceUnlinked(_) => {
                self.sales_invoice = None;
                self.sales_invoice_status = None;
            }
            RentEvent::StockEntryLinked(e) => {
                self.stock_entry = Some(e.stock_entry.clone());
            }
            RentEvent::StockEntryUnlinked(_) => {
                self.stock_entry = None;
            }
            RentEvent::StatusReset(_) => {
                self.status = RentStatus::Submitted;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_rent_id(command.rent_id())?;

        match command {
            RentCommand::RecordReturn(cmd) => Ok(vec![RentEvent::ReturnRecorded(ReturnRecorded {
                rent_id: cmd.rent_id.clone(),
                sales_invoice: cmd.sales_invoice.clone(),
                previous_status: self.status,
                status: cmd.status.unwrap_or(self.status),
                occurred_at: cmd.occurred_at,
            })]),
            RentCommand::SyncInvoiceStatus(cmd) => self.handle_sync_invoice_status(cmd),
            RentCommand::UnlinkSalesInvoice(cmd) => {
                Ok(vec![RentEvent::SalesInvoiceUnlinked(SalesInvoiceUnlinked {
                    rent_id: cmd.rent_id.clone(),
                    sales_invoice: self.sales_invoice.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            RentCommand::LinkStockEntry(cmd) => {
                Ok(vec![RentEvent::StockEntryLinked(StockEntryLinked {
                    rent_id: cmd.rent_id.clone(),
                    stock_entry: cmd.stock_entry.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            RentCommand::UnlinkStockEntry(cmd) => self.handle_unlink_stock_entry(cmd),
            RentCommand::ResetStatus(cmd) => Ok(vec![RentEvent::StatusReset(StatusReset {
                rent_id: cmd.rent_id.clone(),
                previous_status: self.status,
                occurred_at: cmd.occurred_at,
            })]),
        }
    }
}

impl Rent {
    fn ensure_rent_id(&self, rent_id: &RentId) -> Result<(), DomainError> {
        if &self.id != rent_id {
            return Err(DomainError::invariant("rent_id mismatch"));
        }
        Ok(())
    }

    fn handle_sync_invoice_status(
        &self,
        cmd: &SyncInvoiceStatus,
    ) -> Result<Vec<RentEvent>, DomainError> {
        if cmd.invoice_status.trim().is_empty() {
            return Err(DomainError::validation("invoice status cannot be empty"));
        }
        if self.sales_invoice_status.as_deref() == Some(cmd.invoice_status.as_str()) {
            return Ok(vec![]);
        }
        Ok(vec![RentEvent::InvoiceStatusSynced(InvoiceStatusSynced {
            rent_id: cmd.rent_id.clone(),
            invoice_status: cmd.invoice_status.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_unlink_stock_entry(
        &self,
        cmd: &UnlinkStockEntry,
    ) -> Result<Vec<RentEvent>, DomainError> {
        if self.stock_entry.as_ref() != Some(&cmd.stock_entry) {
            return Ok(vec![]);
        }
        Ok(vec![RentEvent::StockEntryUnlinked(StockEntryUnlinked {
            rent_id: cmd.rent_id.clone(),
            stock_entry: cmd.stock_entry.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
