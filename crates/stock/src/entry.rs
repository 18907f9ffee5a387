use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rentdesk_core::{
    CostCenterId, CustomerId, DocStatus, Document, DomainError, ItemCode, Quantity, RentId,
    SalesInvoiceId, StockEntryId, WarehouseId,
};
use rentdesk_invoicing::SalesInvoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StockEntryType {
    #[default]
    #[serde(rename = "Material Transfer")]
    MaterialTransfer,
    #[serde(rename = "Material Receipt")]
    MaterialReceipt,
    #[serde(rename = "Material Issue")]
    MaterialIssue,
}

impl StockEntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            StockEntryType::MaterialTransfer => "Material Transfer",
            StockEntryType::MaterialReceipt => "Material Receipt",
            StockEntryType::MaterialIssue => "Material Issue",
        }
    }
}

impl core::str::FromStr for StockEntryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Material Transfer" => Ok(StockEntryType::MaterialTransfer),
            "Material Receipt" => Ok(StockEntryType::MaterialReceipt),
            "Material Issue" => Ok(StockEntryType::MaterialIssue),
            other => Err(DomainError::validation(format!(
                "unknown stock entry type '{other}'"
            ))),
        }
    }
}

/// One moved item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntryDetail {
    pub item_code: ItemCode,
    pub item_name: String,
    pub qty: Quantity,
    pub customer: Option<CustomerId>,
    pub cost_center: Option<CostCenterId>,
}

/// Stock Entry document.
///
/// When created from a settling invoice it is a derived record: it exists
/// only while the invoice stays submitted, and points back at both the
/// invoice and the rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    name: StockEntryId,
    stock_entry_type: StockEntryType,
    transaction_date: NaiveDate,
    customer: Option<CustomerId>,
    rent: Option<RentId>,
    sales_invoice: Option<SalesInvoiceId>,
    from_warehouse: Option<WarehouseId>,
    to_warehouse: Option<WarehouseId>,
    docstatus: DocStatus,
    items: Vec<StockEntryDetail>,
}

impl StockEntry {
    /// Build the draft mirror of a settling invoice: one detail per invoice
    /// line, moving the line's returned quantity.
    pub fn mirror_of(
        name: StockEntryId,
        stock_entry_type: StockEntryType,
        invoice: &SalesInvoice,
    ) -> Result<Self, DomainError> {
        let rent = invoice
            .rent()
            .cloned()
            .ok_or_else(|| DomainError::invariant("cannot mirror an invoice without a rent"))?;

        let customer = invoice.customer().clone();
        let items = invoice
            .items()
            .iter()
            .map(|line| StockEntryDetail {
                item_code: line.item_code.clone(),
                item_name: line.item_name.clone(),
                qty: line.rent_qty,
                customer: Some(customer.clone()),
                cost_center: invoice.cost_center().cloned(),
            })
            .collect();

        Ok(Self {
            name,
            stock_entry_type,
            transaction_date: invoice.posting_date(),
            customer: Some(customer),
            rent: Some(rent),
            sales_invoice: Some(invoice.name().clone()),
            from_warehouse: invoice.from_warehouse().cloned(),
            to_warehouse: invoice.to_warehouse().cloned(),
            docstatus: DocStatus::Draft,
            items,
        })
    }

    pub fn name(&self) -> &StockEntryId {
        &self.name
    }

    pub fn stock_entry_type(&self) -> StockEntryType {
        self.stock_entry_type
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_date
    }

    pub fn customer(&self) -> Option<&CustomerId> {
        self.customer.as_ref()
    }

    pub fn rent(&self) -> Option<&RentId> {
        self.rent.as_ref()
    }

    pub fn sales_invoice(&self) -> Option<&SalesInvoiceId> {
        self.sales_invoice.as_ref()
    }

    pub fn from_warehouse(&self) -> Option<&WarehouseId> {
        self.from_warehouse.as_ref()
    }

    pub fn to_warehouse(&self) -> Option<&WarehouseId> {
        self.to_warehouse.as_ref()
    }

    pub fn docstatus(&self) -> DocStatus {
        self.docstatus
    }

    pub fn items(&self) -> &[StockEntryDetail] {
        &self.items
    }

    /// Whether this entry mirrors `invoice` and is still live.
    pub fn mirrors(&self, invoice: &SalesInvoiceId) -> bool {
        self.docstatus.is_submitted() && self.sales_invoice.as_ref() == Some(invoice)
    }

    pub fn submit(&mut self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::validation("cannot submit a stock entry without items"));
        }
        self.docstatus = self.docstatus.submit()?;
        Ok(())
    }

    /// Drop the link to the rent (and its customer) so the rent can be
    /// settled again without this movement.
    pub fn unlink_rent(&mut self) {
        self.rent = None;
        self.customer = None;
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.docstatus = self.docstatus.cancel()?;
        Ok(())
    }
}

impl Document for StockEntry {
    const DOCTYPE: &'static str = "Stock Entry";

    type Id = StockEntryId;

    fn name(&self) -> &Self::Id {
        &self.name
    }

    fn docstatus(&self) -> DocStatus {
        self.docstatus
    }
}
