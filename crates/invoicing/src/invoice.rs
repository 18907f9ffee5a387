use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rentdesk_core::{
    CostCenterId, CustomerId, DocStatus, Document, DomainError, ItemCode, Quantity, RentId,
    SalesInvoiceId, WarehouseId,
};
use rentdesk_rental::ReturnLine;

/// Payment/workflow status text shown on the invoice (independent of docstatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Unpaid,
    #[serde(rename = "Partly Paid")]
    PartlyPaid,
    Paid,
    Overdue,
    Return,
    #[serde(rename = "Credit Note Issued")]
    CreditNoteIssued,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::PartlyPaid => "Partly Paid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Return => "Return",
            InvoiceStatus::CreditNoteIssued => "Credit Note Issued",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice line. `rent_qty` is the quantity of the rented item returned with
/// this invoice; `qty` is the billed quantity (which differs under daily pricing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInvoiceItem {
    pub item_code: ItemCode,
    pub item_name: String,
    pub qty: Quantity,
    /// Price in smallest currency unit (e.g., cents).
    pub rate: u64,
    pub rent_qty: Quantity,
    /// Time log row on the rent this line settles, when prefilled from it.
    pub rent_detail: Option<u32>,
    #[serde(default)]
    pub uom: Option<String>,
    /// Billed days under daily pricing (`qty = rent_qty * days`).
    #[serde(default)]
    pub days: Option<i64>,
}

/// Sales Invoice document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInvoice {
    name: SalesInvoiceId,
    rent: Option<RentId>,
    customer: CustomerId,
    posting_date: NaiveDate,
    cost_center: Option<CostCenterId>,
    from_warehouse: Option<WarehouseId>,
    to_warehouse: Option<WarehouseId>,
    status: InvoiceStatus,
    docstatus: DocStatus,
    items: Vec<SalesInvoiceItem>,
}

impl SalesInvoice {
    /// Create a draft invoice.
    pub fn new(
        name: SalesInvoiceId,
        customer: CustomerId,
        posting_date: NaiveDate,
        items: Vec<SalesInvoiceItem>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::validation("cannot create invoice without items"));
        }

        Ok(Self {
            name,
            rent: None,
            customer,
            posting_date,
            cost_center: None,
            from_warehouse: None,
            to_warehouse: None,
            status: InvoiceStatus::Draft,
            docstatus: DocStatus::Draft,
            items,
        })
    }

    pub fn with_rent(mut self, rent: RentId) -> Self {
        self.rent = Some(rent);
        self
    }

    pub fn with_cost_center(mut self, cost_center: CostCenterId) -> Self {
        self.cost_center = Some(cost_center);
        self
    }

    pub fn with_warehouses(mut self, from: WarehouseId, to: WarehouseId) -> Self {
        self.from_warehouse = Some(from);
        self.to_warehouse = Some(to);
        self
    }

    pub fn name(&self) -> &SalesInvoiceId {
        &self.name
    }

    pub fn rent(&self) -> Option<&RentId> {
        self.rent.as_ref()
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn posting_date(&self) -> NaiveDate {
        self.posting_date
    }

    pub fn cost_center(&self) -> Option<&CostCenterId> {
        self.cost_center.as_ref()
    }

    pub fn from_warehouse(&self) -> Option<&WarehouseId> {
        self.from_warehouse.as_ref()
    }

    pub fn to_warehouse(&self) -> Option<&WarehouseId> {
        self.to_warehouse.as_ref()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn docstatus(&self) -> DocStatus {
        self.docstatus
    }

    pub fn items(&self) -> &[SalesInvoiceItem] {
        &self.items
    }

    /// Whether this invoice belongs to `rent`.
    pub fn settles(&self, rent: &RentId) -> bool {
        self.rent.as_ref() == Some(rent)
    }

    /// Returned quantity per line, as consumed by reconciliation.
    pub fn return_lines(&self) -> Vec<ReturnLine> {
        self.items
            .iter()
            .map(|item| ReturnLine::new(item.item_code.clone(), item.rent_qty))
            .collect()
    }

    /// Draft → Submitted; the status text moves to Unpaid.
    pub fn submit(&mut self) -> Result<(), DomainError> {
        self.docstatus = self.docstatus.submit()?;
        self.status = InvoiceStatus::Unpaid;
        Ok(())
    }

    /// Submitted → Cancelled.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.docstatus = self.docstatus.cancel()?;
        self.status = InvoiceStatus::Cancelled;
        Ok(())
    }

    /// Update the status text of a submitted invoice (payments, returns).
    pub fn set_status(&mut self, status: InvoiceStatus) -> Result<(), DomainError> {
        if !self.docstatus.is_submitted() {
            return Err(DomainError::invariant(
                "status can only change on a submitted invoice",
            ));
        }
        if matches!(status, InvoiceStatus::Draft | InvoiceStatus::Cancelled) {
            return Err(DomainError::validation(format!(
                "status {status} is driven by docstatus"
            )));
        }
        self.status = status;
        Ok(())
    }
}

impl Document for SalesInvoice {
    const DOCTYPE: &'static str = "Sales Invoice";

    type Id = SalesInvoiceId;

    fn name(&self) -> &Self::Id {
        &self.name
    }

    fn docstatus(&self) -> DocStatus {
        self.docstatus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, rent_qty: f64) -> SalesInvoiceItem {
        SalesInvoiceItem {
            item_code: ItemCode::new(code).unwrap(),
            item_name: code.to_string(),
            qty: Quantity::new(rent_qty).unwrap(),
            rate: 100,
            rent_qty: Quantity::new(rent_qty).unwrap(),
            rent_detail: None,
            uom: None,
            days: None,
        }
    }

    fn draft() -> SalesInvoice {
        SalesInvoice::new(
            SalesInvoiceId::new("SINV-0001").unwrap(),
            CustomerId::new("Acme").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            vec![item("ItemA", 4.0), item("ItemB", 1.0)],
        )
        .unwrap()
        .with_rent(RentId::new("RENT-0001").unwrap())
    }

    #[test]
    fn invoice_requires_items() {
        let err = SalesInvoice::new(
            SalesInvoiceId::new("SINV-0002").unwrap(),
            CustomerId::new("Acme").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn return_lines_carry_rent_qty() {
        let inv = draft();
        let lines = inv.return_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].item_code.as_str(), "ItemA");
        assert_eq!(lines[0].returned_qty.value(), 4.0);
        assert!(inv.settles(&RentId::new("RENT-0001").unwrap()));
    }

    #[test]
    fn submit_then_cancel_follows_docstatus() {
        let mut inv = draft();
        inv.submit().unwrap();
        assert_eq!(inv.docstatus(), DocStatus::Submitted);
        assert_eq!(inv.status(), InvoiceStatus::Unpaid);

        inv.set_status(InvoiceStatus::Paid).unwrap();
        assert_eq!(inv.status().to_string(), "Paid");

        inv.cancel().unwrap();
        assert_eq!(inv.docstatus(), DocStatus::Cancelled);
        assert!(inv.cancel().is_err());
    }

    #[test]
    fn status_changes_need_a_submitted_invoice() {
        let mut inv = draft();
        assert!(inv.set_status(InvoiceStatus::Paid).is_err());
        inv.submit().unwrap();
        assert!(inv.set_status(InvoiceStatus::Cancelled).is_err());
    }

    #[test]
    fn status_uses_host_labels() {
        assert_eq!(
            serde_json::to_value(InvoiceStatus::PartlyPaid).unwrap(),
            serde_json::json!("Partly Paid")
        );
    }
}
