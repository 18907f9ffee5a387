//! Return reconciliation rule.
//!
//! Compares what a rent expects back (its time logs) against what settling
//! invoices have returned so far, and derives the rent's status:
//!
//! - every expected item returned in full → `Returned`
//! - otherwise, any expected item returned at all → `Partial Returned`
//! - otherwise → no change
//!
//! Returned quantities for items the rent never lent out are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rentdesk_core::{ItemCode, Quantity};

use crate::rent::{RentStatus, TimeLog};

/// Quantity of one item returned by an invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub item_code: ItemCode,
    pub returned_qty: Quantity,
}

impl ReturnLine {
    pub fn new(item_code: ItemCode, returned_qty: Quantity) -> Self {
        Self {
            item_code,
            returned_qty,
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub expected: BTreeMap<ItemCode, Quantity>,
    pub returned: BTreeMap<ItemCode, Quantity>,
    /// New status to write, or `None` to leave the rent untouched.
    pub status: Option<RentStatus>,
}

impl Reconciliation {
    pub fn is_fully_returned(&self) -> bool {
        self.status == Some(RentStatus::Returned)
    }

    /// Returned quantity for an item (zero when nothing came back).
    pub fn returned_qty(&self, item_code: &ItemCode) -> Quantity {
        self.returned.get(item_code).copied().unwrap_or(Quantity::ZERO)
    }
}

/// Expected quantity per item code, summing repeated time log rows.
pub fn expected_quantities(time_logs: &[TimeLog]) -> BTreeMap<ItemCode, Quantity> {
    let mut expected = BTreeMap::new();
    for log in time_logs {
        *expected.entry(log.item_code.clone()).or_insert(Quantity::ZERO) += log.qty;
    }
    expected
}

/// Returned quantity per item code across any number of invoice lines.
pub fn returned_quantities<'a, I>(lines: I) -> BTreeMap<ItemCode, Quantity>
where
    I: IntoIterator<Item = &'a ReturnLine>,
{
    let mut returned = BTreeMap::new();
    for line in lines {
        *returned.entry(line.item_code.clone()).or_insert(Quantity::ZERO) += line.returned_qty;
    }
    returned
}

/// Decide the rent status from expected vs. returned totals.
pub fn decide_status(
    expected: &BTreeMap<ItemCode, Quantity>,
    returned: &BTreeMap<ItemCode, Quantity>,
) -> Option<RentStatus> {
    let returned_of = |code: &ItemCode| returned.get(code).copied().unwrap_or(Quantity::ZERO);

    let fully_returned = expected
        .iter()
        .all(|(code, expected_qty)| returned_of(code) >= *expected_qty);
    if fully_returned {
        return Some(RentStatus::Returned);
    }

    let any_returned = expected.keys().any(|code| returned_of(code).is_positive());
    if any_returned {
        return Some(RentStatus::PartialReturned);
    }

    None
}

/// Reconcile a rent against its prior settling invoices plus the current one.
///
/// `prior` must already exclude the current invoice and any cancelled ones;
/// `current` is always counted, so the invoice being submitted sees its own
/// lines.
pub fn reconcile(time_logs: &[TimeLog], prior: &[ReturnLine], current: &[ReturnLine]) -> Reconciliation {
    let expected = expected_quantities(time_logs);
    let returned = returned_quantities(prior.iter().chain(current));
    let status = decide_status(&expected, &returned);

    Reconciliation {
        expected,
        returned,
        status,
    }
}
