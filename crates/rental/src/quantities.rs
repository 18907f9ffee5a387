//! Quantity helpers used while drafting a settling invoice.
//!
//! These back the invoice form: prefill lines with what is still outstanding
//! on the rent, warn when a draft returns more than remains, and convert a
//! remaining quantity into a billable quantity under daily pricing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rentdesk_core::{ItemCode, Quantity};

use crate::reconcile::{ReturnLine, returned_quantities};
use crate::rent::Rent;

/// A time log row that still has quantity outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingItem {
    /// Time log row (`idx`) this line settles.
    pub rent_detail: u32,
    pub item_code: ItemCode,
    pub item_name: String,
    pub rate: u64,
    pub uom: Option<String>,
    pub remaining_qty: Quantity,
}

/// Outstanding quantity per time log row.
///
/// Returns already settled are allocated to rows of the same item in row
/// order; rows that are fully settled are omitted.
pub fn remaining_quantities(rent: &Rent, settled: &[ReturnLine]) -> Vec<RemainingItem> {
    let mut pool = returned_quantities(settled);

    let mut logs: Vec<_> = rent.time_logs().iter().collect();
    logs.sort_by_key(|log| log.idx);

    let mut remaining = Vec::new();
    for log in logs {
        let available = pool.entry(log.item_code.clone()).or_insert(Quantity::ZERO);
        let consumed = if *available >= log.qty {
            log.qty
        } else if available.is_positive() {
            *available
        } else {
            Quantity::ZERO
        };
        *available = available.saturating_sub(consumed);

        let left = log.qty.saturating_sub(consumed);
        if left.is_positive() {
            remaining.push(RemainingItem {
                rent_detail: log.idx,
                item_code: log.item_code.clone(),
                item_name: log.item_name.clone(),
                rate: log.rate,
                uom: log.uom.clone(),
                remaining_qty: left,
            });
        }
    }
    remaining
}

/// A proposed return that exceeds what is still outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityViolation {
    pub item_code: ItemCode,
    pub remaining_qty: Quantity,
    pub requested_qty: Quantity,
}

/// Result of checking a draft invoice against the rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityCheck {
    pub is_valid: bool,
    pub violations: Vec<QuantityViolation>,
}

/// Check proposed return lines against the rent's outstanding quantities.
///
/// Items the rent never lent out count as having nothing remaining.
pub fn validate_quantities(
    rent: &Rent,
    settled: &[ReturnLine],
    proposed: &[ReturnLine],
) -> QuantityCheck {
    let mut outstanding: BTreeMap<ItemCode, Quantity> = BTreeMap::new();
    for item in remaining_quantities(rent, settled) {
        *outstanding.entry(item.item_code).or_insert(Quantity::ZERO) += item.remaining_qty;
    }

    let violations: Vec<QuantityViolation> = returned_quantities(proposed)
        .into_iter()
        .filter_map(|(item_code, requested_qty)| {
            let remaining_qty = outstanding.get(&item_code).copied().unwrap_or(Quantity::ZERO);
            (requested_qty > remaining_qty).then_some(QuantityViolation {
                item_code,
                remaining_qty,
                requested_qty,
            })
        })
        .collect();

    QuantityCheck {
        is_valid: violations.is_empty(),
        violations,
    }
}

/// Billable quantity under daily pricing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyQuantity {
    pub days: i64,
    pub qty: Quantity,
}

/// Days elapsed from the rental start to the invoice posting date (minimum
/// one day) and the remaining quantity multiplied by those days.
pub fn daily_quantity(remaining: Quantity, rent_date: NaiveDate, posting_date: NaiveDate) -> DailyQuantity {
    // Same-day and backdated postings both bill one day.
    let days = (posting_date - rent_date).num_days().max(1);
    DailyQuantity {
        days,
        qty: remaining.times(days),
    }
}
