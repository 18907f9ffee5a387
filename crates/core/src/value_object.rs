//! Value objects: equality by value, not identity.

use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects have **no identity**; two instances holding the same values
/// are interchangeable. Once built they are not mutated in place.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A stock quantity (rented, invoiced or returned).
///
/// Host documents store quantities as floats, so this wraps `f64` and rejects
/// non-finite values at construction.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(f64);

impl ValueObject for Quantity {}

impl Quantity {
    pub const ZERO: Quantity = Quantity(0.0);

    pub fn new(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation("quantity must be a finite number"));
        }
        Ok(Self(value))
    }

    /// Build a quantity that must not be negative (e.g. a returned amount).
    pub fn non_negative(value: f64) -> DomainResult<Self> {
        let qty = Self::new(value)?;
        if qty.0 < 0.0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(qty)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// `self - other`, floored at zero.
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Quantity((self.0 - other.0).max(0.0))
    }

    pub fn times(self, factor: i64) -> Quantity {
        Quantity(self.0 * factor as f64)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 - rhs.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, Add::add)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite() {
        assert!(Quantity::new(f64::NAN).is_err());
        assert!(Quantity::new(f64::INFINITY).is_err());
        assert!(Quantity::non_negative(-1.0).is_err());
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = Quantity::new(3.0).unwrap();
        let b = Quantity::new(5.0).unwrap();
        assert_eq!(a.saturating_sub(b), Quantity::ZERO);
        assert_eq!(b.saturating_sub(a).value(), 2.0);
    }

    #[test]
    fn sums_quantities() {
        let total: Quantity = [1.5, 2.5, 6.0]
            .into_iter()
            .map(|v| Quantity::new(v).unwrap())
            .sum();
        assert_eq!(total.value(), 10.0);
    }
}
