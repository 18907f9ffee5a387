//! Strongly-typed document names used across the domain.
//!
//! Host documents are identified by human-readable names (e.g. `RENT-0001`,
//! `ACC-SINV-2024-00012`) rather than UUIDs, so every identifier here wraps a
//! non-empty, trimmed string.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Name of a Rent document (rental agreement).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RentId(String);

/// Name of a Sales Invoice document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesInvoiceId(String);

/// Name of a Stock Entry document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockEntryId(String);

/// Item master code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

/// Customer (party) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

/// Warehouse name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(String);

/// Cost center name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostCenterId(String);

macro_rules! impl_name_newtype {
    ($t:ty, $label:literal) => {
        impl $t {
            /// Build a name, rejecting blank input.
            pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
                let name = name.into();
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_name(concat!($label, " cannot be empty")));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_name_newtype!(RentId, "RentId");
impl_name_newtype!(SalesInvoiceId, "SalesInvoiceId");
impl_name_newtype!(StockEntryId, "StockEntryId");
impl_name_newtype!(ItemCode, "ItemCode");
impl_name_newtype!(CustomerId, "CustomerId");
impl_name_newtype!(WarehouseId, "WarehouseId");
impl_name_newtype!(CostCenterId, "CostCenterId");
