//! Strongly-typed record identifiers.
//!
//! The ERP is the system of record; its internal ids are opaque non-empty
//! strings (usually decimal, but we do not rely on that). Newtypes keep
//! order/customer/item ids from being mixed up across the pipeline.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a sales order in the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

/// Identifier of a customer record in the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

/// Identifier of an item (SKU) in the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Identifier of a recurring-order template record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurringOrderId(String);

macro_rules! impl_record_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw ERP internal id.
            ///
            /// Rejects empty/blank ids; everything else is accepted verbatim
            /// (the ERP owns the id format).
            pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, ": empty id")));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
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
    };
}

impl_record_id!(OrderId, "OrderId");
impl_record_id!(CustomerId, "CustomerId");
impl_record_id!(ItemId, "ItemId");
impl_record_id!(RecurringOrderId, "RecurringOrderId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_opaque_ids() {
        let id = OrderId::new("SO-10423").unwrap();
        assert_eq!(id.as_str(), "SO-10423");
        assert_eq!(id.to_string(), "SO-10423");
    }

    #[test]
    fn rejects_blank_ids() {
        assert!(OrderId::new("").is_err());
        assert!(CustomerId::new("   ").is_err());
    }

    #[test]
    fn parses_from_str() {
        let id: ItemId = "2101".parse().unwrap();
        assert_eq!(id.as_str(), "2101");
    }

    #[test]
    fn serde_is_transparent() {
        let id = RecurringOrderId::new("77").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"77\"");
        let back: RecurringOrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
