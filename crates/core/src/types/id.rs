//! Newtype IDs for type-safe record references.
//!
//! Backends hand out identifiers either as JSON numbers (seed data, SQL-backed
//! services) or as strings (document stores). [`RecordId`] keeps whichever
//! form it received so a record round-trips unchanged, and the `define_id!`
//! macro wraps it in per-entity newtypes that cannot be mixed up.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A record identifier as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric identifier (e.g. `1`).
    Number(i64),
    /// String identifier (e.g. `"65f1c2..."`).
    Text(String),
}

impl RecordId {
    /// Whether the identifier carries no value (an empty string).
    ///
    /// Numeric identifiers are never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`RecordId`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversions from `i64`, `&str` and `String`
///
/// # Example
///
/// ```rust
/// # use tally_core::define_id;
/// define_id!(SupplierId);
/// define_id!(InvoiceId);
///
/// let supplier_id = SupplierId::from(1);
/// let invoice_id = InvoiceId::from("inv-1");
///
/// // These are different types, so this won't compile:
/// // let _: SupplierId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::RecordId);

        impl $name {
            /// Wrap a raw record identifier.
            #[must_use]
            pub const fn new(id: $crate::RecordId) -> Self {
                Self(id)
            }

            /// Get the underlying record identifier.
            #[must_use]
            pub const fn as_record_id(&self) -> &$crate::RecordId {
                &self.0
            }

            /// Whether the identifier carries no value.
            #[must_use]
            pub const fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self($crate::RecordId::Number(id))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self($crate::RecordId::Text(id.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self($crate::RecordId::Text(id))
            }
        }
    };
}

define_id!(ProductId);
define_id!(PurchaseId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_keeps_number_form() {
        let id: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(id, ProductId::from(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn test_string_id_keeps_string_form() {
        let id: PurchaseId = serde_json::from_str(r#""65f1c2aa""#).unwrap();
        assert_eq!(id, PurchaseId::from("65f1c2aa"));
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""65f1c2aa""#);
    }

    #[test]
    fn test_number_and_string_forms_are_distinct() {
        assert_ne!(ProductId::from(1), ProductId::from("1"));
        assert_eq!(ProductId::from(1).to_string(), ProductId::from("1").to_string());
    }

    #[test]
    fn test_empty_id() {
        assert!(PurchaseId::from("").is_empty());
        assert!(!PurchaseId::from("p-1").is_empty());
        assert!(!PurchaseId::from(0).is_empty());
    }
}
