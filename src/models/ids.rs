//! Strongly-typed ID wrappers for all entity types
//!
//! Using newtype wrappers prevents accidentally mixing up IDs from different
//! entity types at compile time. Account and trade ids are integers so that
//! archives written by earlier versions of the journal keep loading.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::Utc;
use uuid::Uuid;

/// Macro to generate integer ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $inner:ty, $display_prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw id
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Get the underlying value
            pub const fn get(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id!(AccountId, u32, "acc-");
define_id!(TradeId, i64, "trd-");

impl AccountId {
    /// The primary account, which always exists and cannot be deleted
    pub const PRIMARY: AccountId = AccountId(1);

    /// Whether this is the primary account
    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }
}

impl TradeId {
    /// Allocate an id from the current time in milliseconds
    pub fn from_clock() -> Self {
        Self(Utc::now().timestamp_millis())
    }
}

/// Externally-stable trade identifier used to name archived images
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeUid(String);

impl TradeUid {
    /// Generate a fresh uid of the form `trade_<millis>_<9 chars>`
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "trade_{}_{}",
            Utc::now().timestamp_millis(),
            &suffix[..9]
        ))
    }

    /// The uid assigned to records that predate uids
    pub fn legacy(id: TradeId) -> Self {
        Self(format!("trade_{}", id.get()))
    }

    /// Wrap an existing uid string
    pub fn from_string(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty uid some legacy exports carry
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TradeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_account() {
        assert!(AccountId::new(1).is_primary());
        assert!(!AccountId::new(2).is_primary());
    }

    #[test]
    fn test_id_parse_with_prefix() {
        assert_eq!("acc-7".parse::<AccountId>().unwrap(), AccountId::new(7));
        assert_eq!("7".parse::<AccountId>().unwrap(), AccountId::new(7));
        assert!("seven".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_id_serialization_is_transparent() {
        let id = TradeId::new(1714550400000);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "1714550400000");
        let deserialized: TradeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_generated_uid_shape() {
        let uid = TradeUid::generate();
        let parts: Vec<&str> = uid.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "trade");
        assert_eq!(parts[2].len(), 9);
        assert_ne!(uid, TradeUid::generate());
    }

    #[test]
    fn test_legacy_uid() {
        assert_eq!(TradeUid::legacy(TradeId::new(42)).as_str(), "trade_42");
    }
}
