//! Account model
//!
//! Represents a trading account: a named balance that risk is sized against.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;

/// Name given to the primary account when storage is first created
pub const PRIMARY_ACCOUNT_NAME: &str = "Main Account";

/// A trading account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Futures")
    pub name: String,

    /// Current balance
    #[serde(default)]
    pub balance: f64,
}

impl Account {
    /// Create a new account
    pub fn new(id: AccountId, name: impl Into<String>, balance: f64) -> Self {
        Self {
            id,
            name: name.into(),
            balance: round_cents(balance),
        }
    }

    /// The account that always exists
    pub fn primary() -> Self {
        Self::new(AccountId::PRIMARY, PRIMARY_ACCOUNT_NAME, 0.0)
    }

    /// Whether this is the undeletable primary account
    pub fn is_primary(&self) -> bool {
        self.id.is_primary()
    }

    /// Replace the balance, rounded to cents
    pub fn set_balance(&mut self, balance: f64) {
        self.balance = round_cents(balance);
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        if !self.balance.is_finite() || self.balance < 0.0 {
            return Err(AccountValidationError::InvalidBalance(self.balance));
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Round an amount to two decimal places
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidBalance(f64),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
            Self::InvalidBalance(balance) => write!(f, "Invalid balance: {}", balance),
        }
    }
}

impl std::error::Error for AccountValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_rounds_balance() {
        let account = Account::new(AccountId::new(2), "Futures", 1234.567);
        assert_eq!(account.balance, 1234.57);
        assert!(!account.is_primary());
    }

    #[test]
    fn test_primary() {
        let account = Account::primary();
        assert!(account.is_primary());
        assert_eq!(account.name, PRIMARY_ACCOUNT_NAME);
    }

    #[test]
    fn test_validation() {
        let mut account = Account::new(AccountId::new(2), "Valid Name", 10.0);
        assert!(account.validate().is_ok());

        account.name = String::new();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));

        account.name = "a".repeat(101);
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::NameTooLong(_))
        ));

        account.name = "Spot".into();
        account.balance = f64::NAN;
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let account = Account::new(AccountId::new(3), "Spot", 500.0);
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Spot");
        assert_eq!(json["balance"], 500.0);
    }
}
