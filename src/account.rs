//! Account model and account-creation request parsing.

use crate::error::{LedgerError, Result};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of financial account tracked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Everyday checking account.
    Current,

    /// Savings account.
    Savings,
}

impl AccountKind {
    /// Canonical lowercase name, used for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Current => "current",
            AccountKind::Savings => "savings",
        }
    }
}

impl FromStr for AccountKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(AccountKind::Current),
            "savings" => Ok(AccountKind::Savings),
            other => Err(LedgerError::InvalidArgument {
                field: "kind",
                message: format!("expected current or savings, got {:?}", other),
            }),
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's financial account.
///
/// # Invariants
///
/// - `balance` is a cached aggregate: it equals the signed sum of the
///   account's transactions (income positive, expense negative) between
///   write transactions. Only the engine's mutation paths may touch it.
/// - Per user, exactly one account carries `is_default = true` once the
///   user owns any account at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
    pub is_default: bool,
}

/// Raw account-creation form data as submitted by the caller.
///
/// Field values arrive as plain strings; [`parse`](AccountRequest::parse)
/// validates them into a typed [`NewAccount`].
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRequest {
    pub name: String,
    pub kind: String,
    pub balance: String,

    /// Requested default flag. May be overridden by the first-account rule.
    #[serde(default)]
    pub is_default: bool,
}

impl AccountRequest {
    /// Validates the raw form data.
    ///
    /// Fails with `InvalidArgument` on an empty name, an unknown account
    /// kind, or a non-numeric opening balance.
    pub fn parse(&self) -> Result<NewAccount> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidArgument {
                field: "name",
                message: "must not be empty".to_string(),
            });
        }

        let kind = self.kind.parse::<AccountKind>()?;

        let balance =
            Money::from_str(&self.balance).map_err(|_| LedgerError::InvalidArgument {
                field: "balance",
                message: format!("not a number: {:?}", self.balance),
            })?;

        Ok(NewAccount {
            name: name.to_string(),
            kind,
            balance,
            is_default: self.is_default,
        })
    }
}

/// A validated account-creation request.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
    pub is_default: bool,
}
