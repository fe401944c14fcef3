//! Transaction model and per-kind signed-amount rules.

use crate::error::LedgerError;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Direction of a transaction relative to its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Money entering the account.
    Income,

    /// Money leaving the account.
    Expense,
}

impl TxKind {
    /// Canonical lowercase name, used for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }

    /// Signed contribution of a transaction of this kind to its account
    /// balance: `+amount` for income, `-amount` for expense.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            TxKind::Income => amount,
            TxKind::Expense => -amount,
        }
    }

    /// Balance adjustment that undoes a transaction of this kind, applied
    /// when the transaction is deleted. The exact inverse of [`signed`]:
    /// deleting an expense gives the money back, deleting an income takes
    /// it away.
    ///
    /// [`signed`]: TxKind::signed
    pub fn reversal(self, amount: Money) -> Money {
        match self {
            TxKind::Income => -amount,
            TxKind::Expense => amount,
        }
    }
}

impl FromStr for TxKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            other => Err(LedgerError::InvalidArgument {
                field: "kind",
                message: format!("expected income or expense, got {:?}", other),
            }),
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single posted transaction.
///
/// Belongs to exactly one account; `user_id` always matches the owning
/// user of that account. `amount` is stored as a non-negative magnitude,
/// with direction carried by `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub kind: TxKind,
    pub amount: Money,
    pub posted_at: DateTime<Utc>,
}
