//! Boundary serialization for the presentation layer.
//!
//! Internal arithmetic stays in fixed-point [`Money`](crate::money::Money);
//! the conversion to plain floats happens here, at the edge, and nowhere
//! else.

use crate::account::{Account, AccountKind};
use crate::transaction::{Transaction, TxKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// An account as handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct AccountPayload {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub balance: f64,
    pub is_default: bool,
}

impl From<&Account> for AccountPayload {
    fn from(account: &Account) -> Self {
        AccountPayload {
            id: account.id,
            name: account.name.clone(),
            kind: account.kind,
            balance: account.balance.to_f64(),
            is_default: account.is_default,
        }
    }
}

/// A transaction as handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionPayload {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TxKind,
    pub amount: f64,
    pub posted_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionPayload {
    fn from(tx: &Transaction) -> Self {
        TransactionPayload {
            id: tx.id,
            account_id: tx.account_id,
            kind: tx.kind,
            amount: tx.amount.to_f64(),
            posted_at: tx.posted_at,
        }
    }
}

/// Uniform result payload for the balance-mutating operations.
///
/// These operations never raise: callers check `success` instead of
/// catching errors. On success, `stale_accounts` lists the account ids
/// whose cached dashboard and detail views must be refetched.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale_accounts: Vec<Uuid>,
}

impl MutationOutcome {
    /// A successful outcome touching the given accounts.
    pub fn ok(stale_accounts: Vec<Uuid>) -> Self {
        MutationOutcome {
            success: true,
            error: None,
            stale_accounts,
        }
    }

    /// A failed outcome carrying the error message. Pre-call state is
    /// guaranteed intact.
    pub fn failed(error: impl fmt::Display) -> Self {
        MutationOutcome {
            success: false,
            error: Some(error.to_string()),
            stale_accounts: Vec::new(),
        }
    }
}
