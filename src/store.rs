//! SQLite-backed persistent store.
//!
//! Owns the schema, row mapping, and the low-level queries the engine
//! composes. Multi-step mutations run inside `rusqlite` transactions
//! obtained from [`Store::transaction`]; a transaction that is dropped
//! without commit rolls back, so an aborted unit leaves no trace.
//!
//! Decimals and uuids are stored as TEXT. Balances in particular must
//! round-trip without precision loss, which REAL columns cannot guarantee.

use crate::account::{Account, AccountKind};
use crate::error::Result;
use crate::money::Money;
use crate::transaction::{Transaction, TxKind};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// An application user, mirrored from the external identity provider.
///
/// `external_id` is the stable id the provider reports for a session;
/// every core operation maps it to this row before touching any data.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    name       TEXT NOT NULL,
    kind       TEXT NOT NULL,
    balance    TEXT NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

CREATE TABLE IF NOT EXISTS transactions (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    account_id TEXT NOT NULL REFERENCES accounts(id),
    kind       TEXT NOT NULL,
    amount     TEXT NOT NULL,
    posted_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
";

/// Handle to the dashboard database.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a fresh in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    /// Begins an atomic unit. Commits only via
    /// [`rusqlite::Transaction::commit`]; dropping rolls back.
    pub(crate) fn transaction(&mut self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Inserts the mirror row for an identity-provider user.
    pub fn insert_user(&self, external_id: &str, name: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            name: name.to_string(),
        };
        self.conn.execute(
            "INSERT INTO users (id, external_id, name) VALUES (?1, ?2, ?3)",
            params![user.id.to_string(), user.external_id, user.name],
        )?;
        Ok(user)
    }

    /// Looks up a user by the identity provider's stable id.
    pub fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, external_id, name FROM users WHERE external_id = ?1",
                params![external_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Loads one of `user_id`'s accounts, or `None` if the account does
    /// not exist or belongs to someone else.
    pub fn account(&self, user_id: Uuid, account_id: Uuid) -> Result<Option<Account>> {
        load_account(&self.conn, user_id, account_id)
    }

    /// All accounts owned by `user_id`, ordered by name.
    pub fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, kind, balance, is_default
             FROM accounts WHERE user_id = ?1 ORDER BY name, id",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], account_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Transactions posted against one of `user_id`'s accounts, newest first.
    pub fn transactions_for_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, account_id, kind, amount, posted_at
             FROM transactions WHERE user_id = ?1 AND account_id = ?2
             ORDER BY posted_at DESC, id",
        )?;
        let rows = stmt.query_map(
            params![user_id.to_string(), account_id.to_string()],
            transaction_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Runs raw SQL against the underlying connection, for test fixtures
    /// such as fault-injection triggers.
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

// In-transaction helpers. `rusqlite::Transaction` derefs to `Connection`,
// so these serve both plain reads and the engine's atomic units.

pub(crate) fn load_account(
    conn: &Connection,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, user_id, name, kind, balance, is_default
             FROM accounts WHERE id = ?1 AND user_id = ?2",
            params![account_id.to_string(), user_id.to_string()],
            account_from_row,
        )
        .optional()?;
    Ok(account)
}

pub(crate) fn count_accounts(conn: &Connection, user_id: Uuid) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Phase one of the default-account protocol: drop every default flag the
/// user currently holds. Returns the number of rows cleared.
pub(crate) fn clear_default_flags(conn: &Connection, user_id: Uuid) -> Result<usize> {
    let cleared = conn.execute(
        "UPDATE accounts SET is_default = 0 WHERE user_id = ?1 AND is_default = 1",
        params![user_id.to_string()],
    )?;
    Ok(cleared)
}

/// Phase two: set the flag on the named account. Only ever called after
/// [`clear_default_flags`] inside the same transaction.
pub(crate) fn mark_default(conn: &Connection, account_id: Uuid) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET is_default = 1 WHERE id = ?1",
        params![account_id.to_string()],
    )?;
    Ok(())
}

pub(crate) fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (id, user_id, name, kind, balance, is_default)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account.id.to_string(),
            account.user_id.to_string(),
            account.name,
            account.kind.as_str(),
            account.balance.to_string(),
            account.is_default,
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions (id, user_id, account_id, kind, amount, posted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tx.id.to_string(),
            tx.user_id.to_string(),
            tx.account_id.to_string(),
            tx.kind.as_str(),
            tx.amount.to_string(),
            tx.posted_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Loads exactly the transactions whose id is in `ids` AND whose owner is
/// `user_id`. Duplicate ids are read once; ids that are unknown or owned
/// by another user are silently excluded.
pub(crate) fn load_owned_transactions(
    conn: &Connection,
    user_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, account_id, kind, amount, posted_at
         FROM transactions WHERE id = ?1 AND user_id = ?2",
    )?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if !seen.insert(*id) {
            continue;
        }
        let found = stmt
            .query_row(
                params![id.to_string(), user_id.to_string()],
                transaction_from_row,
            )
            .optional()?;
        if let Some(tx) = found {
            out.push(tx);
        }
    }
    Ok(out)
}

pub(crate) fn delete_transaction(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute(
        "DELETE FROM transactions WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

/// Increments an account balance by `delta` using exact decimal addition:
/// the TEXT balance is read, adjusted in fixed point, and written back
/// within the caller's transaction.
pub(crate) fn adjust_balance(conn: &Connection, account_id: Uuid, delta: Money) -> Result<()> {
    let text: String = conn.query_row(
        "SELECT balance FROM accounts WHERE id = ?1",
        params![account_id.to_string()],
        |row| row.get(0),
    )?;
    let balance = parse_col::<Money>(0, &text)?;

    conn.execute(
        "UPDATE accounts SET balance = ?1 WHERE id = ?2",
        params![(balance + delta).to_string(), account_id.to_string()],
    )?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_col(0, &row.get::<_, String>(0)?)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: parse_col(0, &row.get::<_, String>(0)?)?,
        user_id: parse_col(1, &row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        kind: parse_col::<AccountKind>(3, &row.get::<_, String>(3)?)?,
        balance: parse_col::<Money>(4, &row.get::<_, String>(4)?)?,
        is_default: row.get(5)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: parse_col(0, &row.get::<_, String>(0)?)?,
        user_id: parse_col(1, &row.get::<_, String>(1)?)?,
        account_id: parse_col(2, &row.get::<_, String>(2)?)?,
        kind: parse_col::<TxKind>(3, &row.get::<_, String>(3)?)?,
        amount: parse_col::<Money>(4, &row.get::<_, String>(4)?)?,
        posted_at: parse_col::<DateTime<Utc>>(5, &row.get::<_, String>(5)?)?,
    })
}

/// Parses a TEXT column into a typed value, reporting failures through
/// rusqlite's conversion error so they surface as storage faults.
fn parse_col<T>(idx: usize, text: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
