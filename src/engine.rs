//! The dashboard core engine.
//!
//! Exposes the account and transaction mutations the presentation layer
//! calls into. Every mutation performs its reads and writes inside a
//! single storage transaction, so concurrent callers are serialized by
//! SQLite's isolation and an aborted unit leaves no observable change.
//!
//! Two invariants are owned here:
//!
//! - an account's cached `balance` always reflects the signed sum of its
//!   postings (bulk deletion reverses every deleted posting exactly),
//! - a user with at least one account has exactly one default account,
//!   enforced by a clear-then-set protocol. No other code path may write
//!   the default flag.

use crate::account::{Account, AccountRequest};
use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::money::Money;
use crate::payload::{AccountPayload, MutationOutcome, TransactionPayload};
use crate::store::{self, Store, User};
use crate::transaction::{Transaction, TxKind};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::Write;
use uuid::Uuid;

/// The ledger engine, front door for all dashboard mutations.
pub struct Engine {
    store: Store,
}

impl Engine {
    /// Creates an engine over an opened store.
    pub fn new(store: Store) -> Self {
        Engine { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Maps the identity provider's session to the internal user row.
    ///
    /// A missing session fails `Unauthenticated`; a session with no mirror
    /// row fails `NotFound`.
    fn require_caller(&self, session: Option<&str>) -> Result<User> {
        let external_id = session.ok_or(LedgerError::Unauthenticated)?;
        self.store
            .find_user_by_external_id(external_id)?
            .ok_or(LedgerError::NotFound("user"))
    }

    /// Registers the mirror row for an identity-provider user.
    pub fn add_user(&self, external_id: &str, name: &str) -> Result<User> {
        let user = self.store.insert_user(external_id, name)?;
        info!("registered user {} ({})", user.id, user.external_id);
        Ok(user)
    }

    /// Creates an account for the caller.
    ///
    /// The user's first account is always made the default, whatever the
    /// request says; otherwise the requested flag is honored. When the new
    /// account becomes the default, existing flags are cleared in the same
    /// atomic unit as the insert.
    pub fn create_account(
        &mut self,
        session: Option<&str>,
        request: &AccountRequest,
    ) -> Result<AccountPayload> {
        let user = self.require_caller(session)?;
        let new = request.parse()?;

        let tx = self.store.transaction()?;
        let existing = store::count_accounts(&tx, user.id)?;
        let is_default = existing == 0 || new.is_default;
        if is_default {
            store::clear_default_flags(&tx, user.id)?;
        }
        let account = Account {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: new.name,
            kind: new.kind,
            balance: new.balance,
            is_default,
        };
        store::insert_account(&tx, &account)?;
        tx.commit()?;

        info!(
            "created {} account {} for user {}",
            account.kind, account.id, user.id
        );
        Ok(AccountPayload::from(&account))
    }

    /// Promotes `account_id` to the caller's default account.
    ///
    /// Returns the uniform outcome payload; failures (including a foreign
    /// or unknown account) are reported through it rather than raised.
    /// Naming the account that is already default is a legal no-op.
    pub fn set_default_account(
        &mut self,
        session: Option<&str>,
        account_id: Uuid,
    ) -> MutationOutcome {
        match self.switch_default(session, account_id) {
            Ok(stale) => MutationOutcome::ok(stale),
            Err(e) => {
                warn!("set_default_account: {}", e);
                MutationOutcome::failed(e)
            }
        }
    }

    fn switch_default(&mut self, session: Option<&str>, account_id: Uuid) -> Result<Vec<Uuid>> {
        let user = self.require_caller(session)?;

        let tx = self.store.transaction()?;
        let account = store::load_account(&tx, user.id, account_id)?
            .ok_or(LedgerError::NotFound("account"))?;
        // Two phases, one unit: no observer sees zero or two defaults.
        store::clear_default_flags(&tx, user.id)?;
        store::mark_default(&tx, account.id)?;
        tx.commit()?;

        debug!("user {} default account is now {}", user.id, account_id);
        Ok(vec![account_id])
    }

    /// Deletes the caller's transactions named in `ids` and recomputes
    /// every affected account balance, all in one atomic unit.
    ///
    /// Ids that are unknown or belong to another user are silently
    /// excluded: they are never deleted and never contribute a balance
    /// change. Duplicates are tolerated; an empty resolution is a no-op
    /// success. On success the outcome lists the touched account ids.
    pub fn bulk_delete_transactions(
        &mut self,
        session: Option<&str>,
        ids: &[Uuid],
    ) -> MutationOutcome {
        match self.delete_and_rebalance(session, ids) {
            Ok(stale) => MutationOutcome::ok(stale),
            Err(e) => {
                warn!("bulk_delete_transactions: {}", e);
                MutationOutcome::failed(e)
            }
        }
    }

    fn delete_and_rebalance(&mut self, session: Option<&str>, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let user = self.require_caller(session)?;

        let tx = self.store.transaction()?;
        let owned = store::load_owned_transactions(&tx, user.id, ids)?;

        let requested: HashSet<_> = ids.iter().collect();
        if owned.len() < requested.len() {
            debug!(
                "user {}: skipping {} transaction ids that did not resolve",
                user.id,
                requested.len() - owned.len()
            );
        }

        let deltas = ledger::reversal_deltas(&owned);
        for record in &owned {
            store::delete_transaction(&tx, record.id)?;
        }
        for (account_id, delta) in &deltas {
            store::adjust_balance(&tx, *account_id, *delta)?;
        }
        tx.commit()?;

        debug!(
            "user {}: deleted {} transactions across {} accounts",
            user.id,
            owned.len(),
            deltas.len()
        );
        Ok(deltas.keys().copied().collect())
    }

    /// Posts a transaction against one of the caller's accounts and applies
    /// its signed amount to the cached balance in the same atomic unit.
    pub fn record_transaction(
        &mut self,
        session: Option<&str>,
        account_id: Uuid,
        kind: TxKind,
        amount: Money,
        posted_at: DateTime<Utc>,
    ) -> Result<TransactionPayload> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidArgument {
                field: "amount",
                message: "must not be negative".to_string(),
            });
        }
        let user = self.require_caller(session)?;

        let tx = self.store.transaction()?;
        let account = store::load_account(&tx, user.id, account_id)?
            .ok_or(LedgerError::NotFound("account"))?;
        let record = Transaction {
            id: Uuid::new_v4(),
            user_id: user.id,
            account_id: account.id,
            kind,
            amount,
            posted_at,
        };
        store::insert_transaction(&tx, &record)?;
        store::adjust_balance(&tx, account.id, kind.signed(amount))?;
        tx.commit()?;

        debug!("posted {} {} to account {}", kind, amount, account_id);
        Ok(TransactionPayload::from(&record))
    }

    /// All of the caller's accounts, for the dashboard view.
    pub fn account_overview(&self, session: Option<&str>) -> Result<Vec<AccountPayload>> {
        let user = self.require_caller(session)?;
        let accounts = self.store.accounts_for_user(user.id)?;
        Ok(accounts.iter().map(AccountPayload::from).collect())
    }

    /// One account plus its transactions, newest first.
    pub fn account_statement(
        &self,
        session: Option<&str>,
        account_id: Uuid,
    ) -> Result<(AccountPayload, Vec<TransactionPayload>)> {
        let user = self.require_caller(session)?;
        let account = self
            .store
            .account(user.id, account_id)?
            .ok_or(LedgerError::NotFound("account"))?;
        let transactions = self.store.transactions_for_account(user.id, account_id)?;
        Ok((
            AccountPayload::from(&account),
            transactions.iter().map(TransactionPayload::from).collect(),
        ))
    }

    /// Writes an account statement as CSV, newest first.
    pub fn export_statement_csv<W: Write>(
        &self,
        session: Option<&str>,
        account_id: Uuid,
        writer: W,
    ) -> Result<()> {
        let user = self.require_caller(session)?;
        let account = self
            .store
            .account(user.id, account_id)?
            .ok_or(LedgerError::NotFound("account"))?;
        let transactions = self.store.transactions_for_account(user.id, account.id)?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["id", "posted_at", "kind", "amount"])?;
        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.posted_at.to_rfc3339(),
                tx.kind.to_string(),
                tx.amount.to_string(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
