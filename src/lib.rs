//! # finledger
//!
//! The account-balance core of a personal-finance dashboard: users hold
//! multiple accounts, transactions post against them, and the cached
//! account balances must stay consistent under bulk mutation.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 2 decimal places via `rust_decimal`;
//!   floats exist only in presentation payloads
//! - **Atomic units**: every mutation runs inside one SQLite transaction
//!   and either commits completely or leaves no trace
//! - **Strict invariants**: balances equal the signed sum of postings, and
//!   a user with accounts has exactly one default account
//! - **Ownership filtering**: foreign rows are invisible — never deleted,
//!   never counted, reported as absent
//!
//! ## Example
//!
//! ```no_run
//! use finledger::{AccountRequest, Engine, Store};
//!
//! let store = Store::open("dashboard.db").unwrap();
//! store.insert_user("idp|alice", "Alice").unwrap();
//!
//! let mut engine = Engine::new(store);
//! let request = AccountRequest {
//!     name: "Everyday".to_string(),
//!     kind: "current".to_string(),
//!     balance: "100.00".to_string(),
//!     is_default: false,
//! };
//! let account = engine.create_account(Some("idp|alice"), &request).unwrap();
//! assert!(account.is_default); // first account always is
//! ```

pub mod account;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod money;
pub mod payload;
pub mod store;
pub mod transaction;

pub use account::{Account, AccountKind, AccountRequest, NewAccount};
pub use engine::Engine;
pub use error::{LedgerError, Result};
pub use money::Money;
pub use payload::{AccountPayload, MutationOutcome, TransactionPayload};
pub use store::{Store, User};
pub use transaction::{Transaction, TxKind};
