//! finledger CLI
//!
//! Thin front end over the ledger engine: marshals command-line input into
//! the core operations and prints their payloads as JSON (or CSV for
//! statement export).
//!
//! # Usage
//!
//! ```bash
//! finledger dashboard.db add-user idp-alice Alice
//! finledger dashboard.db create-account idp-alice Everyday current 100.00 --default
//! finledger dashboard.db delete idp-alice <tx-id> [<tx-id>...]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use chrono::Utc;
use finledger::{AccountRequest, Engine, LedgerError, Money, MutationOutcome, Result, Store, TxKind};
use std::env;
use std::io;
use std::process;
use std::str::FromStr;
use uuid::Uuid;

const USAGE: &str = "finledger <db> <command> [args]
  add-user       <external-id> <name>
  create-account <external-id> <name> <current|savings> <balance> [--default]
  set-default    <external-id> <account-id>
  post           <external-id> <account-id> <income|expense> <amount>
  delete         <external-id> <tx-id> [<tx-id>...]
  accounts       <external-id>
  statement      <external-id> <account-id>
  export         <external-id> <account-id>";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        return Err(LedgerError::Usage(USAGE));
    }

    let store = Store::open(&args[1])?;
    let mut engine = Engine::new(store);
    let session = Some(args[3].as_str());

    match args[2].as_str() {
        "add-user" => {
            let name = args.get(4).ok_or(LedgerError::Usage(USAGE))?;
            let user = engine.add_user(&args[3], name)?;
            println!("{}", user.id);
        }
        "create-account" => {
            if args.len() < 7 {
                return Err(LedgerError::Usage(USAGE));
            }
            let request = AccountRequest {
                name: args[4].clone(),
                kind: args[5].clone(),
                balance: args[6].clone(),
                is_default: args.get(7).map(|s| s == "--default").unwrap_or(false),
            };
            let account = engine.create_account(session, &request)?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        "set-default" => {
            let account_id = parse_id(&args, 4)?;
            report(engine.set_default_account(session, account_id))?;
        }
        "post" => {
            if args.len() < 7 {
                return Err(LedgerError::Usage(USAGE));
            }
            let account_id = parse_id(&args, 4)?;
            let kind = args[5].parse::<TxKind>()?;
            let amount =
                Money::from_str(&args[6]).map_err(|_| LedgerError::InvalidArgument {
                    field: "amount",
                    message: format!("not a number: {:?}", args[6]),
                })?;
            let posted = engine.record_transaction(session, account_id, kind, amount, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&posted)?);
        }
        "delete" => {
            if args.len() < 5 {
                return Err(LedgerError::Usage(USAGE));
            }
            let mut ids = Vec::new();
            for idx in 4..args.len() {
                ids.push(parse_id(&args, idx)?);
            }
            report(engine.bulk_delete_transactions(session, &ids))?;
        }
        "accounts" => {
            let accounts = engine.account_overview(session)?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }
        "statement" => {
            let account_id = parse_id(&args, 4)?;
            let (account, transactions) = engine.account_statement(session, account_id)?;
            let statement = serde_json::json!({
                "account": account,
                "transactions": transactions,
            });
            println!("{}", serde_json::to_string_pretty(&statement)?);
        }
        "export" => {
            let account_id = parse_id(&args, 4)?;
            let stdout = io::stdout();
            engine.export_statement_csv(session, account_id, stdout.lock())?;
        }
        _ => return Err(LedgerError::Usage(USAGE)),
    }

    Ok(())
}

/// Prints a mutation outcome; a failed outcome also fails the process so
/// scripts can rely on the exit code.
fn report(outcome: MutationOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.success {
        process::exit(1);
    }
    Ok(())
}

fn parse_id(args: &[String], idx: usize) -> Result<Uuid> {
    let raw = args.get(idx).ok_or(LedgerError::Usage(USAGE))?;
    Uuid::parse_str(raw).map_err(|_| LedgerError::InvalidArgument {
        field: "id",
        message: format!("not a valid id: {:?}", raw),
    })
}
