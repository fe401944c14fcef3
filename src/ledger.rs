//! Balance reversal arithmetic for bulk transaction deletion.
//!
//! Deleting a set of transactions must adjust every affected account's
//! cached balance as if those transactions had never been posted. The math
//! here is pure; the engine applies the result inside one storage
//! transaction.

use crate::money::Money;
use crate::transaction::Transaction;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Sums the per-account balance adjustments for removing `transactions`.
///
/// Returns one entry per distinct account id. Deltas are combined with
/// exact decimal addition; the `BTreeMap` keeps the apply order
/// deterministic. Accounts with no transaction in the set simply have no
/// entry.
pub fn reversal_deltas(transactions: &[Transaction]) -> BTreeMap<Uuid, Money> {
    let mut deltas = BTreeMap::new();

    for tx in transactions {
        let entry = deltas.entry(tx.account_id).or_insert(Money::ZERO);
        *entry += tx.kind.reversal(tx.amount);
    }

    deltas
}

/// Signed sum of a set of transactions (income positive, expense negative).
///
/// An account's cached balance must equal this sum over its transactions.
pub fn signed_sum<'a, I>(transactions: I) -> Money
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .fold(Money::ZERO, |sum, tx| sum + tx.kind.signed(tx.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxKind;
    use chrono::Utc;
    use std::str::FromStr;

    fn tx(account_id: Uuid, kind: TxKind, amount: &str) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            account_id,
            kind,
            amount: Money::from_str(amount).unwrap(),
            posted_at: Utc::now(),
        }
    }

    #[test]
    fn test_deleting_expense_gives_money_back() {
        let account = Uuid::new_v4();
        let deltas = reversal_deltas(&[tx(account, TxKind::Expense, "30.00")]);

        assert_eq!(deltas[&account].to_string(), "30.00");
    }

    #[test]
    fn test_deleting_income_removes_money() {
        let account = Uuid::new_v4();
        let deltas = reversal_deltas(&[tx(account, TxKind::Income, "20.00")]);

        assert_eq!(deltas[&account].to_string(), "-20.00");
    }

    #[test]
    fn test_deltas_group_per_account() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        let transactions = vec![
            tx(x, TxKind::Expense, "10.00"),
            tx(y, TxKind::Income, "5.00"),
            tx(x, TxKind::Income, "2.50"),
        ];

        let deltas = reversal_deltas(&transactions);

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[&x].to_string(), "7.50");
        assert_eq!(deltas[&y].to_string(), "-5.00");
    }

    #[test]
    fn test_empty_set_touches_nothing() {
        assert!(reversal_deltas(&[]).is_empty());
    }

    #[test]
    fn test_signed_sum_matches_postings() {
        let account = Uuid::new_v4();
        let transactions = vec![
            tx(account, TxKind::Income, "100.00"),
            tx(account, TxKind::Expense, "30.00"),
            tx(account, TxKind::Expense, "0.10"),
        ];

        assert_eq!(signed_sum(&transactions).to_string(), "69.90");
    }

    #[test]
    fn test_reversal_cancels_signed_sum() {
        let account = Uuid::new_v4();
        let transactions = vec![
            tx(account, TxKind::Income, "12.34"),
            tx(account, TxKind::Expense, "5.67"),
        ];

        let delta = reversal_deltas(&transactions)[&account];
        assert_eq!(signed_sum(&transactions) + delta, Money::ZERO);
    }
}
