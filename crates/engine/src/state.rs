//! Ledger state and its mutation commands.
//!
//! `LedgerState` is the single source of truth for the current session:
//! the cached user roster, the transaction set, and the balance the UI
//! shows. It is mutated exclusively through [`Command`] values applied by
//! [`LedgerState::apply`]; each command replaces its slice atomically and
//! nothing here ever talks to the gateway.

use crate::{Money, Transaction, TransactionStatus, User};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerState {
    pub current_user: Option<User>,
    pub users: Vec<User>,
    /// Backing list; soft-deleted records stay here and are filtered out
    /// by the read projections.
    pub transactions: Vec<Transaction>,
    pub balance: Money,
    pub loading: bool,
    pub error: Option<String>,
}

/// A single atomic state transition.
///
/// The two `Mark*` commands target a transaction by id and are silent
/// no-ops when the id is unknown: a resolution timer may fire after its
/// transaction was deleted, and that must never be an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetLoading(bool),
    SetError(Option<String>),
    SetUsers(Vec<User>),
    /// Also recomputes the cached balance from the user's balance.
    SetCurrentUser(User),
    SetTransactions(Vec<Transaction>),
    SetBalance(Money),
    AddTransaction(Transaction),
    /// Status transition; `reason` is the full new value (None clears).
    MarkTransactionStatus {
        id: String,
        status: TransactionStatus,
        reason: Option<String>,
    },
    MarkTransactionDeleted {
        id: String,
    },
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SetLoading(loading) => self.loading = loading,
            Command::SetError(error) => self.error = error,
            Command::SetUsers(users) => self.users = users,
            Command::SetCurrentUser(user) => {
                self.balance = user.balance;
                self.current_user = Some(user);
            }
            Command::SetTransactions(transactions) => self.transactions = transactions,
            Command::SetBalance(balance) => self.balance = balance,
            Command::AddTransaction(transaction) => self.transactions.push(transaction),
            Command::MarkTransactionStatus { id, status, reason } => {
                if let Some(tx) = self.transactions.iter_mut().find(|t| t.id == id) {
                    tx.status = status;
                    tx.reason = reason;
                }
            }
            Command::MarkTransactionDeleted { id } => {
                if let Some(tx) = self.transactions.iter_mut().find(|t| t.id == id) {
                    tx.deleted = true;
                }
            }
        }
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::TransactionKind;

    fn tx(id: &str, status: TransactionStatus) -> Transaction {
        let mut tx = Transaction::new(
            id.to_string(),
            "1".to_string(),
            TransactionKind::Credit,
            Money::new(1000),
            "Self".to_string(),
            "Money Added".to_string(),
            Utc::now(),
        )
        .unwrap();
        tx.status = status;
        tx
    }

    #[test]
    fn set_current_user_recomputes_balance() {
        let mut state = LedgerState::new();
        state.apply(Command::SetCurrentUser(User {
            id: "1".to_string(),
            name: "John Doe".to_string(),
            balance: Money::new(500_000),
        }));

        assert_eq!(state.balance, Money::new(500_000));
    }

    #[test]
    fn mark_status_replaces_reason() {
        let mut state = LedgerState::new();
        state.apply(Command::AddTransaction(tx("10", TransactionStatus::Pending)));

        state.apply(Command::MarkTransactionStatus {
            id: "10".to_string(),
            status: TransactionStatus::Failed,
            reason: Some("Network timeout - please retry".to_string()),
        });
        assert_eq!(
            state.transaction("10").unwrap().reason.as_deref(),
            Some("Network timeout - please retry")
        );

        state.apply(Command::MarkTransactionStatus {
            id: "10".to_string(),
            status: TransactionStatus::Pending,
            reason: None,
        });
        let tx = state.transaction("10").unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.reason, None);
    }

    #[test]
    fn marking_unknown_id_is_a_no_op() {
        let mut state = LedgerState::new();
        state.apply(Command::AddTransaction(tx("10", TransactionStatus::Pending)));
        let before = state.clone();

        state.apply(Command::MarkTransactionStatus {
            id: "missing".to_string(),
            status: TransactionStatus::Success,
            reason: None,
        });
        state.apply(Command::MarkTransactionDeleted {
            id: "missing".to_string(),
        });

        assert_eq!(state, before);
    }

    #[test]
    fn deleted_transactions_stay_in_backing_list() {
        let mut state = LedgerState::new();
        state.apply(Command::AddTransaction(tx("10", TransactionStatus::Success)));
        state.apply(Command::MarkTransactionDeleted {
            id: "10".to_string(),
        });

        assert_eq!(state.transactions.len(), 1);
        assert!(state.transactions[0].deleted);
    }
}
