//! Wallet ledger and transaction lifecycle engine.
//!
//! A [`Wallet`] owns the in-memory [`LedgerState`] and drives every
//! mutation: deposits, fee-carrying transfers, soft deletes, and retries.
//! Writes go to the record store first, then the ledger, and each
//! operation schedules a delayed resolution task that settles the
//! provisional transaction to `success` or `failed` (with a compensating
//! refund for failed transfers).
//!
//! Business failures never escape as errors: every operation returns an
//! [`Outcome`] with a displayable message, and the failure is mirrored
//! into the ledger's `error` slot.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

pub use config::WalletConfig;
pub use error::WalletError;
pub use money::Money;
pub use projections::{HistoryFilter, HistoryPage, HistoryView};
pub use state::{Command, LedgerState};
pub use store::{GatewayError, HttpStore, MemoryStore, RecordStore};
pub use transactions::{Transaction, TransactionKind, TransactionStatus};
pub use users::User;

mod config;
mod error;
mod money;
pub mod projections;
mod state;
mod store;
mod transactions;
mod users;

pub(crate) type ResultWallet<T> = Result<T, WalletError>;

/// Reason attached to both halves of a failed transfer (and to a retry
/// that fails again).
const FAILURE_REASON: &str = "Network timeout - please retry";

/// What a lifecycle operation reports back to the caller.
///
/// `is_pending` marks an operation that finished its synchronous writes
/// but still has a resolution in flight (transfers).
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    pub is_pending: bool,
}

impl Outcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            is_pending: false,
        }
    }

    fn pending(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            is_pending: true,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_pending: false,
        }
    }
}

/// The wallet engine. Cheap to clone; all clones share one ledger.
///
/// The mutex is the single-writer funnel: direct calls and resolution
/// tasks both go through it, so command application is serialized.
#[derive(Clone)]
pub struct Wallet {
    state: Arc<Mutex<LedgerState>>,
    store: Arc<dyn RecordStore>,
    config: Arc<WalletConfig>,
    next_token: Arc<AtomicI64>,
}

impl Wallet {
    /// Return a builder for `Wallet`.
    pub fn builder() -> WalletBuilder {
        WalletBuilder::default()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, command: Command) {
        self.state().apply(command);
    }

    /// Next caller-generated transaction id (millisecond-seeded counter,
    /// so ids are unique and sortable within a session).
    fn next_id(&self) -> String {
        self.next_token.fetch_add(1, Ordering::Relaxed).to_string()
    }

    // ---- read accessors -------------------------------------------------

    pub fn snapshot(&self) -> LedgerState {
        self.state().clone()
    }

    pub fn balance(&self) -> Money {
        self.state().balance
    }

    pub fn users(&self) -> Vec<User> {
        self.state().users.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().current_user.clone()
    }

    /// The full backing list, soft-deleted records included.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state().transactions.clone()
    }

    pub fn loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.apply(Command::SetError(None));
    }

    pub fn active_transactions(&self) -> Vec<Transaction> {
        projections::active(&self.state().transactions)
    }

    pub fn recent_transactions(&self, n: usize) -> Vec<Transaction> {
        projections::recent(&self.state().transactions, n)
    }

    pub fn pending_count(&self) -> usize {
        projections::pending_count(&self.state().transactions)
    }

    pub fn filtered_history(&self, filter: &HistoryFilter) -> Vec<Transaction> {
        projections::filter_history(&self.state().transactions, filter)
    }

    pub fn history_page(&self, view: &HistoryView) -> HistoryPage {
        view.slice(&self.state().transactions)
    }

    // ---- lifecycle operations -------------------------------------------

    /// Fetches the user roster and the non-deleted transaction history,
    /// making the first user current.
    ///
    /// Any gateway failure lands in the ledger's `error` slot; this never
    /// panics and leaves `loading` cleared.
    pub async fn load(&self) {
        self.apply(Command::SetLoading(true));
        match self.load_inner().await {
            Ok(()) => self.apply(Command::SetError(None)),
            Err(err) => self.apply(Command::SetError(Some(err.to_string()))),
        }
        self.apply(Command::SetLoading(false));
    }

    async fn load_inner(&self) -> ResultWallet<()> {
        let users: Vec<User> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(User::from)
            .collect();
        let transactions: Vec<Transaction> = self
            .store
            .list_transactions()
            .await?
            .into_iter()
            .filter(|record| !record.deleted)
            .map(Transaction::from)
            .collect();

        let first = users.first().cloned();
        self.apply(Command::SetUsers(users));
        self.apply(Command::SetTransactions(transactions));
        if let Some(user) = first {
            self.apply(Command::SetCurrentUser(user));
        }
        Ok(())
    }

    /// Adds money to the current user's balance.
    ///
    /// The credit is written `pending`, the balance is applied
    /// optimistically, and a resolution task marks it `success` after the
    /// configured delay (deposits never fail at resolution). If the local
    /// apply fails after the store writes succeeded there is no rollback;
    /// the next `load()` reconverges.
    pub async fn deposit(&self, amount: Money) -> Outcome {
        self.apply(Command::SetLoading(true));
        let result = self.deposit_inner(amount).await;
        self.apply(Command::SetLoading(false));
        self.finish(result)
    }

    async fn deposit_inner(&self, amount: Money) -> ResultWallet<Outcome> {
        let user = self.current_user().ok_or(WalletError::NoUserLoaded)?;

        let tx = Transaction::new(
            self.next_id(),
            user.id.clone(),
            TransactionKind::Credit,
            amount,
            "Self".to_string(),
            "Money Added".to_string(),
            Utc::now(),
        )?;

        let created = Transaction::from(self.store.create_transaction(&(&tx).into()).await?);
        let new_balance = self.balance() + amount;
        self.store
            .update_balance(&user.id, new_balance.to_major())
            .await?;

        let tx_id = created.id.clone();
        self.apply(Command::AddTransaction(created));
        self.apply(Command::SetBalance(new_balance));
        self.apply(Command::SetCurrentUser(User {
            balance: new_balance,
            ..user
        }));

        self.schedule_deposit_resolution(tx_id);
        Ok(Outcome::ok("Money added successfully"))
    }

    /// Sends money to another user, charging the supplied fee.
    ///
    /// Creates a linked debit + fee pair (both `pending`), debits
    /// amount + fee optimistically, and resolves both after the
    /// configured delay: success leaves the balance as debited, failure
    /// marks both `failed` with a shared reason and refunds the total as
    /// a silent balance correction (no third record).
    ///
    /// Returns immediately with `is_pending: true`; the caller must treat
    /// the transfer as in-flight until resolution lands.
    pub async fn transfer(&self, recipient_id: &str, amount: Money, fee: Money) -> Outcome {
        self.apply(Command::SetLoading(true));
        let result = self.transfer_inner(recipient_id, amount, fee).await;
        self.apply(Command::SetLoading(false));
        self.finish(result)
    }

    async fn transfer_inner(
        &self,
        recipient_id: &str,
        amount: Money,
        fee: Money,
    ) -> ResultWallet<Outcome> {
        let user = self.current_user().ok_or(WalletError::NoUserLoaded)?;
        let total = amount + fee;

        let debit = Transaction::new(
            self.next_id(),
            user.id.clone(),
            TransactionKind::Debit,
            amount,
            recipient_id.to_string(),
            format!("Transfer to User {recipient_id}"),
            Utc::now(),
        )?;
        let fee_tx = Transaction::new(
            self.next_id(),
            user.id.clone(),
            TransactionKind::Fee,
            fee,
            "System".to_string(),
            "Transaction Fee".to_string(),
            Utc::now(),
        )?;

        let created_debit =
            Transaction::from(self.store.create_transaction(&(&debit).into()).await?);
        let created_fee =
            Transaction::from(self.store.create_transaction(&(&fee_tx).into()).await?);

        let new_balance = self.balance() - total;
        self.store
            .update_balance(&user.id, new_balance.to_major())
            .await?;

        let debit_id = created_debit.id.clone();
        let fee_id = created_fee.id.clone();
        self.apply(Command::AddTransaction(created_debit));
        self.apply(Command::AddTransaction(created_fee));
        self.apply(Command::SetBalance(new_balance));
        self.apply(Command::SetCurrentUser(User {
            balance: new_balance,
            ..user.clone()
        }));

        self.schedule_transfer_resolution(debit_id, fee_id, user.id, total);
        Ok(Outcome::pending("Transfer initiated successfully"))
    }

    /// Soft-deletes a transaction.
    ///
    /// Presentational only: the record is hidden from projections but
    /// kept in the store, and the balance is untouched whatever the
    /// transaction's amount or status. Deleting an unknown or
    /// already-deleted id succeeds silently.
    pub async fn delete_transaction(&self, id: &str) -> Outcome {
        self.apply(Command::SetLoading(true));
        let result = self.delete_inner(id).await;
        self.apply(Command::SetLoading(false));
        self.finish(result)
    }

    async fn delete_inner(&self, id: &str) -> ResultWallet<Outcome> {
        self.store.soft_delete_transaction(id).await?;
        self.apply(Command::MarkTransactionDeleted { id: id.to_string() });
        Ok(Outcome::ok("Transaction deleted successfully"))
    }

    /// Puts a failed transaction back into `pending` and schedules a
    /// fresh resolution with the (higher) retry success probability.
    ///
    /// Only a non-deleted `failed` transaction is retryable. Retry moves
    /// no money: the refund already happened when the original resolution
    /// failed. For a transfer pair this targets the one record named,
    /// so the pair can end in mixed terminal states.
    pub async fn retry_transaction(&self, id: &str) -> Outcome {
        let retryable = {
            let state = self.state();
            state
                .transaction(id)
                .is_some_and(|t| !t.deleted && t.status == TransactionStatus::Failed)
        };
        if !retryable {
            return Outcome::failed(WalletError::NotRetryable.to_string());
        }

        self.apply(Command::SetLoading(true));
        let result = self.retry_inner(id).await;
        self.apply(Command::SetLoading(false));
        self.finish(result)
    }

    async fn retry_inner(&self, id: &str) -> ResultWallet<Outcome> {
        self.store
            .update_transaction_status(id, TransactionStatus::Pending.into(), None)
            .await?;
        self.apply(Command::MarkTransactionStatus {
            id: id.to_string(),
            status: TransactionStatus::Pending,
            reason: None,
        });

        self.schedule_retry_resolution(id.to_string());
        Ok(Outcome::ok("Transaction retry initiated"))
    }

    // ---- deferred resolution --------------------------------------------

    fn finish(&self, result: ResultWallet<Outcome>) -> Outcome {
        match result {
            Ok(outcome) => {
                self.apply(Command::SetError(None));
                outcome
            }
            Err(err) => {
                let message = err.to_string();
                self.apply(Command::SetError(Some(message.clone())));
                Outcome::failed(message)
            }
        }
    }

    /// Finalizes one transaction remotely and locally.
    ///
    /// A target missing from the store (deleted meanwhile) is a silent
    /// no-op, and a gateway failure is logged but never propagated: the
    /// originating call already returned, and later resolutions must
    /// keep running.
    async fn resolve(&self, id: &str, status: TransactionStatus, reason: Option<&str>) {
        match self
            .store
            .update_transaction_status(id, status.into(), reason)
            .await
        {
            Ok(Some(_)) => self.apply(Command::MarkTransactionStatus {
                id: id.to_string(),
                status,
                reason: reason.map(str::to_string),
            }),
            Ok(None) => {
                tracing::debug!(transaction = %id, "resolution target gone, skipping");
            }
            Err(err) => {
                tracing::error!(transaction = %id, error = %err, "failed to resolve transaction");
            }
        }
    }

    fn schedule_deposit_resolution(&self, id: String) {
        let wallet = self.clone();
        let delay = self.config.deposit_resolve_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            wallet.resolve(&id, TransactionStatus::Success, None).await;
        });
    }

    fn schedule_transfer_resolution(
        &self,
        debit_id: String,
        fee_id: String,
        user_id: String,
        total: Money,
    ) {
        let wallet = self.clone();
        let delay = self.config.transfer_resolve_delay;
        let failure_probability = self.config.transfer_failure_probability;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let failed = rand::random::<f64>() < failure_probability;
            if failed {
                wallet
                    .resolve(&debit_id, TransactionStatus::Failed, Some(FAILURE_REASON))
                    .await;
                wallet
                    .resolve(&fee_id, TransactionStatus::Failed, Some(FAILURE_REASON))
                    .await;
                wallet.refund(&user_id, total).await;
            } else {
                wallet.resolve(&debit_id, TransactionStatus::Success, None).await;
                wallet.resolve(&fee_id, TransactionStatus::Success, None).await;
            }
        });
    }

    fn schedule_retry_resolution(&self, id: String) {
        let wallet = self.clone();
        let delay = self.config.retry_resolve_delay;
        let success_probability = self.config.retry_success_probability;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let succeeded = rand::random::<f64>() < success_probability;
            if succeeded {
                wallet.resolve(&id, TransactionStatus::Success, None).await;
            } else {
                wallet.resolve(&id, TransactionStatus::Failed, Some(FAILURE_REASON)).await;
            }
        });
    }

    /// Compensating credit for a failed transfer: puts amount + fee back
    /// on the payer's balance, store first, then ledger.
    async fn refund(&self, user_id: &str, total: Money) {
        let refunded = self.balance() + total;
        match self.store.update_balance(user_id, refunded.to_major()).await {
            Ok(_) => {
                self.apply(Command::SetBalance(refunded));
                if let Some(user) = self.current_user() {
                    if user.id == user_id {
                        self.apply(Command::SetCurrentUser(User {
                            balance: refunded,
                            ..user
                        }));
                    }
                }
            }
            Err(err) => {
                tracing::error!(user = %user_id, error = %err, "failed to refund transfer");
            }
        }
    }
}

/// The builder for `Wallet`.
pub struct WalletBuilder {
    store: Arc<dyn RecordStore>,
    config: WalletConfig,
}

impl Default for WalletBuilder {
    /// Starts with an empty in-memory store and default business rules.
    fn default() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config: WalletConfig::default(),
        }
    }
}

impl WalletBuilder {
    /// Pass the record store backing this wallet.
    pub fn store(mut self, store: impl RecordStore + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Like [`store`](Self::store), for callers that keep their own
    /// handle to the store (tests inspect it directly).
    pub fn shared_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(mut self, config: WalletConfig) -> Self {
        self.config = config;
        self
    }

    /// Construct `Wallet`. Call [`Wallet::load`] afterwards to populate
    /// the ledger.
    pub fn build(self) -> Wallet {
        Wallet {
            state: Arc::new(Mutex::new(LedgerState::new())),
            store: self.store,
            config: Arc::new(self.config),
            next_token: Arc::new(AtomicI64::new(Utc::now().timestamp_millis())),
        }
    }
}
