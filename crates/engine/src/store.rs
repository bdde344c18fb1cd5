//! Persistence gateway.
//!
//! The engine is a thin client of a remote record store: a plain JSON
//! CRUD server with `users` and `transactions` collections. [`HttpStore`]
//! talks to the real thing; [`MemoryStore`] backs the offline demo mode
//! and the integration tests with the same contract.
//!
//! Patch operations report an unknown id as `Ok(None)` rather than an
//! error: a resolution timer may fire for a record someone else removed,
//! and deleting twice must succeed silently.

use std::sync::Mutex;

use api_types::transaction::{DeletePatch, StatusPatch, TransactionRecord, TransactionStatus};
use api_types::user::{BalancePatch, UserRecord};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Gateway failures, one named variant per operation.
///
/// The Display strings are surfaced verbatim as the wallet's `error`
/// state; the transport cause is logged where the failure happens.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Failed to fetch users")]
    FetchUsers,
    #[error("Failed to fetch user")]
    FetchUser,
    #[error("Failed to update balance")]
    UpdateBalance,
    #[error("Failed to fetch transactions")]
    FetchTransactions,
    #[error("Failed to create transaction")]
    CreateTransaction,
    #[error("Failed to update transaction")]
    UpdateTransaction,
    #[error("Failed to delete transaction")]
    DeleteTransaction,
}

/// CRUD contract of the record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>, GatewayError>;

    async fn fetch_user(&self, id: &str) -> Result<UserRecord, GatewayError>;

    /// Writes a new balance; `balance` is the decimal wire value.
    async fn update_balance(
        &self,
        user_id: &str,
        balance: f64,
    ) -> Result<UserRecord, GatewayError>;

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, GatewayError>;

    /// Persists a caller-built record; returns the store's echo of it.
    async fn create_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<TransactionRecord, GatewayError>;

    /// Status transition. `reason` replaces the stored failure reason
    /// (`None` clears it). Unknown id is `Ok(None)`.
    async fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Result<Option<TransactionRecord>, GatewayError>;

    /// Soft delete; idempotent, unknown id is `Ok(None)`.
    async fn soft_delete_transaction(
        &self,
        id: &str,
    ) -> Result<Option<TransactionRecord>, GatewayError>;
}

/// Reqwest-backed store client.
#[derive(Clone, Debug)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    /// The caller builds the `Client` (timeouts, headers) and hands it in.
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn patch_transaction<B: serde::Serialize + Sync>(
        &self,
        id: &str,
        body: &B,
        op: GatewayError,
    ) -> Result<Option<TransactionRecord>, GatewayError> {
        let fail = |err: reqwest::Error| {
            tracing::error!(error = %err, transaction = %id, "transaction patch failed");
            op
        };

        let resp = self
            .client
            .patch(self.url(&format!("/transactions/{id}")))
            .json(body)
            .send()
            .await
            .map_err(fail)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record = resp
            .error_for_status()
            .map_err(fail)?
            .json::<TransactionRecord>()
            .await
            .map_err(fail)?;
        Ok(Some(record))
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>, GatewayError> {
        let result = async {
            self.client
                .get(self.url("/users"))
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<UserRecord>>()
                .await
        }
        .await;
        result.map_err(|err| {
            tracing::error!(error = %err, "error fetching users");
            GatewayError::FetchUsers
        })
    }

    async fn fetch_user(&self, id: &str) -> Result<UserRecord, GatewayError> {
        let result = async {
            self.client
                .get(self.url(&format!("/users/{id}")))
                .send()
                .await?
                .error_for_status()?
                .json::<UserRecord>()
                .await
        }
        .await;
        result.map_err(|err| {
            tracing::error!(error = %err, user = %id, "error fetching user");
            GatewayError::FetchUser
        })
    }

    async fn update_balance(
        &self,
        user_id: &str,
        balance: f64,
    ) -> Result<UserRecord, GatewayError> {
        let result = async {
            self.client
                .patch(self.url(&format!("/users/{user_id}")))
                .json(&BalancePatch { balance })
                .send()
                .await?
                .error_for_status()?
                .json::<UserRecord>()
                .await
        }
        .await;
        result.map_err(|err| {
            tracing::error!(error = %err, user = %user_id, "error updating balance");
            GatewayError::UpdateBalance
        })
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, GatewayError> {
        // The store answers `null` for a collection it has never seen;
        // treat that as empty.
        let result = async {
            self.client
                .get(self.url("/transactions"))
                .send()
                .await?
                .error_for_status()?
                .json::<Option<Vec<TransactionRecord>>>()
                .await
        }
        .await;
        result.map(Option::unwrap_or_default).map_err(|err| {
            tracing::error!(error = %err, "error fetching transactions");
            GatewayError::FetchTransactions
        })
    }

    async fn create_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<TransactionRecord, GatewayError> {
        let result = async {
            self.client
                .post(self.url("/transactions"))
                .json(record)
                .send()
                .await?
                .error_for_status()?
                .json::<TransactionRecord>()
                .await
        }
        .await;
        result.map_err(|err| {
            tracing::error!(error = %err, transaction = %record.id, "error creating transaction");
            GatewayError::CreateTransaction
        })
    }

    async fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Result<Option<TransactionRecord>, GatewayError> {
        let body = StatusPatch {
            status,
            reason: reason.map(str::to_string),
        };
        self.patch_transaction(id, &body, GatewayError::UpdateTransaction)
            .await
    }

    async fn soft_delete_transaction(
        &self,
        id: &str,
    ) -> Result<Option<TransactionRecord>, GatewayError> {
        self.patch_transaction(id, &DeletePatch { deleted: true }, GatewayError::DeleteTransaction)
            .await
    }
}

/// In-process store with the same observable contract as the HTTP one.
///
/// Used by the offline demo mode and the engine tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    transactions: Mutex<Vec<TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: Mutex::new(users),
            transactions: Mutex::new(Vec::new()),
        }
    }

    /// The demo roster.
    pub fn seeded() -> Self {
        Self::with_users(vec![
            UserRecord {
                id: "1".to_string(),
                name: "John Doe".to_string(),
                balance: 5000.0,
            },
            UserRecord {
                id: "2".to_string(),
                name: "Jane Smith".to_string(),
                balance: 3000.0,
            },
        ])
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>, GatewayError> {
        Ok(Self::lock(&self.users).clone())
    }

    async fn fetch_user(&self, id: &str) -> Result<UserRecord, GatewayError> {
        Self::lock(&self.users)
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(GatewayError::FetchUser)
    }

    async fn update_balance(
        &self,
        user_id: &str,
        balance: f64,
    ) -> Result<UserRecord, GatewayError> {
        let mut users = Self::lock(&self.users);
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(GatewayError::UpdateBalance)?;
        user.balance = balance;
        Ok(user.clone())
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, GatewayError> {
        Ok(Self::lock(&self.transactions).clone())
    }

    async fn create_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<TransactionRecord, GatewayError> {
        let mut transactions = Self::lock(&self.transactions);
        transactions.push(record.clone());
        Ok(record.clone())
    }

    async fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Result<Option<TransactionRecord>, GatewayError> {
        let mut transactions = Self::lock(&self.transactions);
        let Some(tx) = transactions.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        tx.status = status;
        tx.reason = reason.map(str::to_string);
        Ok(Some(tx.clone()))
    }

    async fn soft_delete_transaction(
        &self,
        id: &str,
    ) -> Result<Option<TransactionRecord>, GatewayError> {
        let mut transactions = Self::lock(&self.transactions);
        let Some(tx) = transactions.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        tx.deleted = true;
        Ok(Some(tx.clone()))
    }
}

#[cfg(test)]
mod tests {
    use api_types::transaction::TransactionType;
    use chrono::Utc;

    use super::*;

    fn record(id: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            user_id: "1".to_string(),
            kind: TransactionType::Credit,
            amount: 100.0,
            status: TransactionStatus::Pending,
            recipient: "Self".to_string(),
            description: "Money Added".to_string(),
            timestamp: Utc::now(),
            deleted: false,
            reason: None,
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips_users() {
        let store = MemoryStore::seeded();

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "John Doe");

        let updated = store.update_balance("1", 6000.0).await.unwrap();
        assert_eq!(updated.balance, 6000.0);
        assert_eq!(store.fetch_user("1").await.unwrap().balance, 6000.0);
        assert_eq!(store.fetch_user("missing").await, Err(GatewayError::FetchUser));
    }

    #[tokio::test]
    async fn memory_store_patches_are_no_ops_on_unknown_ids() {
        let store = MemoryStore::seeded();

        let patched = store
            .update_transaction_status("missing", TransactionStatus::Success, None)
            .await
            .unwrap();
        assert_eq!(patched, None);
        assert_eq!(store.soft_delete_transaction("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_status_patch_replaces_reason() {
        let store = MemoryStore::seeded();
        store.create_transaction(&record("10")).await.unwrap();

        let failed = store
            .update_transaction_status("10", TransactionStatus::Failed, Some("Network timeout"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.reason.as_deref(), Some("Network timeout"));

        let retried = store
            .update_transaction_status("10", TransactionStatus::Pending, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retried.reason, None);

        let deleted = store.soft_delete_transaction("10").await.unwrap().unwrap();
        assert!(deleted.deleted);
    }
}
