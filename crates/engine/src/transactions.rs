//! Transaction primitives.
//!
//! A `Transaction` is a single ledger event. Credits increase the balance,
//! debits and fees decrease it. Every transaction is born `Pending` and is
//! later resolved to a terminal status by the lifecycle engine.

use api_types::transaction as wire;
use chrono::{DateTime, Utc};

use crate::{Money, ResultWallet, WalletError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Credit,
    Debit,
    Fee,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Fee => "fee",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = WalletError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "fee" => Ok(Self::Fee),
            other => Err(WalletError::Validation(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = WalletError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(WalletError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    /// Caller-generated monotonic token, assigned before the store
    /// acknowledges the create.
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub status: TransactionStatus,
    /// `"Self"` for deposits, `"System"` for fees, otherwise a user id.
    pub recipient: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub deleted: bool,
    /// Present only while `status` is `Failed`.
    pub reason: Option<String>,
}

impl Transaction {
    pub fn new(
        id: String,
        user_id: String,
        kind: TransactionKind,
        amount: Money,
        recipient: String,
        description: String,
        timestamp: DateTime<Utc>,
    ) -> ResultWallet<Self> {
        if !amount.is_positive() {
            return Err(WalletError::Validation(
                "Amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            id,
            user_id,
            kind,
            amount,
            status: TransactionStatus::Pending,
            recipient,
            description,
            timestamp,
            deleted: false,
            reason: None,
        })
    }
}

impl From<TransactionKind> for wire::TransactionType {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Credit => Self::Credit,
            TransactionKind::Debit => Self::Debit,
            TransactionKind::Fee => Self::Fee,
        }
    }
}

impl From<wire::TransactionType> for TransactionKind {
    fn from(kind: wire::TransactionType) -> Self {
        match kind {
            wire::TransactionType::Credit => Self::Credit,
            wire::TransactionType::Debit => Self::Debit,
            wire::TransactionType::Fee => Self::Fee,
        }
    }
}

impl From<TransactionStatus> for wire::TransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Success => Self::Success,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<wire::TransactionStatus> for TransactionStatus {
    fn from(status: wire::TransactionStatus) -> Self {
        match status {
            wire::TransactionStatus::Pending => Self::Pending,
            wire::TransactionStatus::Success => Self::Success,
            wire::TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<&Transaction> for wire::TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            user_id: tx.user_id.clone(),
            kind: tx.kind.into(),
            amount: tx.amount.to_major(),
            status: tx.status.into(),
            recipient: tx.recipient.clone(),
            description: tx.description.clone(),
            timestamp: tx.timestamp,
            deleted: tx.deleted,
            reason: tx.reason.clone(),
        }
    }
}

impl From<wire::TransactionRecord> for Transaction {
    fn from(record: wire::TransactionRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            kind: record.kind.into(),
            amount: Money::from_major(record.amount),
            status: record.status.into(),
            recipient: record.recipient,
            description: record.description,
            timestamp: record.timestamp,
            deleted: record.deleted,
            // A nulled/empty reason on the wire means "cleared".
            reason: record.reason.filter(|r| !r.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn new_transaction_starts_pending() {
        let tx = Transaction::new(
            "1700000000000".to_string(),
            "1".to_string(),
            TransactionKind::Credit,
            Money::new(100_000),
            "Self".to_string(),
            "Money Added".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        )
        .unwrap();

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(!tx.deleted);
        assert_eq!(tx.reason, None);
    }

    #[test]
    fn new_transaction_rejects_non_positive_amounts() {
        let build = |amount| {
            Transaction::new(
                "1".to_string(),
                "1".to_string(),
                TransactionKind::Debit,
                amount,
                "2".to_string(),
                "Transfer to User 2".to_string(),
                Utc::now(),
            )
        };

        assert!(build(Money::ZERO).is_err());
        assert!(build(Money::new(-100)).is_err());
    }

    #[test]
    fn wire_round_trip_preserves_amount_cents() {
        let tx = Transaction::new(
            "42".to_string(),
            "1".to_string(),
            TransactionKind::Fee,
            Money::new(1001),
            "System".to_string(),
            "Transaction Fee".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        )
        .unwrap();

        let record = wire::TransactionRecord::from(&tx);
        assert_eq!(record.amount, 10.01);
        assert_eq!(Transaction::from(record), tx);
    }

    #[test]
    fn empty_wire_reason_reads_as_cleared() {
        let mut record = wire::TransactionRecord::from(
            &Transaction::new(
                "42".to_string(),
                "1".to_string(),
                TransactionKind::Debit,
                Money::new(500),
                "2".to_string(),
                "Transfer to User 2".to_string(),
                Utc::now(),
            )
            .unwrap(),
        );
        record.reason = Some(String::new());

        assert_eq!(Transaction::from(record).reason, None);
    }
}
