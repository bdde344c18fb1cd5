//! Wire types for the record store API.
//!
//! The remote store is a plain JSON CRUD server with two collections,
//! `users` and `transactions`. Field names here are part of the wire
//! contract and must not change (`userId`, `type`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod user {
    use super::*;

    /// A user row as stored in `/users`.
    ///
    /// `balance` travels as a decimal number with at most 2 fractional
    /// digits; the engine converts it to integer cents at the boundary.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct UserRecord {
        pub id: String,
        pub name: String,
        pub balance: f64,
    }

    /// Body of `PATCH /users/{id}`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BalancePatch {
        pub balance: f64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TransactionType {
        Credit,
        Debit,
        Fee,
    }

    impl TransactionType {
        /// Returns the canonical wire string.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Credit => "credit",
                Self::Debit => "debit",
                Self::Fee => "fee",
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
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

    /// A transaction row as stored in `/transactions`.
    ///
    /// Ids are caller-generated so clients can reference a transaction
    /// before the store acknowledges the create.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionRecord {
        pub id: String,
        #[serde(rename = "userId")]
        pub user_id: String,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub amount: f64,
        pub status: TransactionStatus,
        pub recipient: String,
        pub description: String,
        pub timestamp: DateTime<Utc>,
        #[serde(default)]
        pub deleted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub reason: Option<String>,
    }

    /// Body of `PATCH /transactions/{id}` for status transitions.
    ///
    /// `reason` always travels with the status: a failure sets it, any
    /// other transition sends `null` so a merge-patch store clears the
    /// stale failure cause instead of keeping it.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct StatusPatch {
        pub status: TransactionStatus,
        pub reason: Option<String>,
    }

    /// Body of `PATCH /transactions/{id}` for soft deletion.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct DeletePatch {
        pub deleted: bool,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::transaction::{TransactionRecord, TransactionStatus, TransactionType};

    #[test]
    fn transaction_record_uses_wire_field_names() {
        let record = TransactionRecord {
            id: "1700000000000".to_string(),
            user_id: "1".to_string(),
            kind: TransactionType::Credit,
            amount: 1000.0,
            status: TransactionStatus::Pending,
            recipient: "Self".to_string(),
            description: "Money Added".to_string(),
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            deleted: false,
            reason: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], "1");
        assert_eq!(value["type"], "credit");
        assert_eq!(value["status"], "pending");
        // Absent, not null: the store must not gain a `reason` key early.
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn transaction_record_tolerates_missing_optional_fields() {
        let raw = r#"{
            "id": "42",
            "userId": "2",
            "type": "debit",
            "amount": 50.25,
            "status": "failed",
            "recipient": "1",
            "description": "Transfer to User 1",
            "timestamp": "2024-01-15T10:30:00.000Z"
        }"#;

        let record: TransactionRecord = serde_json::from_str(raw).unwrap();
        assert!(!record.deleted);
        assert_eq!(record.reason, None);
        assert_eq!(record.kind, TransactionType::Debit);
    }
}
