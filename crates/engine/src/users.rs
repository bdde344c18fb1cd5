//! User primitives.

use api_types::user::UserRecord;

use crate::Money;

/// A wallet holder, cached from the record store.
///
/// Users are never created or deleted by the engine; the roster exists so
/// a transfer can pick a recipient. Only `balance` is ever written back.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub balance: Money,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            balance: Money::from_major(record.balance),
        }
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            balance: user.balance.to_major(),
        }
    }
}
