use crate::account::UserId;
use crate::credits::Credits;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// External transaction identifier, the idempotency token for credit
/// grants. Issued by the payment platform, opaque to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransactionId(pub String);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Id(pub Uuid);

/// A one-time credit grant tied to an external transaction id. Written at
/// most once per transaction id and immutable afterwards; its existence is
/// the record that the transaction has been credited.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub id: Id,
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub product_id: String,
    pub credits_allocated: Credits,
    pub created: DateTime<Utc>,
}

impl Allocation {
    pub(crate) fn new(
        user_id: UserId,
        transaction_id: TransactionId,
        product_id: String,
        credits_allocated: Credits,
    ) -> Self {
        Self {
            id: Id(Uuid::new_v4()),
            user_id,
            transaction_id,
            product_id,
            credits_allocated,
            created: Utc::now(),
        }
    }
}
