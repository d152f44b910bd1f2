use crate::credits::Credits;
use chrono::{DateTime, Utc};

/// Opaque external user identifier. The ledger never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

/// One balance row per user. Created with a zero balance on first
/// reference, mutated only by allocations (credit) and deductions (debit),
/// never deleted.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: UserId,
    pub credits: Credits,
    pub created: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            credits: Credits::ZERO,
            created: Utc::now(),
        }
    }
}
