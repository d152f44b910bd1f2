//! Persistence seam for the ledger.
//!
//! Every invariant that involves shared mutable state (balances,
//! idempotency keys) is enforced here by the backend's atomic primitives:
//! insert-if-absent, a uniqueness constraint on the external transaction
//! id, and conditional balance updates checked by affected-row count. The
//! service layer above never read-then-writes a balance, so any number of
//! process instances can share one store without in-process locking.

use crate::account::{Account, UserId};
use crate::allocation::Allocation;
use crate::credits::Credits;
use crate::generation::Generation;
use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum Error {
    /// The backend could not be reached or rejected the call. The caller
    /// may retry the whole operation; idempotency holds at the store.
    #[error("storage unavailable")]
    Unavailable(#[source] sqlx::Error),
    /// A storage call exceeded the configured timeout. Treated as a failed
    /// attempt, never as success.
    #[error("storage call timed out")]
    Timeout,
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Unavailable(e)
    }
}

/// Outcome of an allocation insert. The unique constraint on the external
/// transaction id is the single arbiter: the insert either wins and the
/// balance increment lands in the same atomic unit, or it loses and the
/// store is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    Applied { new_balance: Credits },
    AlreadyAllocated,
}

/// Outcome of the atomic conditional deduction: `credits - amount` is
/// written only where `credits >= amount` currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductOutcome {
    Applied {
        previous_credits: Credits,
        new_credits: Credits,
    },
    InsufficientCredits {
        current_credits: Credits,
    },
    UserNotFound,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert-if-absent of the account row with a zero balance. Never
    /// overwrites an existing balance.
    async fn ensure_account(&self, user_id: &UserId) -> Result<(), Error>;

    /// Point lookup by user id. Reads never create rows.
    async fn account(&self, user_id: &UserId) -> Result<Option<Account>, Error>;

    /// Inserts the allocation record and credits the balance as one atomic
    /// unit. A duplicate transaction id changes nothing.
    async fn apply_allocation(&self, allocation: &Allocation) -> Result<AllocationOutcome, Error>;

    /// Atomic conditional deduction against the account balance.
    async fn deduct(&self, user_id: &UserId, amount: Credits) -> Result<DeductOutcome, Error>;

    /// Charges `generation.credits_deducted` and inserts the generation
    /// record as one atomic unit; a failed charge writes nothing.
    async fn record_generation(&self, generation: &Generation) -> Result<DeductOutcome, Error>;
}
