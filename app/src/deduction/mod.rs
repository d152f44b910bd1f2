//! The spend path: atomic, never-negative balance deduction.

use crate::account::UserId;
use crate::credits::Credits;
use crate::store::{self, DeductOutcome, LedgerStore};
use thiserror::Error;

mod entities;

pub use entities::Receipt;

#[derive(Debug, Error)]
pub enum Error {
    #[error("amount must be positive")]
    AmountNotPositive,
    #[error("user not found")]
    UserNotFound,
    #[error("insufficient credits: {current_credits:?} available, {required:?} required")]
    InsufficientCredits {
        current_credits: Credits,
        required: Credits,
    },
    #[error(transparent)]
    Storage(#[from] store::Error),
}

/// Deducts `amount` from the user's balance. The balance check and the
/// write are a single conditional update inside the store, so concurrent
/// spends against the same account can never drive the balance negative.
pub async fn deduct(
    store: &dyn LedgerStore,
    user_id: &UserId,
    amount: Credits,
) -> Result<Receipt, Error> {
    if !amount.is_positive() {
        return Err(Error::AmountNotPositive);
    }
    match store.deduct(user_id, amount).await? {
        DeductOutcome::Applied {
            previous_credits,
            new_credits,
        } => {
            log::info!(
                "deducted {:?} from user {:?}, {:?} remaining",
                amount,
                user_id,
                new_credits
            );
            Ok(Receipt {
                previous_credits,
                deducted: amount,
                new_credits,
            })
        }
        DeductOutcome::InsufficientCredits { current_credits } => Err(Error::InsufficientCredits {
            current_credits,
            required: amount,
        }),
        DeductOutcome::UserNotFound => Err(Error::UserNotFound),
    }
}
