//! Charging for image generations. This is the second call site of the
//! atomic deduction primitive: the fixed generation cost is debited and the
//! generation record inserted as one atomic unit. Calling the generation
//! provider itself is the caller's concern.

use crate::account::{self, UserId};
use crate::credits::Credits;
use crate::store::{self, DeductOutcome, LedgerStore};
use thiserror::Error;

mod entities;

pub use entities::{Generation, Id, GENERATION_COST};

#[derive(Debug, Error)]
pub enum Error {
    #[error("insufficient credits: {current_credits:?} available, {required:?} required")]
    InsufficientCredits {
        current_credits: Credits,
        required: Credits,
    },
    #[error(transparent)]
    Storage(#[from] store::Error),
}

#[derive(Debug, Clone)]
pub struct Charged {
    pub generation: Generation,
    pub remaining_credits: Credits,
}

/// Records a completed generation for `user_id`, charging the fixed cost.
/// First-time users get their account row created here, and then fail the
/// charge against an empty balance rather than going negative.
pub async fn charge(
    store: &dyn LedgerStore,
    user_id: UserId,
    prompt: String,
    image_url: String,
) -> Result<Charged, Error> {
    account::ensure(store, &user_id).await?;
    let generation = Generation::new(user_id, prompt, image_url);
    match store.record_generation(&generation).await? {
        DeductOutcome::Applied { new_credits, .. } => {
            log::info!(
                "charged {:?} for generation {:?} of user {:?}",
                generation.credits_deducted,
                generation.id,
                generation.user_id
            );
            Ok(Charged {
                generation,
                remaining_credits: new_credits,
            })
        }
        DeductOutcome::InsufficientCredits { current_credits } => Err(Error::InsufficientCredits {
            current_credits,
            required: GENERATION_COST,
        }),
        // The account row was just ensured and rows are never deleted, so a
        // missing row can only read as an empty balance.
        DeductOutcome::UserNotFound => Err(Error::InsufficientCredits {
            current_credits: Credits::ZERO,
            required: GENERATION_COST,
        }),
    }
}
