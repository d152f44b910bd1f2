//! Account resolution and balance reads.

use crate::credits::Credits;
use crate::store::{self, LedgerStore};

mod entities;

pub use entities::{Account, UserId};

/// Creates the account row for `user_id` with a zero balance if none
/// exists yet. Existing balances are never overwritten, so a racing first
/// reference cannot reset a funded account.
pub async fn ensure(store: &dyn LedgerStore, user_id: &UserId) -> Result<(), store::Error> {
    store.ensure_account(user_id).await
}

/// Current balance for `user_id`. Unknown users read as zero; reads never
/// create a row.
pub async fn balance(store: &dyn LedgerStore, user_id: &UserId) -> Result<Credits, store::Error> {
    Ok(store
        .account(user_id)
        .await?
        .map(|account| account.credits)
        .unwrap_or_default())
}
