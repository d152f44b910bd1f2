//! The idempotent credit-grant path. Given an external transaction id, a
//! product id and a user id, grants the product's catalog credits to the
//! user at most once per transaction id, no matter how often the platform
//! redelivers the same receipt.

use crate::account::{self, UserId};
use crate::catalog::ProductCatalog;
use crate::credits::Credits;
use crate::store::{self, AllocationOutcome, LedgerStore};
use thiserror::Error;

mod entities;

pub use entities::{Allocation, Id, TransactionId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown product: {0}")]
    InvalidProduct(String),
    #[error(transparent)]
    Storage(#[from] store::Error),
}

/// Result of a grant. A previously processed transaction id reports zero
/// credits allocated and no balance; that outcome is a success, not an
/// error, so webhook retries stay silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub credits_allocated: Credits,
    pub new_balance: Option<Credits>,
}

/// Grants the catalog credits for `product_id` to `user_id`, at most once
/// per `transaction_id`.
///
/// There is no separate dedup read: the allocation record insert is the
/// atomic arbiter of which caller wins a duplicate race. The store applies
/// the record insert and the balance increment as one atomic unit, and the
/// losing caller observes a zero grant.
pub async fn allocate(
    store: &dyn LedgerStore,
    catalog: &ProductCatalog,
    user_id: UserId,
    transaction_id: TransactionId,
    product_id: String,
) -> Result<Grant, Error> {
    let credits = catalog
        .credits_for(&product_id)
        .ok_or_else(|| Error::InvalidProduct(product_id.clone()))?;
    account::ensure(store, &user_id).await?;
    let allocation = Allocation::new(user_id, transaction_id, product_id, credits);
    match store.apply_allocation(&allocation).await? {
        AllocationOutcome::Applied { new_balance } => {
            log::info!(
                "allocated {:?} to user {:?} for transaction {:?}",
                credits,
                allocation.user_id,
                allocation.transaction_id
            );
            Ok(Grant {
                credits_allocated: credits,
                new_balance: Some(new_balance),
            })
        }
        AllocationOutcome::AlreadyAllocated => {
            log::info!(
                "transaction {:?} already allocated, skipping",
                allocation.transaction_id
            );
            Ok(Grant {
                credits_allocated: Credits::ZERO,
                new_balance: None,
            })
        }
    }
}
