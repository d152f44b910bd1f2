//! Postgres-backed ledger store. Uniqueness and conditional updates are
//! delegated to the database, so concurrent requests, including from other
//! process instances, serialize on the account row itself.

use super::{AllocationOutcome, DeductOutcome, Error, LedgerStore};
use crate::account::{Account, UserId};
use crate::allocation::Allocation;
use crate::credits::Credits;
use crate::database::Database;
use crate::generation::Generation;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

pub struct PgStore {
    db: Database,
    timeout: Duration,
}

impl PgStore {
    pub fn new(db: Database, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Runs a storage call under the configured timeout. A timed-out call
    /// counts as failed and is safe to retry, since the statements
    /// themselves are atomic.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T, Error>> + Send) -> Result<T, Error> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout)?
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn ensure_account(&self, user_id: &UserId) -> Result<(), Error> {
        self.bounded(queries::ensure_account(&self.db, user_id)).await
    }

    async fn account(&self, user_id: &UserId) -> Result<Option<Account>, Error> {
        self.bounded(queries::account(&self.db, user_id)).await
    }

    async fn apply_allocation(&self, allocation: &Allocation) -> Result<AllocationOutcome, Error> {
        self.bounded(queries::apply_allocation(&self.db, allocation))
            .await
    }

    async fn deduct(&self, user_id: &UserId, amount: Credits) -> Result<DeductOutcome, Error> {
        self.bounded(queries::deduct(&self.db, user_id, amount)).await
    }

    async fn record_generation(&self, generation: &Generation) -> Result<DeductOutcome, Error> {
        self.bounded(queries::record_generation(&self.db, generation))
            .await
    }
}

mod queries {
    use super::{AllocationOutcome, DeductOutcome, Error};
    use crate::account::{Account, UserId};
    use crate::allocation::Allocation;
    use crate::credits::Credits;
    use crate::database::Database;
    use crate::generation::Generation;
    use chrono::{DateTime, Utc};

    pub(super) async fn ensure_account(db: &Database, user_id: &UserId) -> Result<(), Error> {
        sqlx::query(
            r#"INSERT INTO users (user_id, credits, created) VALUES ($1, 0, $2)
                ON CONFLICT (user_id) DO NOTHING"#,
        )
        .bind(&user_id.0)
        .bind(Utc::now())
        .execute(db)
        .await?;
        Ok(())
    }

    pub(super) async fn account(db: &Database, user_id: &UserId) -> Result<Option<Account>, Error> {
        Ok(sqlx::query_as::<_, AccountRow>(
            "SELECT user_id, credits, created FROM users WHERE user_id = $1",
        )
        .bind(&user_id.0)
        .fetch_optional(db)
        .await?
        .map(|row| row.into_entity()))
    }

    pub(super) async fn apply_allocation(
        db: &Database,
        allocation: &Allocation,
    ) -> Result<AllocationOutcome, Error> {
        let mut data_tx = db.begin().await?;
        let inserted = sqlx::query(
            r#"INSERT INTO subscription_allocations
                (id, user_id, transaction_id, product_id, credits_allocated, created)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (transaction_id) DO NOTHING"#,
        )
        .bind(allocation.id.0)
        .bind(&allocation.user_id.0)
        .bind(&allocation.transaction_id.0)
        .bind(&allocation.product_id)
        .bind(allocation.credits_allocated.0)
        .bind(allocation.created)
        .execute(&mut data_tx)
        .await?
        .rows_affected();
        if inserted == 0 {
            data_tx.rollback().await?;
            return Ok(AllocationOutcome::AlreadyAllocated);
        }
        let row = sqlx::query_as::<_, BalanceRow>(
            "UPDATE users SET credits = credits + $1 WHERE user_id = $2 RETURNING credits",
        )
        .bind(allocation.credits_allocated.0)
        .bind(&allocation.user_id.0)
        .fetch_one(&mut data_tx)
        .await?;
        data_tx.commit().await?;
        Ok(AllocationOutcome::Applied {
            new_balance: Credits(row.credits),
        })
    }

    pub(super) async fn deduct(
        db: &Database,
        user_id: &UserId,
        amount: Credits,
    ) -> Result<DeductOutcome, Error> {
        let updated = sqlx::query_as::<_, BalanceRow>(
            r#"UPDATE users SET credits = credits - $1
                WHERE user_id = $2 AND credits >= $1 RETURNING credits"#,
        )
        .bind(amount.0)
        .bind(&user_id.0)
        .fetch_optional(db)
        .await?;
        match updated {
            Some(row) => Ok(DeductOutcome::Applied {
                previous_credits: Credits(row.credits) + amount,
                new_credits: Credits(row.credits),
            }),
            // The conditional update did not take; look at the row once to
            // tell an unknown user from an underfunded one.
            None => classify_failed_deduct(db, user_id).await,
        }
    }

    pub(super) async fn record_generation(
        db: &Database,
        generation: &Generation,
    ) -> Result<DeductOutcome, Error> {
        let mut data_tx = db.begin().await?;
        let updated = sqlx::query_as::<_, BalanceRow>(
            r#"UPDATE users SET credits = credits - $1
                WHERE user_id = $2 AND credits >= $1 RETURNING credits"#,
        )
        .bind(generation.credits_deducted.0)
        .bind(&generation.user_id.0)
        .fetch_optional(&mut data_tx)
        .await?;
        let row = match updated {
            Some(row) => row,
            None => {
                data_tx.rollback().await?;
                return classify_failed_deduct(db, &generation.user_id).await;
            }
        };
        sqlx::query(
            r#"INSERT INTO generations (id, user_id, prompt, image_url, credits_deducted, created)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(generation.id.0)
        .bind(&generation.user_id.0)
        .bind(&generation.prompt)
        .bind(&generation.image_url)
        .bind(generation.credits_deducted.0)
        .bind(generation.created)
        .execute(&mut data_tx)
        .await?;
        data_tx.commit().await?;
        Ok(DeductOutcome::Applied {
            previous_credits: Credits(row.credits) + generation.credits_deducted,
            new_credits: Credits(row.credits),
        })
    }

    async fn classify_failed_deduct(
        db: &Database,
        user_id: &UserId,
    ) -> Result<DeductOutcome, Error> {
        match sqlx::query_as::<_, BalanceRow>("SELECT credits FROM users WHERE user_id = $1")
            .bind(&user_id.0)
            .fetch_optional(db)
            .await?
        {
            Some(row) => Ok(DeductOutcome::InsufficientCredits {
                current_credits: Credits(row.credits),
            }),
            None => Ok(DeductOutcome::UserNotFound),
        }
    }

    #[derive(sqlx::FromRow, Debug)]
    struct BalanceRow {
        credits: i64,
    }

    #[derive(sqlx::FromRow, Debug)]
    struct AccountRow {
        user_id: String,
        credits: i64,
        created: DateTime<Utc>,
    }

    impl AccountRow {
        fn into_entity(self) -> Account {
            Account {
                user_id: UserId(self.user_id),
                credits: Credits(self.credits),
                created: self.created,
            }
        }
    }
}
