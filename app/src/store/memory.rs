//! In-memory ledger store. One mutex serializes every operation, which
//! gives each call the same atomicity the Postgres backend gets from its
//! conditional statements. Used by tests and for local development.

use super::{AllocationOutcome, DeductOutcome, Error, LedgerStore};
use crate::account::{Account, UserId};
use crate::allocation::{Allocation, TransactionId};
use crate::credits::Credits;
use crate::generation::Generation;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    // Keyed by external transaction id, mirroring the unique index.
    allocations: HashMap<String, Allocation>,
    generations: Vec<Generation>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The allocation record held for `transaction_id`, if any.
    pub async fn allocation(&self, transaction_id: &TransactionId) -> Option<Allocation> {
        self.state
            .lock()
            .await
            .allocations
            .get(&transaction_id.0)
            .cloned()
    }

    /// Generation records held for `user_id`, oldest first.
    pub async fn generations_for(&self, user_id: &UserId) -> Vec<Generation> {
        self.state
            .lock()
            .await
            .generations
            .iter()
            .filter(|generation| generation.user_id == *user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemStore {
    async fn ensure_account(&self, user_id: &UserId) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state
            .accounts
            .entry(user_id.0.clone())
            .or_insert_with(|| Account::new(user_id.clone()));
        Ok(())
    }

    async fn account(&self, user_id: &UserId) -> Result<Option<Account>, Error> {
        Ok(self.state.lock().await.accounts.get(&user_id.0).cloned())
    }

    async fn apply_allocation(&self, allocation: &Allocation) -> Result<AllocationOutcome, Error> {
        let mut state = self.state.lock().await;
        if state.allocations.contains_key(&allocation.transaction_id.0) {
            return Ok(AllocationOutcome::AlreadyAllocated);
        }
        let account = state
            .accounts
            .entry(allocation.user_id.0.clone())
            .or_insert_with(|| Account::new(allocation.user_id.clone()));
        account.credits += allocation.credits_allocated;
        let new_balance = account.credits;
        state
            .allocations
            .insert(allocation.transaction_id.0.clone(), allocation.clone());
        Ok(AllocationOutcome::Applied { new_balance })
    }

    async fn deduct(&self, user_id: &UserId, amount: Credits) -> Result<DeductOutcome, Error> {
        let mut state = self.state.lock().await;
        Ok(deduct_locked(&mut state, user_id, amount))
    }

    async fn record_generation(&self, generation: &Generation) -> Result<DeductOutcome, Error> {
        let mut state = self.state.lock().await;
        let outcome = deduct_locked(&mut state, &generation.user_id, generation.credits_deducted);
        if let DeductOutcome::Applied { .. } = outcome {
            state.generations.push(generation.clone());
        }
        Ok(outcome)
    }
}

fn deduct_locked(state: &mut State, user_id: &UserId, amount: Credits) -> DeductOutcome {
    match state.accounts.get_mut(&user_id.0) {
        None => DeductOutcome::UserNotFound,
        Some(account) if account.credits < amount => DeductOutcome::InsufficientCredits {
            current_credits: account.credits,
        },
        Some(account) => {
            let previous_credits = account.credits;
            account.credits -= amount;
            DeductOutcome::Applied {
                previous_credits,
                new_credits: account.credits,
            }
        }
    }
}
