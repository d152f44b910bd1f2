//! Ledger behavior tests against the in-memory store, including the
//! concurrency properties the storage primitives guarantee.

use app::account::{self, UserId};
use app::allocation::{self, TransactionId};
use app::catalog::ProductCatalog;
use app::credits::Credits;
use app::deduction;
use app::generation;
use app::store::{LedgerStore, MemStore};
use std::collections::HashMap;
use std::sync::Arc;

const MONTHLY: &str = "com.suited.subscription.monthly";

fn user(id: &str) -> UserId {
    UserId(id.to_owned())
}

fn tx(id: &str) -> TransactionId {
    TransactionId(id.to_owned())
}

fn catalog_with(product_id: &str, credits: i64) -> ProductCatalog {
    ProductCatalog::new(HashMap::from([(product_id.to_owned(), credits)]))
}

async fn fund(store: &MemStore, user_id: &str, credits: i64) {
    let catalog = catalog_with("funding", credits);
    let grant = allocation::allocate(
        store,
        &catalog,
        user(user_id),
        tx(&format!("fund-{}", user_id)),
        "funding".to_owned(),
    )
    .await
    .unwrap();
    assert_eq!(grant.credits_allocated, Credits(credits));
}

#[tokio::test]
async fn allocate_then_balance_round_trip() {
    let store = MemStore::new();
    let catalog = ProductCatalog::default();

    let grant = allocation::allocate(
        &store,
        &catalog,
        user("u1"),
        tx("tx1"),
        MONTHLY.to_owned(),
    )
    .await
    .unwrap();
    assert_eq!(grant.credits_allocated, Credits(500));
    assert_eq!(grant.new_balance, Some(Credits(500)));
    assert_eq!(account::balance(&store, &user("u1")).await.unwrap(), Credits(500));

    // Redelivery of the same transaction id is a silent no-op.
    let repeat = allocation::allocate(
        &store,
        &catalog,
        user("u1"),
        tx("tx1"),
        MONTHLY.to_owned(),
    )
    .await
    .unwrap();
    assert_eq!(repeat.credits_allocated, Credits::ZERO);
    assert_eq!(repeat.new_balance, None);
    assert_eq!(account::balance(&store, &user("u1")).await.unwrap(), Credits(500));
    assert!(store.allocation(&tx("tx1")).await.is_some());
}

#[tokio::test]
async fn unknown_product_writes_nothing() {
    let store = MemStore::new();
    let result = allocation::allocate(
        &store,
        &ProductCatalog::default(),
        user("u1"),
        tx("tx1"),
        "com.suited.lifetime".to_owned(),
    )
    .await;
    assert!(matches!(result, Err(allocation::Error::InvalidProduct(_))));
    assert!(store.account(&user("u1")).await.unwrap().is_none());
    assert!(store.allocation(&tx("tx1")).await.is_none());
}

#[tokio::test]
async fn deduction_applies_in_full_or_not_at_all() {
    let store = MemStore::new();
    fund(&store, "u1", 500).await;

    let receipt = deduction::deduct(&store, &user("u1"), Credits(30)).await.unwrap();
    assert_eq!(receipt.previous_credits, Credits(500));
    assert_eq!(receipt.deducted, Credits(30));
    assert_eq!(receipt.new_credits, Credits(470));

    let result = deduction::deduct(&store, &user("u1"), Credits(1000)).await;
    match result {
        Err(deduction::Error::InsufficientCredits {
            current_credits,
            required,
        }) => {
            assert_eq!(current_credits, Credits(470));
            assert_eq!(required, Credits(1000));
        }
        other => panic!("expected insufficient credits, got {:?}", other),
    }
    assert_eq!(account::balance(&store, &user("u1")).await.unwrap(), Credits(470));
}

#[tokio::test]
async fn balance_reads_do_not_create_accounts() {
    let store = MemStore::new();
    assert_eq!(account::balance(&store, &user("ghost")).await.unwrap(), Credits::ZERO);
    assert!(store.account(&user("ghost")).await.unwrap().is_none());

    // A later allocation starts from a cleanly created zero-balance row.
    fund(&store, "ghost", 500).await;
    assert_eq!(
        account::balance(&store, &user("ghost")).await.unwrap(),
        Credits(500)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_allocations_apply_exactly_once() {
    let store = Arc::new(MemStore::new());
    let catalog = ProductCatalog::default();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let catalog = catalog.clone();
        handles.push(tokio::spawn(async move {
            allocation::allocate(
                store.as_ref(),
                &catalog,
                user("u1"),
                tx("tx1"),
                MONTHLY.to_owned(),
            )
            .await
            .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        let grant = handle.await.unwrap();
        if grant.credits_allocated != Credits::ZERO {
            assert_eq!(grant.credits_allocated, Credits(500));
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(
        account::balance(store.as_ref(), &user("u1")).await.unwrap(),
        Credits(500)
    );
    assert!(store.allocation(&tx("tx1")).await.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_deductions_never_go_negative() {
    let store = Arc::new(MemStore::new());
    fund(&store, "u1", 100).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            deduction::deduct(store.as_ref(), &user("u1"), Credits(30)).await
        }));
    }

    let mut deducted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                assert_eq!(receipt.deducted, Credits(30));
                deducted += 30;
            }
            Err(deduction::Error::InsufficientCredits { current_credits, .. }) => {
                assert!(current_credits >= Credits::ZERO);
            }
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    // 100 covers exactly three 30-credit deductions.
    assert_eq!(deducted, 90);
    assert_eq!(
        account::balance(store.as_ref(), &user("u1")).await.unwrap(),
        Credits(10)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn two_concurrent_spends_cannot_both_win_a_short_balance() {
    let store = Arc::new(MemStore::new());
    fund(&store, "u1", 30).await;

    let first = {
        let store = store.clone();
        tokio::spawn(async move { deduction::deduct(store.as_ref(), &user("u1"), Credits(20)).await })
    };
    let second = {
        let store = store.clone();
        tokio::spawn(async move { deduction::deduct(store.as_ref(), &user("u1"), Credits(20)).await })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1);
    assert_eq!(
        account::balance(store.as_ref(), &user("u1")).await.unwrap(),
        Credits(10)
    );
}

#[tokio::test]
async fn generation_charge_is_atomic_with_its_record() {
    let store = MemStore::new();
    fund(&store, "u1", 500).await;

    let charged = generation::charge(
        &store,
        user("u1"),
        "a suit on a beach".to_owned(),
        "https://img.example/1.png".to_owned(),
    )
    .await
    .unwrap();
    assert_eq!(charged.generation.credits_deducted, generation::GENERATION_COST);
    assert_eq!(charged.remaining_credits, Credits(470));

    let records = store.generations_for(&user("u1")).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prompt, "a suit on a beach");
}

#[tokio::test]
async fn failed_generation_charge_writes_no_record() {
    let store = MemStore::new();
    let result = generation::charge(
        &store,
        user("newcomer"),
        "prompt".to_owned(),
        "https://img.example/2.png".to_owned(),
    )
    .await;
    match result {
        Err(generation::Error::InsufficientCredits {
            current_credits,
            required,
        }) => {
            assert_eq!(current_credits, Credits::ZERO);
            assert_eq!(required, generation::GENERATION_COST);
        }
        other => panic!("expected insufficient credits, got {:?}", other),
    }
    assert!(store.generations_for(&user("newcomer")).await.is_empty());
    // The account row was still created, with a zero balance.
    let account = store.account(&user("newcomer")).await.unwrap().unwrap();
    assert_eq!(account.credits, Credits::ZERO);
}
