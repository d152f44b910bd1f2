//! HTTP surface tests over the in-memory ledger store.

use app::catalog::ProductCatalog;
use app::store::MemStore;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::{json, Value};
use std::sync::Arc;

const MONTHLY: &str = "com.suited.subscription.monthly";

fn client() -> Client {
    let rocket = api::register(
        rocket::build(),
        Arc::new(MemStore::new()),
        ProductCatalog::default(),
    );
    Client::tracked(rocket).unwrap()
}

fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    let body = serde_json::from_str(&response.into_string().unwrap()).unwrap();
    (status, body)
}

fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri).dispatch();
    let status = response.status();
    let body = serde_json::from_str(&response.into_string().unwrap()).unwrap();
    (status, body)
}

fn allocate(client: &Client, user_id: &str, transaction_id: &str, product_id: &str) -> (Status, Value) {
    post_json(
        client,
        "/v0/allocations",
        json!({
            "user_id": user_id,
            "transaction_id": transaction_id,
            "product_id": product_id,
        }),
    )
}

#[test]
fn allocation_and_balance_flow() {
    let client = client();

    let (status, body) = allocate(&client, "u1", "tx1", MONTHLY);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["credits_allocated"], 500);
    assert_eq!(body["new_balance"], 500);

    let (status, body) = get_json(&client, "/v0/balance?user_id=u1");
    assert_eq!(status, Status::Ok);
    assert_eq!(body["credits"], 500);

    // Redelivered receipt: no additional credits, balance unchanged.
    let (status, body) = allocate(&client, "u1", "tx1", MONTHLY);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["credits_allocated"], 0);
    assert_eq!(body["new_balance"], Value::Null);

    let (_, body) = get_json(&client, "/v0/balance?user_id=u1");
    assert_eq!(body["credits"], 500);
}

#[test]
fn unknown_product_is_rejected() {
    let client = client();
    let (status, body) = allocate(&client, "u1", "tx1", "com.suited.lifetime");
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"]["status"], "INVALID_PRODUCT");

    let (_, body) = get_json(&client, "/v0/balance?user_id=u1");
    assert_eq!(body["credits"], 0);
}

#[test]
fn blank_fields_are_rejected() {
    let client = client();
    let (status, body) = allocate(&client, "", "tx1", MONTHLY);
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"]["status"], "MISSING_FIELD");

    let (status, body) = get_json(&client, "/v0/balance");
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"]["status"], "MISSING_FIELD");
}

#[test]
fn deduction_flow() {
    let client = client();
    allocate(&client, "u1", "tx1", MONTHLY);

    let (status, body) = post_json(
        &client,
        "/v0/deductions",
        json!({ "user_id": "u1", "amount": 30 }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(body["previous_credits"], 500);
    assert_eq!(body["deducted"], 30);
    assert_eq!(body["new_credits"], 470);

    let (status, body) = post_json(
        &client,
        "/v0/deductions",
        json!({ "user_id": "u1", "amount": 1000 }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(
        body["error"]["status"]["INSUFFICIENT_CREDITS"],
        json!({ "current_credits": 470, "required": 1000 })
    );

    let (_, body) = get_json(&client, "/v0/balance?user_id=u1");
    assert_eq!(body["credits"], 470);
}

#[test]
fn deduction_input_errors() {
    let client = client();

    let (status, body) = post_json(
        &client,
        "/v0/deductions",
        json!({ "user_id": "nobody", "amount": 10 }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"]["status"], "USER_NOT_FOUND");

    let (status, body) = post_json(
        &client,
        "/v0/deductions",
        json!({ "user_id": "u1", "amount": 0 }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"]["status"], "AMOUNT_NOT_POSITIVE");
}

#[test]
fn generation_charges_fixed_cost() {
    let client = client();
    allocate(&client, "u1", "tx1", MONTHLY);

    let (status, body) = post_json(
        &client,
        "/v0/generations",
        json!({
            "user_id": "u1",
            "prompt": "a suit on a beach",
            "image_url": "https://img.example/1.png",
        }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(body["credits_deducted"], 30);
    assert_eq!(body["remaining_credits"], 470);

    // A brand-new user has no credits to charge.
    let (status, body) = post_json(
        &client,
        "/v0/generations",
        json!({
            "user_id": "newcomer",
            "prompt": "prompt",
            "image_url": "https://img.example/2.png",
        }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(
        body["error"]["status"]["INSUFFICIENT_CREDITS"],
        json!({ "current_credits": 0, "required": 30 })
    );
}
