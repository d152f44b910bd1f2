use crate::error::{self, JsonResult};
use crate::state::RocketState;
use app::account::UserId;
use app::allocation::{self, TransactionId};
use rocket::{post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct AllocationRequest {
    /// The user receiving the credits.
    user_id: String,
    /// External transaction identifier issued by the payment platform.
    /// Credits are granted at most once per id, so redelivered receipts
    /// are safe to post again.
    transaction_id: String,
    /// Purchased product identifier, resolved against the catalog.
    product_id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct AllocationResponse {
    /// Credits granted by this call. Zero if the transaction id had
    /// already been processed.
    credits_allocated: i64,
    /// Balance after the grant. Absent when the transaction id had already
    /// been processed.
    new_balance: Option<i64>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// A required field is missing or blank.
    MissingField,
    /// The product id is not in the catalog.
    InvalidProduct,
    /// The ledger store is unavailable; safe to retry.
    StorageUnavailable,
}

/// Grant a product's credits to a user, at most once per transaction id.
#[openapi(tag = "Allocations")]
#[post("/allocations", data = "<req>")]
pub(super) async fn post(
    state: &State<RocketState>,
    req: Json<AllocationRequest>,
) -> JsonResult<AllocationResponse, Error> {
    let req = req.into_inner();
    if req.user_id.trim().is_empty()
        || req.transaction_id.trim().is_empty()
        || req.product_id.trim().is_empty()
    {
        return Err(error::bad_request(
            Error::MissingField,
            "missing user_id, transaction_id, or product_id".to_owned(),
        ));
    }
    match allocation::allocate(
        state.store.as_ref(),
        &state.catalog,
        UserId(req.user_id),
        TransactionId(req.transaction_id),
        req.product_id,
    )
    .await
    {
        Ok(grant) => Ok(Json(AllocationResponse {
            credits_allocated: grant.credits_allocated.0,
            new_balance: grant.new_balance.map(|credits| credits.0),
        })),
        Err(allocation::Error::InvalidProduct(product_id)) => Err(error::bad_request(
            Error::InvalidProduct,
            format!("unknown product: {}", product_id),
        )),
        Err(allocation::Error::Storage(e)) => {
            log::error!("allocation failed: {}", e);
            Err(error::storage_unavailable(Error::StorageUnavailable))
        }
    }
}
