use crate::error::{self, JsonResult};
use crate::state::RocketState;
use app::account::UserId;
use app::credits::Credits;
use app::deduction;
use rocket::{post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct DeductionRequest {
    /// The user to charge.
    user_id: String,
    /// Credits to deduct. Must be positive.
    amount: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct DeductionResponse {
    /// Balance before the deduction.
    previous_credits: i64,
    /// Credits deducted by this call.
    deducted: i64,
    /// Balance after the deduction.
    new_credits: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// A required field is missing or blank.
    MissingField,
    /// Amount must be positive.
    AmountNotPositive,
    /// No account exists for this user.
    UserNotFound,
    /// The balance does not cover the requested amount. Nothing was
    /// deducted.
    InsufficientCredits {
        current_credits: i64,
        required: i64,
    },
    /// The ledger store is unavailable; safe to retry.
    StorageUnavailable,
}

/// Deduct credits from a user's balance. The deduction either applies in
/// full or not at all; balances never go negative.
#[openapi(tag = "Deductions")]
#[post("/deductions", data = "<req>")]
pub(super) async fn post(
    state: &State<RocketState>,
    req: Json<DeductionRequest>,
) -> JsonResult<DeductionResponse, Error> {
    let req = req.into_inner();
    if req.user_id.trim().is_empty() {
        return Err(error::bad_request(
            Error::MissingField,
            "missing user_id".to_owned(),
        ));
    }
    match deduction::deduct(state.store.as_ref(), &UserId(req.user_id), Credits(req.amount)).await {
        Ok(receipt) => Ok(Json(DeductionResponse {
            previous_credits: receipt.previous_credits.0,
            deducted: receipt.deducted.0,
            new_credits: receipt.new_credits.0,
        })),
        Err(deduction::Error::AmountNotPositive) => Err(error::bad_request(
            Error::AmountNotPositive,
            "amount must be positive".to_owned(),
        )),
        Err(deduction::Error::UserNotFound) => Err(error::bad_request(
            Error::UserNotFound,
            "user not found".to_owned(),
        )),
        Err(deduction::Error::InsufficientCredits {
            current_credits,
            required,
        }) => Err(error::bad_request(
            Error::InsufficientCredits {
                current_credits: current_credits.0,
                required: required.0,
            },
            "insufficient credits".to_owned(),
        )),
        Err(deduction::Error::Storage(e)) => {
            log::error!("deduction failed: {}", e);
            Err(error::storage_unavailable(Error::StorageUnavailable))
        }
    }
}
