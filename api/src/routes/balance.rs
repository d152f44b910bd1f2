use crate::error::{self, JsonResult};
use crate::state::RocketState;
use app::account::{self, UserId};
use rocket::{get, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct BalanceResponse {
    /// Current credit balance. Users without an account read as zero.
    credits: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// A required field is missing or blank.
    MissingField,
    /// The ledger store is unavailable; safe to retry.
    StorageUnavailable,
}

/// Get a user's current credit balance. Reading never creates an account.
#[openapi(tag = "Balance")]
#[get("/balance?<user_id>")]
pub(super) async fn get(
    state: &State<RocketState>,
    user_id: Option<String>,
) -> JsonResult<BalanceResponse, Error> {
    let user_id = match user_id {
        Some(user_id) if !user_id.trim().is_empty() => user_id,
        _ => {
            return Err(error::bad_request(
                Error::MissingField,
                "missing user_id".to_owned(),
            ))
        }
    };
    match account::balance(state.store.as_ref(), &UserId(user_id)).await {
        Ok(credits) => Ok(Json(BalanceResponse { credits: credits.0 })),
        Err(e) => {
            log::error!("balance check failed: {}", e);
            Err(error::storage_unavailable(Error::StorageUnavailable))
        }
    }
}
