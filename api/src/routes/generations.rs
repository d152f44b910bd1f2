use crate::error::{self, JsonResult};
use crate::state::RocketState;
use app::account::UserId;
use app::generation;
use chrono::{DateTime, Utc};
use rocket::{post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct GenerationRequest {
    /// The user the generation belongs to.
    user_id: String,
    /// Prompt the image was generated from.
    prompt: String,
    /// URL of the generated image, as returned by the provider.
    image_url: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct GenerationResponse {
    /// Unique generation record identifier.
    id: Uuid,
    /// Credits charged for this generation.
    credits_deducted: i64,
    /// Balance remaining after the charge.
    remaining_credits: i64,
    /// Record creation time.
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// A required field is missing or blank.
    MissingField,
    /// The balance does not cover the generation cost. No record was
    /// written.
    InsufficientCredits {
        current_credits: i64,
        required: i64,
    },
    /// The ledger store is unavailable; safe to retry.
    StorageUnavailable,
}

/// Record a completed image generation and charge its fixed credit cost.
/// The charge and the record are applied as one atomic unit.
#[openapi(tag = "Generations")]
#[post("/generations", data = "<req>")]
pub(super) async fn post(
    state: &State<RocketState>,
    req: Json<GenerationRequest>,
) -> JsonResult<GenerationResponse, Error> {
    let req = req.into_inner();
    if req.user_id.trim().is_empty() || req.prompt.trim().is_empty() || req.image_url.trim().is_empty()
    {
        return Err(error::bad_request(
            Error::MissingField,
            "missing user_id, prompt, or image_url".to_owned(),
        ));
    }
    match generation::charge(
        state.store.as_ref(),
        UserId(req.user_id),
        req.prompt,
        req.image_url,
    )
    .await
    {
        Ok(charged) => Ok(Json(GenerationResponse {
            id: charged.generation.id.0,
            credits_deducted: charged.generation.credits_deducted.0,
            remaining_credits: charged.remaining_credits.0,
            created_at: charged.generation.created,
        })),
        Err(generation::Error::InsufficientCredits {
            current_credits,
            required,
        }) => Err(error::bad_request(
            Error::InsufficientCredits {
                current_credits: current_credits.0,
                required: required.0,
            },
            "insufficient credits".to_owned(),
        )),
        Err(generation::Error::Storage(e)) => {
            log::error!("generation charge failed: {}", e);
            Err(error::storage_unavailable(Error::StorageUnavailable))
        }
    }
}
