use rocket::{http::Status, serde::json::Json};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct Error<E: Serialize> {
    pub error: Inner<E>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Inner<E: Serialize> {
    pub code: u16,
    pub description: String,
    pub reason: Option<&'static str>,
    pub status: E,
}

impl<E: Serialize> Error<E> {
    fn new(http_status: Status, description: String, error: E) -> Self {
        Self {
            error: Inner {
                code: http_status.code,
                description,
                reason: http_status.reason(),
                status: error,
            },
        }
    }
}

pub type JsonError<E> = (Status, Json<Error<E>>);

pub type JsonResult<T, E> = Result<Json<T>, JsonError<E>>;

pub fn bad_request<E: Serialize>(error: E, description: String) -> JsonError<E> {
    (
        Status::BadRequest,
        Json(Error::new(Status::BadRequest, description, error)),
    )
}

/// The ledger store could not be reached or timed out. Idempotency holds at
/// the store, so callers may retry the whole request.
pub fn storage_unavailable<E: Serialize>(error: E) -> JsonError<E> {
    (
        Status::ServiceUnavailable,
        Json(Error::new(
            Status::ServiceUnavailable,
            "the ledger store is unavailable, please retry".to_owned(),
            error,
        )),
    )
}
