use crate::account::UserId;
use crate::credits::Credits;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fixed cost of one image generation.
pub const GENERATION_COST: Credits = Credits(30);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Id(pub Uuid);

/// Record of a completed generation and the credits it consumed. Written
/// atomically with its deduction; a failed charge leaves no record.
#[derive(Debug, Clone)]
pub struct Generation {
    pub id: Id,
    pub user_id: UserId,
    pub prompt: String,
    pub image_url: String,
    pub credits_deducted: Credits,
    pub created: DateTime<Utc>,
}

impl Generation {
    pub(crate) fn new(user_id: UserId, prompt: String, image_url: String) -> Self {
        Self {
            id: Id(Uuid::new_v4()),
            user_id,
            prompt,
            image_url,
            credits_deducted: GENERATION_COST,
            created: Utc::now(),
        }
    }
}
