use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Webinar with optional seat limit. `seats_remaining` mirrors `capacity`
/// at creation and is only ever changed by the atomic registration
/// update, so it can never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webinar {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub host_id: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: Option<i64>,
    pub seats_remaining: Option<i64>,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebinarRequest {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResult {
    pub webinar_id: String,
    pub already_registered: bool,
    pub seats_remaining: Option<i64>,
}
