use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{AppJson, CurrentUser};
use crate::models::webinar::CreateWebinarRequest;
use crate::response::ApiResponse;
use crate::services::{webinar_service::WebinarService, AppState};

pub async fn create_webinar(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(req): AppJson<CreateWebinarRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let service = WebinarService::new(state.mongo.clone());
    let webinar = service.create_webinar(&user.user_id, &req).await?;

    Ok(ApiResponse::created("Webinar created", webinar))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(webinar_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = WebinarService::new(state.mongo.clone());
    let result = service.register(&webinar_id, &user.user_id).await?;

    let message = if result.already_registered {
        "Already registered for this webinar"
    } else {
        "Registered for webinar"
    };

    Ok(ApiResponse::ok(message, result))
}
