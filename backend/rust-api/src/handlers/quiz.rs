use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{AppJson, CurrentUser};
use crate::models::quiz::SubmitQuizRequest;
use crate::response::ApiResponse;
use crate::services::{quiz_service::QuizService, AppState};

pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    tracing::info!(
        "Quiz submission: student={}, lesson={}",
        user.user_id,
        req.lesson_id
    );

    let service = QuizService::new(state.mongo.clone());
    let attempt = service.submit_quiz(&user.user_id, &req).await?;

    Ok(ApiResponse::created("Quiz submitted successfully", attempt))
}

pub async fn my_results(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = QuizService::new(state.mongo.clone());
    let attempts = service.get_student_results(&user.user_id, &course_id).await?;

    Ok(ApiResponse::ok("Quiz results fetched", attempts))
}
