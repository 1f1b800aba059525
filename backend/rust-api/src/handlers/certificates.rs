use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{AppJson, CurrentUser};
use crate::models::certificate::GenerateCertificateRequest;
use crate::response::ApiResponse;
use crate::services::{certificate_service::CertificateService, AppState};

pub async fn generate_certificate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(req): AppJson<GenerateCertificateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    tracing::info!(
        "Certificate generation request: student={}, course={}",
        user.user_id,
        req.course_id
    );

    let service = CertificateService::new(state.mongo.clone(), state.enrollment.clone());
    let certificate = service
        .generate_certificate(&user.user_id, &req.course_id)
        .await?;

    Ok(ApiResponse::ok("Certificate ready", certificate))
}

pub async fn my_certificates(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let service = CertificateService::new(state.mongo.clone(), state.enrollment.clone());
    let certificates = service.get_student_certificates(&user.user_id).await?;

    Ok(ApiResponse::ok("Certificates fetched", certificates))
}

/// Public endpoint: no auth, same payload for every caller.
pub async fn verify_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CertificateService::new(state.mongo.clone(), state.enrollment.clone());
    let verification = service.verify_certificate(&certificate_id).await?;

    Ok(ApiResponse::ok("Certificate is valid", verification))
}
