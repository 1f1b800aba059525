use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ApiError;
use crate::middlewares::auth::JwtClaims;
use crate::response::ApiResponse;

/// JSON extractor that turns body parse failures into the uniform
/// envelope instead of axum's plain-text rejection.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = format!("Failed to parse JSON request body: {}", rejection);
                tracing::warn!("{}", message);
                Err(ApiResponse::error(StatusCode::BAD_REQUEST, message).into_response())
            }
        }
    }
}

/// Authenticated caller, extracted from the JWT claims that
/// `auth_middleware` stores in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub role: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<JwtClaims>() {
            Some(claims) => Ok(CurrentUser {
                user_id: claims.sub.clone(),
                role: claims.role.clone(),
            }),
            None => Err(ApiError::Unauthorized.into_response()),
        }
    }
}
