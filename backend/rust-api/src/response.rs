use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Uniform response envelope. Every endpoint, success or failure, wraps
/// its payload in this shape so the storefront can handle responses
/// generically.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: StatusCode::CREATED.as_u16(),
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Failure envelope; `data` is always absent on errors.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let resp = ApiResponse::ok("fetched", serde_json::json!({"x": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "fetched");
        assert_eq!(json["data"]["x"], 1);
    }

    #[test]
    fn error_envelope_has_no_data() {
        let resp = ApiResponse::error(StatusCode::NOT_FOUND, "missing");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
    }
}
