use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;

/// Enrollment/progress collaborator: tracks a student's percent-complete
/// per course. Certificate issuance depends on it; behind a trait so
/// tests can stand in a local stub.
#[async_trait]
pub trait CourseProgress: Send + Sync {
    /// Completion percentage in [0, 100] for (student, course).
    async fn completion(&self, student_id: &str, course_id: &str) -> Result<f64, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    completion: f64,
}

pub struct HttpEnrollmentClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEnrollmentClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CourseProgress for HttpEnrollmentClient {
    async fn completion(&self, student_id: &str, course_id: &str) -> Result<f64, ApiError> {
        let url = format!(
            "{}/internal/progress/{}/{}",
            self.base_url, student_id, course_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Enrollment service unreachable")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!(
                "No enrollment found for course {}",
                course_id
            )));
        }

        if !response.status().is_success() {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "Enrollment service returned {}",
                response.status()
            )));
        }

        let progress: ProgressResponse = response
            .json()
            .await
            .context("Malformed enrollment service response")?;

        Ok(progress.completion)
    }
}
