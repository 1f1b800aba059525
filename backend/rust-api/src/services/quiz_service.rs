use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Database};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{track_db_operation, QUIZ_SUBMISSIONS_TOTAL};
use crate::models::quiz::{QuizAttempt, SubmitQuizRequest, SubmittedAnswer};
use crate::services::is_duplicate_key_error;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Fixed pass threshold; deliberately not per-course configuration.
pub const PASS_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizScore {
    pub total_score: i64,
    pub max_score: i64,
    pub percentage: f64,
    pub passed: bool,
}

/// Scores a graded answer set. Rejects empty and zero-point sets so the
/// percentage is always well defined, and negative point values outright.
pub fn score_answers(answers: &[SubmittedAnswer]) -> Result<QuizScore, ApiError> {
    if answers.is_empty() {
        return Err(ApiError::Validation(
            "Submission must contain at least one answer".to_string(),
        ));
    }
    if answers.iter().any(|a| a.points < 0) {
        return Err(ApiError::Validation(
            "Answer points must not be negative".to_string(),
        ));
    }

    let max_score: i64 = answers.iter().map(|a| a.points).sum();
    if max_score == 0 {
        return Err(ApiError::Validation(
            "Submission has zero total points, cannot compute a score".to_string(),
        ));
    }

    let total_score: i64 = answers
        .iter()
        .filter(|a| a.is_correct)
        .map(|a| a.points)
        .sum();
    let percentage = total_score as f64 / max_score as f64 * 100.0;

    Ok(QuizScore {
        total_score,
        max_score,
        percentage,
        passed: percentage >= PASS_THRESHOLD,
    })
}

pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Persists one immutable attempt. The attempt number is the prior
    /// attempt count for (student, lesson) + 1; the unique compound index
    /// turns a concurrent duplicate into a duplicate-key error, and the
    /// recount inside the retry loop picks up the winner's insert. N
    /// concurrent submissions end up numbered 1..N.
    pub async fn submit_quiz(
        &self,
        student_id: &str,
        req: &SubmitQuizRequest,
    ) -> Result<QuizAttempt, ApiError> {
        let score = score_answers(&req.answers)?;

        tracing::info!(
            "Processing quiz submission: student={}, lesson={}, course={}, score={}/{}",
            student_id,
            req.lesson_id,
            req.course_id,
            score.total_score,
            score.max_score
        );

        let collection = self.mongo.collection::<QuizAttempt>("quiz_attempts");
        let counting_filter = doc! {
            "student_id": student_id,
            "lesson_id": &req.lesson_id,
        };

        let result = retry_async_with_config(RetryConfig::contended_insert(), || async {
            let prior = track_db_operation(
                "count",
                "quiz_attempts",
                collection.count_documents(counting_filter.clone()),
            )
            .await?;

            let attempt = QuizAttempt {
                id: Uuid::new_v4().to_string(),
                student_id: student_id.to_string(),
                lesson_id: req.lesson_id.clone(),
                course_id: req.course_id.clone(),
                answers: req.answers.clone(),
                total_score: score.total_score,
                max_score: score.max_score,
                percentage: score.percentage,
                passed: score.passed,
                attempt_number: prior as u32 + 1,
                submitted_at: Utc::now(),
            };

            track_db_operation("insert", "quiz_attempts", collection.insert_one(&attempt))
                .await?;
            Ok::<_, mongodb::error::Error>(attempt)
        })
        .await;

        let attempt = match result {
            Ok(attempt) => attempt,
            Err(e) if is_duplicate_key_error(&e) => {
                // Retries exhausted while losing the numbering race.
                return Err(ApiError::Conflict(
                    "Concurrent submissions for this lesson, please retry".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        QUIZ_SUBMISSIONS_TOTAL
            .with_label_values(&[if attempt.passed { "true" } else { "false" }])
            .inc();

        tracing::info!(
            "Attempt saved: student={}, lesson={}, attempt_number={}, passed={}",
            student_id,
            req.lesson_id,
            attempt.attempt_number,
            attempt.passed
        );

        Ok(attempt)
    }

    /// All attempts of a student within a course, newest first.
    pub async fn get_student_results(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Vec<QuizAttempt>, ApiError> {
        let collection = self.mongo.collection::<QuizAttempt>("quiz_attempts");

        let attempts: Vec<QuizAttempt> = track_db_operation("find", "quiz_attempts", async {
            collection
                .find(doc! { "student_id": student_id, "course_id": course_id })
                .sort(doc! { "submitted_at": -1 })
                .await?
                .try_collect()
                .await
        })
        .await?;

        Ok(attempts)
    }
}
