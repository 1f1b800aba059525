use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Answer payload, tagged by question type so the shape can be validated
/// server-side instead of arriving as an untyped blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    SingleChoice(String),
    MultiChoice(Vec<String>),
    FreeText(String),
}

/// One graded answer inside a submission. Grading currently happens on
/// the client; `is_correct` and `points` are taken as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: AnswerValue,
    pub is_correct: bool,
    pub points: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, message = "lesson_id is required"))]
    pub lesson_id: String,
    #[validate(length(min = 1, message = "course_id is required"))]
    pub course_id: String,
    #[validate(length(min = 1, message = "answers must not be empty"))]
    pub answers: Vec<SubmittedAnswer>,
}

/// Immutable record of one quiz submission. Never updated after insert;
/// `attempt_number` is unique per (student, lesson) via a compound index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub lesson_id: String,
    pub course_id: String,
    pub answers: Vec<SubmittedAnswer>,
    pub total_score: i64,
    pub max_score: i64,
    pub percentage: f64,
    pub passed: bool,
    pub attempt_number: u32,
    pub submitted_at: DateTime<Utc>,
}
