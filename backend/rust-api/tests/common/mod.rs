#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use mongodb::bson::doc;
use std::sync::Arc;

use skillmarket_api::{
    config::Config,
    create_router,
    error::ApiError,
    middlewares::auth::{JwtClaims, JwtService},
    services::{enrollment::CourseProgress, ensure_indexes, AppState},
};

pub const TEST_COURSE_ID: &str = "test-course";
pub const TEST_COURSE_TITLE: &str = "Test Course";

/// In-process stand-in for the enrollment/progress collaborator.
/// Completion is derived from the student id so each test controls its
/// own outcome: `halfway-*` students are at 40%, `unenrolled-*` students
/// have no enrollment, everyone else completed the course.
struct StubProgress;

#[async_trait]
impl CourseProgress for StubProgress {
    async fn completion(&self, student_id: &str, course_id: &str) -> Result<f64, ApiError> {
        if student_id.starts_with("unenrolled-") {
            return Err(ApiError::NotFound(format!(
                "No enrollment found for course {}",
                course_id
            )));
        }
        if student_id.starts_with("halfway-") {
            return Ok(40.0);
        }
        Ok(100.0)
    }
}

pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    // Tests share one "unknown" client IP, so the per-IP window would
    // trip across unrelated tests. Per-user limits stay at the default.
    std::env::set_var("RATE_LIMIT_PER_IP", "1000000");

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let redis_client =
        redis::Client::open(config.redis_uri.clone()).expect("Failed to create test Redis client");
    let redis = redis::aio::ConnectionManager::new(redis_client)
        .await
        .expect("Failed to connect to test Redis");

    let mongo = mongo_client.database(&config.mongo_database);
    ensure_indexes(&mongo).await.expect("Failed to ensure indexes");

    seed_test_data(&mongo).await;

    // Assembled by hand instead of AppState::new so the enrollment
    // collaborator can be stubbed in-process.
    let app_state = Arc::new(AppState {
        config,
        mongo,
        redis,
        enrollment: Arc::new(StubProgress),
    });

    create_router(app_state)
}

/// Direct handle to the test database for seeding and assertions.
pub async fn test_database() -> mongodb::Database {
    dotenvy::from_filename(".env.test").ok();
    let config = Config::load().expect("Failed to load test configuration");
    let client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");
    client.database(&config.mongo_database)
}

async fn seed_test_data(db: &mongodb::Database) {
    let courses = db.collection::<mongodb::bson::Document>("courses");

    let exists = courses
        .find_one(doc! { "_id": TEST_COURSE_ID })
        .await
        .unwrap();

    if exists.is_none() {
        let result = courses
            .insert_one(doc! {
                "_id": TEST_COURSE_ID,
                "title": TEST_COURSE_TITLE,
            })
            .await;

        match result {
            Ok(_) => {}
            Err(e) => {
                // Ignore duplicate key error (race with parallel tests)
                if !is_duplicate(&e) {
                    panic!("Failed to seed test course: {:?}", e);
                }
            }
        }
    }
}

/// Inserts a user document so certificate issuance can resolve the
/// display name. Duplicates from parallel tests are ignored.
pub async fn seed_student(db: &mongodb::Database, student_id: &str, name: &str) {
    let users = db.collection::<mongodb::bson::Document>("users");
    let result = users
        .insert_one(doc! {
            "_id": student_id,
            "name": name,
            "email": format!("{}@example.com", student_id),
            "role": "student",
        })
        .await;

    if let Err(e) = result {
        if !is_duplicate(&e) {
            panic!("Failed to seed test user: {:?}", e);
        }
    }
}

fn is_duplicate(e: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) =
        *e.kind
    {
        return we.code == 11000;
    }
    false
}

/// Mints a Bearer token the app's auth middleware will accept.
pub fn auth_header(user_id: &str, role: &str) -> String {
    dotenvy::from_filename(".env.test").ok();
    let config = Config::load().expect("Failed to load test configuration");
    let service = JwtService::new(&config.jwt_secret);

    let claims = JwtClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iat: chrono::Utc::now().timestamp() as usize,
    };

    let token = service.generate_token(claims).expect("Failed to mint token");
    format!("Bearer {}", token)
}
