mod common;

use axum::body::to_bytes;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

async fn generate(app: Router, token: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/certificates/generate")
                .header("content-type", "application/json")
                .header("authorization", token)
                .body(Body::from(
                    serde_json::to_string(&json!({ "course_id": common::TEST_COURSE_ID })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn verify(app: Router, certificate_id: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/certificates/verify/{}", certificate_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn completed_course_yields_verifiable_certificate() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("student-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "Grace Hopper").await;
    let token = common::auth_header(&student, "student");

    let (status, body) = generate(app.clone(), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let certificate_id = body["data"]["certificate_id"].as_str().unwrap().to_string();
    assert!(certificate_id.starts_with("CERT-"));

    // Public verification, no auth header
    let (status, body) = verify(app, &certificate_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["certificate_id"], certificate_id);
    assert_eq!(body["data"]["student_name"], "Grace Hopper");
    assert_eq!(body["data"]["course_title"], common::TEST_COURSE_TITLE);
    // Minimal payload: nothing internal leaks
    assert!(body["data"].get("student_id").is_none());
    assert!(body["data"].get("email").is_none());
}

#[tokio::test]
async fn generation_is_idempotent() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("student-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "Repeat Caller").await;
    let token = common::auth_header(&student, "student");

    let (status, first) = generate(app.clone(), &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = generate(app, &token).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        first["data"]["certificate_id"],
        second["data"]["certificate_id"]
    );
}

#[tokio::test]
async fn concurrent_generation_yields_one_certificate() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("student-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "Racy Caller").await;
    let token = common::auth_header(&student, "student");

    let calls = (0..2).map(|_| generate(app.clone(), &token));
    let results = futures::future::join_all(calls).await;

    let ids: Vec<String> = results
        .iter()
        .map(|(status, body)| {
            assert_eq!(*status, StatusCode::OK, "generation failed: {}", body);
            body["data"]["certificate_id"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(ids[0], ids[1]);

    let stored = db
        .collection::<mongodb::bson::Document>("certificates")
        .count_documents(mongodb::bson::doc! { "student_id": &student })
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn incomplete_course_is_precondition_failed() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("halfway-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "Half Way").await;
    let token = common::auth_header(&student, "student");

    let (status, body) = generate(app, &token).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["statusCode"], 412);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_enrollment_is_not_found() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("unenrolled-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "No Enrollment").await;
    let token = common::auth_header(&student, "student");

    let (status, body) = generate(app, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_certificate_verification_is_not_found() {
    let app = common::create_test_app().await;

    let (status, body) = verify(app, "CERT-DOESNOTEXIST").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}

/// Reads one counter sample out of the Prometheus text exposition.
fn counter_value(metrics_text: &str, sample: &str) -> f64 {
    metrics_text
        .lines()
        .find(|line| line.starts_with(sample))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0.0)
}

#[tokio::test]
async fn verification_outcomes_are_counted() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("student-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "Counted Caller").await;
    let token = common::auth_header(&student, "student");

    let (status, generated) = generate(app.clone(), &token).await;
    assert_eq!(status, StatusCode::OK);
    let certificate_id = generated["data"]["certificate_id"].as_str().unwrap();

    let before = skillmarket_api::metrics::render_metrics().unwrap();
    let hits_before = counter_value(&before, "certificate_verifications_total{result=\"hit\"}");
    let misses_before = counter_value(&before, "certificate_verifications_total{result=\"miss\"}");

    let (status, _) = verify(app.clone(), certificate_id).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = verify(app, "CERT-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let after = skillmarket_api::metrics::render_metrics().unwrap();
    assert!(
        counter_value(&after, "certificate_verifications_total{result=\"hit\"}")
            >= hits_before + 1.0
    );
    assert!(
        counter_value(&after, "certificate_verifications_total{result=\"miss\"}")
            >= misses_before + 1.0
    );
}

#[tokio::test]
async fn my_certificates_lists_issued_ones() {
    let app = common::create_test_app().await;
    let db = common::test_database().await;
    let student = format!("student-{}", Uuid::new_v4());
    common::seed_student(&db, &student, "List Owner").await;
    let token = common::auth_header(&student, "student");

    let (status, generated) = generate(app.clone(), &token).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/certificates/my")
                .header("authorization", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let certificates = json["data"].as_array().unwrap();
    assert_eq!(certificates.len(), 1);
    assert_eq!(
        certificates[0]["certificate_id"],
        generated["data"]["certificate_id"]
    );
}
