use std::sync::Arc;

use crate::config::Config;
use mongodb::{bson::doc, options::IndexOptions, Client as MongoClient, Database, IndexModel};
use redis::aio::ConnectionManager;

use self::enrollment::{CourseProgress, HttpEnrollmentClient};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub redis: ConnectionManager,
    pub enrollment: Arc<dyn CourseProgress>,
}

impl AppState {
    pub async fn new(
        config: Config,
        mongo_client: MongoClient,
        redis_client: redis::Client,
    ) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Attempting to connect to Redis...");

        let redis = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            ConnectionManager::new(redis_client),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

        tracing::info!("Redis ConnectionManager created, testing with PING...");

        let mut conn = redis.clone();
        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

        tracing::info!("Redis connection established successfully");

        ensure_indexes(&mongo).await?;

        let enrollment: Arc<dyn CourseProgress> = Arc::new(HttpEnrollmentClient::new(
            config.enrollment_api_url.clone(),
        ));

        Ok(Self {
            config,
            mongo,
            redis,
            enrollment,
        })
    }
}

/// Creates the unique indexes that back the workflow invariants:
/// attempt numbering per (student, lesson), one certificate per
/// (student, course), and the public certificate token. Idempotent.
pub async fn ensure_indexes(db: &Database) -> anyhow::Result<()> {
    let attempts = db.collection::<mongodb::bson::Document>("quiz_attempts");
    attempts
        .create_index(
            IndexModel::builder()
                .keys(doc! { "student_id": 1, "lesson_id": 1, "attempt_number": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    let certificates = db.collection::<mongodb::bson::Document>("certificates");
    certificates
        .create_index(
            IndexModel::builder()
                .keys(doc! { "student_id": 1, "course_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    certificates
        .create_index(
            IndexModel::builder()
                .keys(doc! { "certificate_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    tracing::info!("Workflow indexes ensured");
    Ok(())
}

/// Mongo duplicate-key write error (code 11000), the signal that a
/// concurrent writer won a uniqueness race.
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) =
        *err.kind
    {
        return we.code == 11000;
    }
    false
}

pub mod certificate_service;
pub mod enrollment;
pub mod quiz_service;
pub mod webinar_service;
