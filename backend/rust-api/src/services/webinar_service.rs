use chrono::Utc;
use mongodb::{
    bson::{doc, Bson},
    Database,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{track_db_operation, WEBINAR_REGISTRATIONS_TOTAL};
use crate::models::webinar::{CreateWebinarRequest, RegistrationResult, Webinar};

pub struct WebinarService {
    mongo: Database,
}

impl WebinarService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create_webinar(
        &self,
        host_id: &str,
        req: &CreateWebinarRequest,
    ) -> Result<Webinar, ApiError> {
        let webinar = Webinar {
            id: Uuid::new_v4().to_string(),
            title: req.title.clone(),
            description: req.description.clone(),
            host_id: host_id.to_string(),
            starts_at: req.starts_at,
            capacity: req.capacity,
            seats_remaining: req.capacity,
            participants: Vec::new(),
            created_at: Utc::now(),
        };

        track_db_operation(
            "insert",
            "webinars",
            self.mongo
                .collection::<Webinar>("webinars")
                .insert_one(&webinar),
        )
        .await?;

        tracing::info!(
            "Webinar created: id={}, host={}, capacity={:?}",
            webinar.id,
            host_id,
            webinar.capacity
        );

        Ok(webinar)
    }

    /// Registers a user via a single atomic document update: the filter
    /// excludes users already on the list and (for capacity-limited
    /// webinars) documents without a free seat, so seats can never be
    /// oversold and nobody is counted twice. Only when the update matches
    /// nothing do we reload the document to find out why.
    pub async fn register(
        &self,
        webinar_id: &str,
        user_id: &str,
    ) -> Result<RegistrationResult, ApiError> {
        let webinars = self.mongo.collection::<Webinar>("webinars");

        // Limited webinars: take a seat while joining.
        let limited = track_db_operation(
            "update",
            "webinars",
            webinars.update_one(
                doc! {
                    "_id": webinar_id,
                    "participants": { "$ne": user_id },
                    "seats_remaining": { "$gt": 0 },
                },
                doc! {
                    "$push": { "participants": user_id },
                    "$inc": { "seats_remaining": -1 },
                },
            ),
        )
        .await?;

        let mut registered = limited.modified_count > 0;

        if !registered {
            // Unlimited webinars carry no seat counter to decrement.
            let unlimited = track_db_operation(
                "update",
                "webinars",
                webinars.update_one(
                    doc! {
                        "_id": webinar_id,
                        "participants": { "$ne": user_id },
                        "seats_remaining": Bson::Null,
                    },
                    doc! { "$push": { "participants": user_id } },
                ),
            )
            .await?;
            registered = unlimited.modified_count > 0;
        }

        let webinar = track_db_operation(
            "find",
            "webinars",
            webinars.find_one(doc! { "_id": webinar_id }),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Webinar {} not found", webinar_id)))?;

        if registered {
            WEBINAR_REGISTRATIONS_TOTAL
                .with_label_values(&["registered"])
                .inc();
            tracing::info!("Webinar registration: webinar={}, user={}", webinar_id, user_id);
            return Ok(RegistrationResult {
                webinar_id: webinar_id.to_string(),
                already_registered: false,
                seats_remaining: webinar.seats_remaining,
            });
        }

        if webinar.participants.iter().any(|p| p == user_id) {
            // Idempotent: a second registration is a no-op.
            WEBINAR_REGISTRATIONS_TOTAL
                .with_label_values(&["already_registered"])
                .inc();
            return Ok(RegistrationResult {
                webinar_id: webinar_id.to_string(),
                already_registered: true,
                seats_remaining: webinar.seats_remaining,
            });
        }

        WEBINAR_REGISTRATIONS_TOTAL
            .with_label_values(&["sold_out"])
            .inc();
        Err(ApiError::Conflict(format!(
            "Webinar {} has no seats remaining",
            webinar_id
        )))
    }
}
