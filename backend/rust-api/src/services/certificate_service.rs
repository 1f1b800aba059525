use std::sync::Arc;

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Database};
use rand::RngCore;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{
    track_db_operation, CERTIFICATES_ISSUED_TOTAL, CERTIFICATE_VERIFICATIONS_TOTAL,
};
use crate::models::certificate::{Certificate, CertificateVerification};
use crate::models::{Course, User};
use crate::services::enrollment::CourseProgress;
use crate::services::is_duplicate_key_error;

const COMPLETION_REQUIRED: f64 = 100.0;

/// Mints a public verification token: CERT- plus 48 random bits as
/// uppercase hex. Non-sequential on purpose.
fn mint_certificate_id() -> String {
    let mut bytes = [0u8; 6];
    rand::rng().fill_bytes(&mut bytes);
    format!("CERT-{}", hex::encode_upper(bytes))
}

pub struct CertificateService {
    mongo: Database,
    enrollment: Arc<dyn CourseProgress>,
}

impl CertificateService {
    pub fn new(mongo: Database, enrollment: Arc<dyn CourseProgress>) -> Self {
        Self { mongo, enrollment }
    }

    /// Issues a certificate for a completed course, or returns the one
    /// already issued. The (student, course) unique index is the
    /// idempotency guard: whichever concurrent caller loses the insert
    /// race reads back the winner's certificate.
    pub async fn generate_certificate(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Certificate, ApiError> {
        let certificates = self.mongo.collection::<Certificate>("certificates");
        let pair_filter = doc! { "student_id": student_id, "course_id": course_id };

        if let Some(existing) = track_db_operation(
            "find",
            "certificates",
            certificates.find_one(pair_filter.clone()),
        )
        .await?
        {
            tracing::info!(
                "Certificate already issued: student={}, course={}, certificate_id={}",
                student_id,
                course_id,
                existing.certificate_id
            );
            CERTIFICATES_ISSUED_TOTAL
                .with_label_values(&["existing"])
                .inc();
            return Ok(existing);
        }

        let completion = self.enrollment.completion(student_id, course_id).await?;
        if completion < COMPLETION_REQUIRED {
            return Err(ApiError::PreconditionFailed(format!(
                "Course completion is {:.0}%, certificate requires 100%",
                completion
            )));
        }

        let course = track_db_operation(
            "find",
            "courses",
            self.mongo
                .collection::<Course>("courses")
                .find_one(doc! { "_id": course_id }),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;

        let student = track_db_operation(
            "find",
            "users",
            self.mongo
                .collection::<User>("users")
                .find_one(doc! { "_id": student_id }),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Student account not found".to_string()))?;

        // Two mint attempts: the second only fires on a certificate_id
        // hex collision, which leaves the (student, course) slot free.
        for _ in 0..2 {
            let certificate = Certificate {
                id: Uuid::new_v4().to_string(),
                certificate_id: mint_certificate_id(),
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
                student_name: student.name.clone(),
                course_title: course.title.clone(),
                issued_at: Utc::now(),
            };

            match track_db_operation("insert", "certificates", certificates.insert_one(&certificate))
                .await
            {
                Ok(_) => {
                    tracing::info!(
                        "Certificate issued: student={}, course={}, certificate_id={}",
                        student_id,
                        course_id,
                        certificate.certificate_id
                    );
                    CERTIFICATES_ISSUED_TOTAL.with_label_values(&["new"]).inc();
                    return Ok(certificate);
                }
                Err(e) if is_duplicate_key_error(&e) => {
                    if let Some(winner) = certificates.find_one(pair_filter.clone()).await? {
                        tracing::info!(
                            "Lost certificate race, returning existing: student={}, course={}",
                            student_id,
                            course_id
                        );
                        CERTIFICATES_ISSUED_TOTAL
                            .with_label_values(&["existing"])
                            .inc();
                        return Ok(winner);
                    }
                    // Token collision, re-mint
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::Internal(anyhow::anyhow!(
            "Certificate identifier collision persisted across re-mint"
        )))
    }

    /// All certificates of a student, newest first.
    pub async fn get_student_certificates(
        &self,
        student_id: &str,
    ) -> Result<Vec<Certificate>, ApiError> {
        let collection = self.mongo.collection::<Certificate>("certificates");
        let certificates: Vec<Certificate> = track_db_operation("find", "certificates", async {
            collection
                .find(doc! { "student_id": student_id })
                .sort(doc! { "issued_at": -1 })
                .await?
                .try_collect()
                .await
        })
        .await?;

        Ok(certificates)
    }

    /// Public lookup by verification token. The payload is identical for
    /// every caller and carries display data only.
    pub async fn verify_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<CertificateVerification, ApiError> {
        let found = track_db_operation(
            "find",
            "certificates",
            self.mongo
                .collection::<Certificate>("certificates")
                .find_one(doc! { "certificate_id": certificate_id }),
        )
        .await?;

        match found {
            Some(certificate) => {
                CERTIFICATE_VERIFICATIONS_TOTAL
                    .with_label_values(&["hit"])
                    .inc();
                Ok(certificate.into())
            }
            None => {
                CERTIFICATE_VERIFICATIONS_TOTAL
                    .with_label_values(&["miss"])
                    .inc();
                Err(ApiError::NotFound("Certificate not found".to_string()))
            }
        }
    }
}
