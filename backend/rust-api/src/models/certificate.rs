use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Durable proof of course completion. At most one exists per
/// (student, course), enforced by a unique compound index.
///
/// `student_name` and `course_title` are denormalized at issuance so the
/// public verification endpoint never touches the users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "_id")]
    pub id: String,
    pub certificate_id: String,
    pub student_id: String,
    pub course_id: String,
    pub student_name: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateCertificateRequest {
    #[validate(length(min = 1, message = "course_id is required"))]
    pub course_id: String,
}

/// Public verification view. Deliberately minimal: no email, no internal
/// ids, identical for every caller.
#[derive(Debug, Serialize)]
pub struct CertificateVerification {
    pub certificate_id: String,
    pub student_name: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

impl From<Certificate> for CertificateVerification {
    fn from(cert: Certificate) -> Self {
        Self {
            certificate_id: cert.certificate_id,
            student_name: cert.student_name,
            course_title: cert.course_title,
            issued_at: cert.issued_at,
        }
    }
}
