use serde::{Deserialize, Serialize};

pub mod certificate;
pub mod quiz;
pub mod webinar;

/// Course catalog entry. Owned by the catalog service; this service only
/// reads it for validation and display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
}

/// User record as stored by the accounts service. The email must never
/// appear in any response produced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}
