//! Archived documents (PDF or image) attached to a student.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ServiceRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "super::string_or_number")]
    pub matricule: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub service: Option<ServiceRef>,
    /// Location on the media host
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
