//! Services (university departments).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Document types this service archives
    #[serde(default)]
    pub document_types: Vec<String>,
}

/// A service reference as it appears inside other resources: either a bare
/// identifier or the populated service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceRef {
    Id(String),
    Populated(Service),
}

impl ServiceRef {
    pub fn id(&self) -> &str {
        match self {
            ServiceRef::Id(id) => id,
            ServiceRef::Populated(service) => &service.id,
        }
    }

    /// Human-readable label, falling back to the identifier
    pub fn label(&self) -> &str {
        match self {
            ServiceRef::Id(id) => id,
            ServiceRef::Populated(service) => &service.name,
        }
    }
}
