//! Domain models exchanged with the UniVault API.

mod document;
mod service;
mod student;
mod user;

pub use document::Document;
pub use service::{Service, ServiceRef};
pub use student::{NewStudent, Student};
pub use user::{LoginRequest, LoginResponse, NewUser, Role, User};

use serde::{Deserialize, Deserializer};

/// Read a matricule sent either as text or as a number. `null` reads as empty.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Missing(()) => String::new(),
    })
}
