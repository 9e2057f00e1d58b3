//! User identity and role models.

use serde::{Deserialize, Serialize};

use super::ServiceRef;

/// Portal roles, from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Consults documents and students of their own service
    User,
    /// Manages students, documents and users of a service
    Admin,
    /// Manages services and every account
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::SuperAdmin];

    /// Get the privilege level (higher = more permissions)
    pub fn level(&self) -> u8 {
        match self {
            Role::SuperAdmin => 3,
            Role::Admin => 2,
            Role::User => 1,
        }
    }

    /// Check if the role can import and edit student records
    pub fn can_manage_students(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Check if the role can create or edit services
    pub fn can_manage_services(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super-admin" | "superadmin" | "super_admin" => Ok(Role::SuperAdmin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Authenticated identity as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub service: Option<ServiceRef>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Payload for creating an account (admin and super-admin only).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"super-admin\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Super-Admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_levels() {
        assert!(Role::SuperAdmin.level() > Role::Admin.level());
        assert!(Role::Admin.level() > Role::User.level());
        assert!(Role::Admin.can_manage_students());
        assert!(!Role::User.can_manage_students());
        assert!(!Role::Admin.can_manage_services());
    }

    #[test]
    fn test_user_accepts_mongo_style_id() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","firstName":"Awa","lastName":"Diop","email":"awa@univ.sn","role":"user","service":"svc-1"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.is_active);
        assert_eq!(user.full_name(), "Awa Diop");
        assert_eq!(user.service.unwrap().id(), "svc-1");
    }
}
