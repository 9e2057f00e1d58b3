//! Typed calls to the UniVault endpoints.

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::info;

use super::client::ApiClient;
use super::envelope::{paginate_locally, unwrap_data, unwrap_page, Page};
use super::error::ClientError;
use crate::import::{ImportFile, ImportResult};
use crate::list::ListQuery;
use crate::models::{
    Document, LoginRequest, LoginResponse, NewStudent, NewUser, Service, Student, User,
};
use crate::routes::paths;

/// List endpoints driven by the list controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Students,
    Documents,
    Users,
    Services,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Students => "/api/students",
            Resource::Documents => "/api/documents",
            Resource::Users => "/api/users",
            Resource::Services => "/api/services",
        }
    }

    /// Services come back as one unpaginated list
    pub fn is_paginated(&self) -> bool {
        !matches!(self, Resource::Services)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Students => write!(f, "students"),
            Resource::Documents => write!(f, "documents"),
            Resource::Users => write!(f, "users"),
            Resource::Services => write!(f, "services"),
        }
    }
}

impl ApiClient {
    /// Exchange credentials for a token and open the session
    pub async fn sign_in(&self, request: &LoginRequest) -> Result<User, ClientError> {
        let body = self.post("/api/auth/login", request).await?;
        let LoginResponse { token, user } = unwrap_data(body)?;
        self.session().login(user.clone(), token);
        Ok(user)
    }

    pub fn sign_out(&self) {
        self.session().logout();
        self.navigator().navigate(paths::LOGIN);
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        let body = self.get("/api/auth/me", &[]).await?;
        unwrap_data(body)
    }

    /// Reload the profile and store it without touching the token
    pub async fn refresh_profile(&self) -> Result<User, ClientError> {
        let user = self.current_user().await?;
        self.session().update_user(user.clone());
        Ok(user)
    }

    /// Fetch one page of `resource` for `query`
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<T>, ClientError> {
        if !resource.is_paginated() {
            let params = [("search", query.search.clone())];
            let body = self.get(resource.path(), &params).await?;
            return paginate_locally(body, query);
        }

        let params = [
            ("search", query.search.clone()),
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        let body = self.get(resource.path(), &params).await?;
        unwrap_page(body)
    }

    pub async fn list_students(&self, query: &ListQuery) -> Result<Page<Student>, ClientError> {
        self.list(Resource::Students, query).await
    }

    pub async fn list_documents(&self, query: &ListQuery) -> Result<Page<Document>, ClientError> {
        self.list(Resource::Documents, query).await
    }

    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<User>, ClientError> {
        self.list(Resource::Users, query).await
    }

    /// Every service, unfiltered
    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        let body = self.get(Resource::Services.path(), &[]).await?;
        let page: Page<Service> = unwrap_page(body)?;
        Ok(page.items)
    }

    pub async fn create_student(&self, student: &NewStudent) -> Result<Student, ClientError> {
        let body = self.post(Resource::Students.path(), student).await?;
        unwrap_data(body)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        let body = self.post(Resource::Users.path(), user).await?;
        unwrap_data(body)
    }

    /// Upload a spreadsheet of students; per-row outcomes come back in the result
    pub async fn import_students(&self, file: &ImportFile) -> Result<ImportResult, ClientError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ClientError::Request(e.to_string()))?;
        let form = Form::new().part("file", part);

        let body = self.post_multipart("/api/students/import", form).await?;
        let result: ImportResult = unwrap_data(body)?;
        info!(
            file = %file.file_name,
            imported = result.imported,
            duplicates = result.duplicates,
            errors = result.errors,
            "Student import finished"
        );
        Ok(result)
    }

    /// Download the import template (CSV)
    pub async fn import_template(&self) -> Result<Vec<u8>, ClientError> {
        self.get_bytes("/api/students/import/template").await
    }
}
