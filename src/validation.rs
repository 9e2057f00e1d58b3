//! Client-side form validation.
//!
//! Forms are checked before any network call. Failures are collected per
//! field so each message can be shown next to its input and dropped as soon
//! as that input is edited.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use crate::api::error::{ErrorDetails, ServerError};
use crate::models::{LoginRequest, NewStudent, NewUser};

/// Minimum password length accepted by the portal
pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    /// Regex for validating email addresses
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$"
    ).unwrap();

    /// Student identifiers are exactly 5 or 7 digits
    static ref MATRICULE_REGEX: Regex = Regex::new(r"^(\d{5}|\d{7})$").unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate a student matricule
pub fn validate_matricule(matricule: &str) -> Result<(), String> {
    let matricule = matricule.trim();
    if matricule.is_empty() {
        return Err("Matricule is required".to_string());
    }
    if !MATRICULE_REGEX.is_match(matricule) {
        return Err("Matricule must have exactly 5 or 7 digits".to_string());
    }
    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    if value.chars().count() > 100 {
        return Err(format!("{} is too long (max 100 characters)", label));
    }
    Ok(())
}

/// Field-scoped validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the outcome of a single-field check
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    /// Drop a field's messages once the user edits it
    pub fn clear(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Return Ok(()) if no errors, or Err(self) if there are errors
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Field-level messages the server sent back, if any
    pub fn from_server(error: &ServerError) -> Self {
        let mut errors = Self::new();
        if let Some(ErrorDetails::ValidationErrors(fields)) = &error.details {
            for (field, messages) in fields {
                for message in messages {
                    errors.add(field.clone(), message.clone());
                }
            }
        }
        errors
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

pub fn validate_login(request: &LoginRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("email", validate_email(&request.email));
    if request.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.finish()
}

pub fn validate_new_student(student: &NewStudent) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors
        .check("matricule", validate_matricule(&student.matricule))
        .check("firstName", validate_required("First name", &student.first_name))
        .check("lastName", validate_required("Last name", &student.last_name));
    errors.finish()
}

pub fn validate_new_user(user: &NewUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors
        .check("firstName", validate_required("First name", &user.first_name))
        .check("lastName", validate_required("Last name", &user.last_name))
        .check("email", validate_email(&user.email))
        .check("password", validate_password(&user.password));
    if !matches!(user.role, crate::models::Role::SuperAdmin)
        && user.service.as_deref().map_or(true, |s| s.trim().is_empty())
    {
        errors.add("service", "Service is required for this role");
    }
    errors.finish()
}
