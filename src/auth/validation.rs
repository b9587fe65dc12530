//! Request shapes for the auth endpoints and their validation rules.
//!
//! Every field is optional at the serde level so that a missing field is
//! reported as a per-field validation message instead of a body parse error.
//! Before validation, strings are trimmed and empty strings become `None`;
//! passwords are never trimmed. Emails are also lowercased, so lookups and
//! the uniqueness check ignore case.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, FieldErrors};

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(max = 255, message = "The email field must not be greater than 255 characters.")
    )]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "The password field is required."),
        length(min = 6, message = "The password field must be at least 6 characters.")
    )]
    pub password: Option<String>,

    #[serde(default)]
    pub password_confirmation: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "The password field is required."),
        length(min = 6, message = "The password field must be at least 6 characters.")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(required(message = "The refresh token field is required."))]
    pub refresh_token: Option<String>,
}

/// Credentials that passed validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Runs every rule that does not need the store. Uniqueness of the email
    /// is checked by the caller and merged into the same map.
    pub fn check(self) -> Result<Registration, FieldErrors> {
        let request = Self {
            email: normalize_email(self.email),
            password: blank_to_none(self.password),
            password_confirmation: blank_to_none(self.password_confirmation),
            name: normalize(self.name),
        };

        let mut errors = schema_errors(&request);
        if request.password.is_some() && request.password != request.password_confirmation {
            errors.add("password", "The password field confirmation does not match.");
        }

        match (request.email, request.password, request.name) {
            (Some(email), Some(password), Some(name)) if errors.is_empty() => Ok(Registration {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

impl LoginRequest {
    pub fn check(self) -> Result<Credentials, AppError> {
        let request = Self {
            email: normalize_email(self.email),
            password: blank_to_none(self.password),
        };

        schema_errors(&request).into_result()?;
        match (request.email, request.password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(FieldErrors::single("body", "The request is incomplete.").into()),
        }
    }
}

impl RefreshRequest {
    pub fn check(self) -> Result<String, AppError> {
        let request = Self {
            refresh_token: normalize(self.refresh_token),
        };

        schema_errors(&request).into_result()?;
        request
            .refresh_token
            .ok_or_else(|| FieldErrors::single("refresh_token", "The refresh token field is required.").into())
    }
}

fn schema_errors<T: Validate>(request: &T) -> FieldErrors {
    match request.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field));
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    blank_to_none(value.map(|v| v.trim().to_string()))
}

pub(crate) fn normalize_email(value: Option<String>) -> Option<String> {
    normalize(value).map(|v| v.to_lowercase())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, confirmation: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            password_confirmation: Some(confirmation.to_string()),
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_valid_registration() {
        let registration = register(" a@b.com ", "secret1", "secret1", "A").check().unwrap();
        assert_eq!(registration.email, "a@b.com");
        assert_eq!(registration.password, "secret1");
        assert_eq!(registration.name, "A");
    }

    #[test]
    fn test_missing_fields_are_reported_per_field() {
        let errors = RegisterRequest::default().check().unwrap_err();

        assert_eq!(errors.get("email").unwrap(), ["The email field is required."]);
        assert_eq!(errors.get("password").unwrap(), ["The password field is required."]);
        assert_eq!(errors.get("name").unwrap(), ["The name field is required."]);
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let errors = register("   ", "", "", "  ").check().unwrap_err();

        assert_eq!(errors.get("email").unwrap(), ["The email field is required."]);
        assert_eq!(errors.get("name").unwrap(), ["The name field is required."]);
        assert!(errors.has("password"));
    }

    #[test]
    fn test_malformed_email() {
        let errors = register("not-an-email", "secret1", "secret1", "A").check().unwrap_err();
        assert_eq!(
            errors.get("email").unwrap(),
            ["The email field must be a valid email address."]
        );
        assert!(!errors.has("password"));
    }

    #[test]
    fn test_mismatched_confirmation() {
        let errors = register("a@b.com", "secret1", "secret2", "A").check().unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["The password field confirmation does not match."]
        );
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_short_password() {
        let errors = register("a@b.com", "abc", "abc", "A").check().unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["The password field must be at least 6 characters."]
        );
    }

    #[test]
    fn test_emails_are_lowercased() {
        let registration = register(" A@B.Com ", "secret1", "secret1", "Ann").check().unwrap();
        assert_eq!(registration.email, "a@b.com");
        assert_eq!(registration.name, "Ann");

        let credentials = LoginRequest {
            email: Some("A@b.COM".to_string()),
            password: Some("Secret1".to_string()),
        }
        .check()
        .unwrap();
        assert_eq!(credentials.email, "a@b.com");
        assert_eq!(credentials.password, "Secret1");
    }

    #[test]
    fn test_passwords_are_not_trimmed() {
        let errors = register("a@b.com", "secret1 ", "secret1", "A").check().unwrap_err();
        assert!(errors.has("password"));
    }

    #[test]
    fn test_login_validation() {
        let request = LoginRequest {
            email: Some("a@b.com".to_string()),
            password: Some("secret1".to_string()),
        };
        let credentials = request.check().unwrap();
        assert_eq!(credentials.email, "a@b.com");

        match LoginRequest::default().check() {
            Err(AppError::ValidationError(errors)) => {
                assert!(errors.has("email"));
                assert!(errors.has("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_requires_token() {
        match RefreshRequest::default().check() {
            Err(AppError::ValidationError(errors)) => {
                assert_eq!(
                    errors.get("refresh_token").unwrap(),
                    ["The refresh token field is required."]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let token = RefreshRequest {
            refresh_token: Some("abc".to_string()),
        }
        .check()
        .unwrap();
        assert_eq!(token, "abc");
    }
}
