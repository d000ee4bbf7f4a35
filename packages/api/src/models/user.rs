//! # Account and credential models
//!
//! - [`Credentials`]: body of `POST /token/`.
//! - [`TokenPair`]: the access/refresh pair issued on login.
//! - [`Registration`]: body of `POST /register/`, with the same validation
//!   rules the backend applies so most mistakes never leave the client.
//! - [`AccountInfo`]: the created-account confirmation.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body of `POST /token/refresh/`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct RefreshRequest {
    pub refresh: String,
}

/// Response of `POST /token/refresh/`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct AccessToken {
    pub access: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<u64>,
}

impl Registration {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            email: email.trim().to_lowercase(),
            password: password.to_string(),
            password_confirm: password.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() {
            return Err(AuthError::Validation {
                field: "username",
                message: "Username is required".to_string(),
            });
        }
        if self.email.is_empty() || !self.email.contains('@') {
            return Err(AuthError::Validation {
                field: "email",
                message: "Invalid email address".to_string(),
            });
        }
        if self.password.len() < 8 {
            return Err(AuthError::Validation {
                field: "password",
                message: "Password must be at least 8 characters".to_string(),
            });
        }
        if self.password != self.password_confirm {
            return Err(AuthError::Validation {
                field: "password_confirm",
                message: "Passwords do not match".to_string(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// Created-account confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: u64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl AccountInfo {
    /// Full name, falling back to the username.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.clone(),
        }
    }
}

/// Register responses wrap the account under `user`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RegistrationResponse {
    pub user: AccountInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        assert!(Registration::new("ann", "Ann@Example.com", "password1")
            .validate()
            .is_ok());

        let cases = [
            (Registration::new(" ", "a@b.c", "password1"), "username"),
            (Registration::new("ann", "nope", "password1"), "email"),
            (Registration::new("ann", "a@b.c", "short"), "password"),
        ];
        for (registration, expected) in cases {
            match registration.validate() {
                Err(AuthError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }

        let mut mismatch = Registration::new("ann", "a@b.c", "password1");
        mismatch.password_confirm = "password2".to_string();
        assert!(matches!(
            mismatch.validate(),
            Err(AuthError::Validation { field: "password_confirm", .. })
        ));
    }

    #[test]
    fn test_registration_normalizes_email() {
        let registration = Registration::new("ann", " Ann@Example.COM ", "password1");
        assert_eq!(registration.credentials().email, "ann@example.com");
    }

    #[test]
    fn test_display_name() {
        let mut info = AccountInfo {
            id: 1,
            email: "a@b.c".to_string(),
            username: "ann".to_string(),
            first_name: None,
            last_name: None,
        };
        assert_eq!(info.display_name(), "ann");
        info.first_name = Some("Ann".to_string());
        info.last_name = Some("Lee".to_string());
        assert_eq!(info.display_name(), "Ann Lee");
    }
}
