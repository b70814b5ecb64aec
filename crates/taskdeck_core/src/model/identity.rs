//! Identity and credential shapes used by the session layer.
//!
//! # Invariants
//! - Credential `Debug` output never contains passwords.
//! - Registration input is rejected before verification when the password
//!   confirmation differs.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

/// Authenticated user's profile record.
///
/// Serialized as `{"id","name","email","avatar"}` in the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Validation failures for credential input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialValidationError {
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// Sign-in input.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Debug for LoginCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account creation input.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterCredentials {
    /// Checks that `password` and `confirm_password` match exactly.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        if self.password != self.confirm_password {
            return Err(CredentialValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

impl Debug for RegisterCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}
