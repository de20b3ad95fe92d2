use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role. The set is closed: anything outside it is rejected at the
/// transport boundary (serde) or when reading a row back (`FromStr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Account rows
// ---------------------------------------------------------------------------

/// A full account row read back from the database. `password` holds the
/// stored digest, never the plaintext.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub phone: String,
    pub password: String,
    pub age: i64,
    pub role: Role,
    pub created: i64,
    pub modified: i64,
}

/// Signup input: everything needed to create an account. `password` is the
/// plaintext as submitted; it is digested before it ever reaches storage.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub phone: String,
    pub password: String,
    pub age: i64,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Boundary validation
//
// Role membership is enforced by serde on `NewAccount` (unknown variants
// fail to deserialize), so only the free-form fields need checks here.
// ---------------------------------------------------------------------------

/// E.164 phone number: leading `+`, then 7 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };

    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Password policy carried over from the account schema: 8..=255 ASCII chars.
pub fn is_valid_password(password: &str) -> bool {
    (8..=255).contains(&password.len()) && password.is_ascii()
}

pub fn is_valid_age(age: i64) -> bool {
    (1..=120).contains(&age)
}

impl NewAccount {
    /// Field-level validation, run at the transport boundary before the
    /// account is handed to the service layer.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_phone(&self.phone) {
            return Err("phone must be E.164, e.g. +15551234567".to_string());
        }

        if !is_valid_password(&self.password) {
            return Err("password must be 8-255 ASCII characters".to_string());
        }

        if !is_valid_age(self.age) {
            return Err("age must be between 1 and 120".to_string());
        }

        Ok(())
    }
}
