//! User records and profile updates.

use crate::domain::UserId;
use serde::{Deserialize, Serialize};

/// Role determines which parts of the marketplace a user can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A registered shopper.
    Buyer,
    /// A user who lists and fulfills items.
    Merchant,
    /// Site administrator.
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Buyer
    }
}

/// User is a registered account as seen through the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub role: Role,
    /// Hex-encoded digest of the password. Never the password itself.
    #[serde(skip_serializing)]
    pub password_digest: String,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial profile update. A `None` field is left unchanged.
///
/// This makes the "blank password means keep the old one" rule explicit:
/// callers map an empty form field to `None` before building the update.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub password: Option<String>,
}
