//! User identity collaborator.
//!
//! Registration, credential checks and profile updates live outside the
//! marketplace core; the core only needs to resolve a buyer id at
//! checkout. The in-memory implementation here backs tests and the demo
//! binary.

mod memory;

pub use memory::MemoryIdentity;

use crate::domain::{NewUser, User, UserId, UserUpdate};
use thiserror::Error;

/// Identity errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The email address is already registered.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// No user exists with the given id.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Email/password pair did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A required field is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// IdentityStore is the account interface consumed by the core.
pub trait IdentityStore: Send + Sync {
    /// Looks up a user by id.
    fn find_user(&self, id: UserId) -> Option<User>;

    /// Looks up a user by email address.
    fn find_by_email(&self, email: &str) -> Option<User>;

    /// Registers a new account. Name, email and password are required;
    /// the email must not already be registered.
    fn register(&self, new_user: NewUser) -> Result<User, IdentityError>;

    /// Verifies credentials and returns the matching user.
    fn authenticate(&self, email: &str, password: &str) -> Result<User, IdentityError>;

    /// Applies a partial profile update. `None` fields are left unchanged;
    /// in particular a `None` password keeps the existing digest. A blank
    /// password is rejected rather than silently skipped.
    fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, IdentityError>;
}
