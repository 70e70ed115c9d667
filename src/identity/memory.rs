//! In-memory identity store.

use crate::domain::{NewUser, User, UserId, UserUpdate};
use crate::identity::{IdentityError, IdentityStore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// Hex-encoded sha256 digest of a password.
fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    next_id: UserId,
}

/// MemoryIdentity keeps accounts in a lock-guarded map.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    inner: RwLock<Inner>,
}

impl MemoryIdentity {
    /// Creates an empty identity store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentity {
    fn find_user(&self, id: UserId) -> Option<User> {
        self.inner.read().unwrap().users.get(&id).cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .read()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    fn register(&self, new_user: NewUser) -> Result<User, IdentityError> {
        if new_user.name.is_empty() {
            return Err(IdentityError::Validation("name is required".into()));
        }
        if new_user.email.is_empty() {
            return Err(IdentityError::Validation("email is required".into()));
        }
        if new_user.password.is_empty() {
            return Err(IdentityError::Validation("password is required".into()));
        }

        let mut inner = self.inner.write().unwrap();
        if inner.users.values().any(|u| u.email == new_user.email) {
            return Err(IdentityError::EmailTaken(new_user.email));
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: new_user.name,
            email: new_user.email,
            street_address: new_user.street_address,
            city: new_user.city,
            state: new_user.state,
            zip_code: new_user.zip_code,
            role: new_user.role,
            password_digest: password_digest(&new_user.password),
        };
        inner.users.insert(user.id, user.clone());

        info!(user_id = user.id, email = %user.email, "User registered");
        Ok(user)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let user = self
            .find_by_email(email)
            .ok_or(IdentityError::InvalidCredentials)?;
        if user.password_digest != password_digest(password) {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(user)
    }

    fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, IdentityError> {
        if let Some(ref password) = update.password {
            if password.is_empty() {
                return Err(IdentityError::Validation("password cannot be blank".into()));
            }
        }

        let mut inner = self.inner.write().unwrap();

        if let Some(ref email) = update.email {
            if inner.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(IdentityError::EmailTaken(email.clone()));
            }
        }

        let user = inner
            .users
            .get_mut(&id)
            .ok_or(IdentityError::UserNotFound(id))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(street_address) = update.street_address {
            user.street_address = street_address;
        }
        if let Some(city) = update.city {
            user.city = city;
        }
        if let Some(state) = update.state {
            user.state = state;
        }
        if let Some(zip_code) = update.zip_code {
            user.zip_code = zip_code;
        }
        if let Some(password) = update.password {
            user.password_digest = password_digest(&password);
        }

        Ok(user.clone())
    }
}
