//! Per-session state.

use crate::domain::{Cart, UserId};

/// Session holds the state owned by a single visitor: who they are logged
/// in as, and their cart.
///
/// Sessions are single-writer by construction; no other part of the system
/// holds a reference to a session's cart, so cart mutation needs no
/// locking. The cart has no identity beyond the session and dies with it.
#[derive(Debug, Default)]
pub struct Session {
    user_id: Option<UserId>,
    cart: Cart,
}

impl Session {
    /// Creates a fresh anonymous session with an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// The logged-in user, if any.
    pub fn current_user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns true if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Associates the session with a user. The cart survives login, so
    /// items added while browsing anonymously are kept.
    pub fn log_in(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    /// Ends the login and drops the cart with it.
    pub fn log_out(&mut self) {
        self.user_id = None;
        self.cart.clear();
    }

    /// Read access to the cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Write access to the cart.
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }
}
