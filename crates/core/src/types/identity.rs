//! The authenticated principal a cart belongs to.

use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId};

/// A logged-in shopper, as announced by the authentication subsystem.
///
/// The cart engine treats an identity as an opaque partition key: it is
/// compared for equality and its id is used to address the remote cart.
/// A guest is represented by the *absence* of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable numeric account id.
    pub id: UserId,
    /// Account email.
    pub email: Email,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(id: UserId, email: Email) -> Self {
        Self { id, email }
    }

    /// Whether carts for this identity may be written to the remote store.
    ///
    /// Only positive account ids address a real stored cart; anything else
    /// is handled like a guest.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        self.id.as_i32() > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(id: i32) -> Identity {
        Identity::new(UserId::new(id), Email::parse("ana@horno.mx").unwrap())
    }

    #[test]
    fn test_is_persistable() {
        assert!(identity(42).is_persistable());
        assert!(!identity(0).is_persistable());
        assert!(!identity(-3).is_persistable());
    }

    #[test]
    fn test_equality_covers_id_and_email() {
        let other_email = Identity::new(UserId::new(42), Email::parse("bea@horno.mx").unwrap());
        assert_eq!(identity(42), identity(42));
        assert_ne!(identity(42), identity(43));
        assert_ne!(identity(42), other_email);
    }
}
