/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric permission level carried by users and token claims.
///
/// Serialized as a bare number so stored records and token payloads read
/// `"permission": 0` rather than a wrapped object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(pub u8);

impl Permission {
    pub const USER: Permission = Permission(0);
    pub const ADMIN: Permission = Permission(10);

    pub fn is_admin(self) -> bool {
        self >= Self::ADMIN
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Permission {
    fn from(level: u8) -> Self {
        Permission(level)
    }
}
