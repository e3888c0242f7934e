use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::database::repository::Entity;
use crate::types::Permission;

/// Account record. Passwords are stored and compared as plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub permission: Permission,
    #[serde(default)]
    pub is_deleted: bool,
}

impl User {
    /// Subject and permission as they go into token claims
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            permission: self.permission,
        }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Insert payload for a registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub permission: Permission,
    pub is_deleted: bool,
}
