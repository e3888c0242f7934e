use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::repository::Entity;

/// Phone captcha session. Single use: removed on the first verification attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Serialized `SessionInfo`
    pub info: String,
    pub expire_time: DateTime<Utc>,
}

/// Payload kept inside `Session::info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub phone: String,
    pub captcha: String,
}

impl Session {
    pub fn new(id: String, info: &SessionInfo, expire_time: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id,
            info: serde_json::to_string(info)?,
            expire_time,
        })
    }

    pub fn info(&self) -> Result<SessionInfo, serde_json::Error> {
        serde_json::from_str(&self.info)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_time < now
    }
}

impl Entity for Session {
    const COLLECTION: &'static str = "session";

    fn id(&self) -> &str {
        &self.id
    }
}
