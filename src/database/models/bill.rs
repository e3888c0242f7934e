use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::repository::Entity;

/// Expense record, always owned by the user that created it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub title: String,
    pub user_id: String,
}

impl Entity for Bill {
    const COLLECTION: &'static str = "bill";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub title: String,
    pub user_id: String,
}
