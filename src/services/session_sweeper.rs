use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::database::models::Session;
use crate::database::{Repository, StoreError};

/// Periodic removal of captcha sessions nobody came back to verify.
///
/// Verification already deletes expired sessions it runs into; the sweeper
/// only keeps abandoned ones from piling up.
pub struct SessionSweeper {
    sessions: Repository<Session>,
}

impl SessionSweeper {
    pub fn new(sessions: Repository<Session>) -> Self {
        Self { sessions }
    }

    /// Delete every session that expired before `now`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let removed = self
            .sessions
            .delete_any(|session: &Session| session.is_expired(now))
            .await?;
        debug!("Session sweep removed {} expired sessions", removed);
        Ok(removed)
    }

    /// Sweep every `interval` on a background task
    pub fn start_scheduled(self, interval: Duration) -> JoinHandle<()> {
        info!("Sweeping expired captcha sessions every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once(Utc::now()).await {
                    error!("Session sweep failed: {}", e);
                }
            }
        })
    }
}
