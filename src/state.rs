use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::CaptchaConfig;
use crate::database::models::{Bill, Session, User};
use crate::database::{RecordStore, Repository};

/// Services handlers reach through their `Context`. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub tokens: Arc<TokenService>,
    pub captcha: CaptchaConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, tokens: TokenService, captcha: CaptchaConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            captcha,
        }
    }

    pub fn users(&self) -> Repository<User> {
        Repository::new(Arc::clone(&self.store))
    }

    pub fn sessions(&self) -> Repository<Session> {
        Repository::new(Arc::clone(&self.store))
    }

    pub fn bills(&self) -> Repository<Bill> {
        Repository::new(Arc::clone(&self.store))
    }
}
