//! Server-side sessions kept in Redis, keyed by the session cookie value

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde_json::Value;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::session::Session,
};

/// Persistence for session data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored data for `id`, `None` when unknown or expired
    async fn load(&self, id: &str) -> AppResult<Option<HashMap<String, Value>>>;
    async fn save(&self, id: &str, data: &HashMap<String, Value>, ttl_seconds: u64) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to Redis and check the connection
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;

        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self { conn })
    }

    fn key(id: &str) -> String {
        format!("session:{}", id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<HashMap<String, Value>>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(id)).await?;

        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    tracing::warn!("Discarding unreadable session {}: {}", id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, data: &HashMap<String, Value>, ttl_seconds: u64) -> AppResult<()> {
        let raw = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session: {}", e)))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(id), raw, ttl_seconds).await?;
        Ok(())
    }
}

/// Opens and commits request-scoped sessions
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Session for the cookie value, or a fresh one when absent or expired
    pub async fn open(&self, cookie: Option<&str>) -> AppResult<Session> {
        let Some(id) = cookie.filter(|id| !id.is_empty()) else {
            return Ok(Session::fresh());
        };

        Ok(match self.store.load(id).await? {
            Some(data) => Session::restore(id.to_string(), data),
            None => Session::fresh(),
        })
    }

    /// Persist the session if it changed
    pub async fn commit(&self, session: &Session) -> AppResult<()> {
        if !session.is_modified() {
            return Ok(());
        }
        self.store
            .save(session.id(), session.data(), self.config.ttl_seconds)
            .await
    }
}
