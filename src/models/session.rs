//! Per-visitor session state

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Key/value state of one browser session, loaded and committed within a request
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: String,
    data: HashMap<String, Value>,
    is_new: bool,
    modified: bool,
}

impl Session {
    /// Session for a visitor without a session cookie
    pub fn fresh() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            data: HashMap::new(),
            is_new: true,
            modified: false,
        }
    }

    pub fn restore(id: String, data: HashMap<String, Value>) -> Self {
        Self {
            id,
            data,
            is_new: false,
            modified: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Whether the visitor must be handed a new cookie
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Stored value for `key`, or `default` when absent or of another type
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(default)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.data.insert(key.to_string(), v);
                self.modified = true;
            }
            Err(e) => tracing::warn!("Session value for {} not serializable: {}", key, e),
        }
    }
}
