//! The accumulated structured answers collected across the interview.

use std::collections::HashMap;

use crate::catalog::{QuestionCatalog, StepKey};

/// Field-key → extracted-value map with single-writer discipline.
///
/// At most one entry per catalog field; insertion order is irrelevant.
#[derive(Debug, Default, Clone)]
pub struct ProfileStore {
    fields: HashMap<StepKey, String>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent overwrite. Empty or whitespace-only values are a no-op and
    /// leave the profile unchanged. Returns whether the value was stored.
    pub fn upsert(&mut self, field: StepKey, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.fields.insert(field, trimmed.to_string());
        true
    }

    pub fn get(&self, field: StepKey) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Whether `field` holds a non-empty value.
    pub fn is_answered(&self, field: StepKey) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    /// Clear every entry. Invoked by the session lifecycle on (re)connect.
    pub fn reset_all(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON snapshot keyed by wire token, in catalog order, for the status
    /// and summary endpoints.
    pub fn snapshot(&self, catalog: &QuestionCatalog) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for q in catalog.iter() {
            if let Some(value) = self.get(q.key) {
                map.insert(q.key.token().to_string(), value.into());
            }
        }
        serde_json::Value::Object(map)
    }
}
