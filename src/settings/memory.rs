//! In-memory settings, lost on restart

use super::provider::SettingsProvider;
use super::SettingsScope;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

#[derive(Default)]
pub struct MemoryProvider {
    settings: DashMap<SettingsScope, Map<String, Value>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsProvider for MemoryProvider {
    async fn get(&self, scope: SettingsScope, key: &str, default: Value) -> Result<Value> {
        Ok(self
            .settings
            .get(&scope)
            .and_then(|s| s.get(key).cloned())
            .unwrap_or(default))
    }

    async fn set(&self, scope: SettingsScope, key: &str, value: Value) -> Result<Value> {
        self.settings
            .entry(scope)
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    async fn remove(&self, scope: SettingsScope, key: &str) -> Result<Option<Value>> {
        Ok(self
            .settings
            .get_mut(&scope)
            .and_then(|mut s| s.remove(key)))
    }

    async fn clear(&self, scope: SettingsScope) -> Result<()> {
        self.settings.remove(&scope);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<(SettingsScope, Map<String, Value>)>> {
        Ok(self
            .settings
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }
}
