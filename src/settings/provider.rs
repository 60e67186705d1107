//! Settings provider contract

use super::SettingsScope;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Storage for settings, one JSON object per scope
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Value for `key`, or `default` when unset
    async fn get(&self, scope: SettingsScope, key: &str, default: Value) -> Result<Value>;

    /// Set `key`, returning the new value
    async fn set(&self, scope: SettingsScope, key: &str, value: Value) -> Result<Value>;

    /// Remove `key`, returning the old value if there was one
    async fn remove(&self, scope: SettingsScope, key: &str) -> Result<Option<Value>>;

    /// Remove everything stored for `scope`
    async fn clear(&self, scope: SettingsScope) -> Result<()>;

    /// Every stored scope with its settings
    async fn load_all(&self) -> Result<Vec<(SettingsScope, Map<String, Value>)>>;
}
