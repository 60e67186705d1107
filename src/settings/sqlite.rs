//! SQLite-backed settings
//!
//! One row per scope holding the scope's settings as a JSON object. Rows are
//! cached in memory after [`SqliteProvider::open`]; writes go through to disk.

use super::provider::SettingsProvider;
use super::SettingsScope;
use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use sqlite::State;

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS settings (guild TEXT PRIMARY KEY, settings TEXT NOT NULL)";

pub struct SqliteProvider {
    path: String,
    cache: DashMap<SettingsScope, Map<String, Value>>,
}

impl SqliteProvider {
    /// Open (creating if needed) the settings table and load every row
    pub async fn open(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let db_path = path.clone();
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(String, String)>> {
            let conn = sqlite::open(&db_path)
                .with_context(|| format!("Failed to open settings database {db_path}"))?;
            conn.execute(CREATE_TABLE)?;

            let mut stmt = conn.prepare("SELECT guild, settings FROM settings")?;
            let mut rows = Vec::new();
            while let State::Row = stmt.next()? {
                rows.push((stmt.read::<String, _>("guild")?, stmt.read::<String, _>("settings")?));
            }
            Ok(rows)
        })
        .await??;

        let cache = DashMap::new();
        for (key, raw) in rows {
            let Some(scope) = SettingsScope::from_storage_key(&key) else {
                warn!("Skipping settings row with unknown scope {key}");
                continue;
            };
            match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(settings) => {
                    cache.insert(scope, settings);
                }
                Err(e) => warn!("Skipping unreadable settings for {scope}: {e}"),
            }
        }

        info!("Loaded settings for {} scope(s) from {path}", cache.len());
        Ok(Self { path, cache })
    }

    async fn write(&self, scope: SettingsScope) -> Result<()> {
        let key = scope.storage_key();
        let settings = self.cache.get(&scope).map(|s| Value::Object(s.clone()));
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = sqlite::open(&path)?;
            match settings {
                Some(settings) => {
                    let raw = serde_json::to_string(&settings)?;
                    let mut stmt = conn
                        .prepare("INSERT OR REPLACE INTO settings (guild, settings) VALUES (?, ?)")?;
                    stmt.bind((1, key.as_str()))?;
                    stmt.bind((2, raw.as_str()))?;
                    while let State::Row = stmt.next()? {}
                }
                None => {
                    let mut stmt = conn.prepare("DELETE FROM settings WHERE guild = ?")?;
                    stmt.bind((1, key.as_str()))?;
                    while let State::Row = stmt.next()? {}
                }
            }
            Ok(())
        })
        .await??;

        debug!("Persisted settings for {scope}");
        Ok(())
    }
}

#[async_trait]
impl SettingsProvider for SqliteProvider {
    async fn get(&self, scope: SettingsScope, key: &str, default: Value) -> Result<Value> {
        Ok(self
            .cache
            .get(&scope)
            .and_then(|s| s.get(key).cloned())
            .unwrap_or(default))
    }

    async fn set(&self, scope: SettingsScope, key: &str, value: Value) -> Result<Value> {
        self.cache
            .entry(scope)
            .or_default()
            .insert(key.to_string(), value.clone());
        self.write(scope).await?;
        Ok(value)
    }

    async fn remove(&self, scope: SettingsScope, key: &str) -> Result<Option<Value>> {
        let removed = self
            .cache
            .get_mut(&scope)
            .and_then(|mut s| s.remove(key));
        if removed.is_some() {
            self.write(scope).await?;
        }
        Ok(removed)
    }

    async fn clear(&self, scope: SettingsScope) -> Result<()> {
        self.cache.remove(&scope);
        self.write(scope).await
    }

    async fn load_all(&self) -> Result<Vec<(SettingsScope, Map<String, Value>)>> {
        Ok(self
            .cache
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }
}
