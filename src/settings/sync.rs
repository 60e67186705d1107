//! Keeps a settings provider and the framework's in-memory state aligned

use super::provider::SettingsProvider;
use super::{command_key, group_key, SettingsScope, PREFIX_KEY};
use crate::core::events::FrameworkEvent;
use crate::framework::Framework;
use anyhow::Result;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

pub struct SettingsSync {
    provider: Arc<dyn SettingsProvider>,
    framework: Arc<Framework>,
}

impl SettingsSync {
    pub fn new(provider: Arc<dyn SettingsProvider>, framework: Arc<Framework>) -> Self {
        Self { provider, framework }
    }

    /// Apply stored settings, then persist every later change in the background
    ///
    /// The task holds no reference to the framework and ends once the last
    /// framework handle is dropped.
    pub async fn start(self) -> Result<JoinHandle<()>> {
        // subscribe first so nothing emitted during init is missed
        let events = self.framework.subscribe();
        self.init().await?;
        Ok(tokio::spawn(run(self.provider, events)))
    }

    /// Apply stored prefixes and enable states to the framework
    pub async fn init(&self) -> Result<()> {
        let all = self.provider.load_all().await?;
        for (scope, settings) in &all {
            self.apply(*scope, settings);
        }
        info!("Applied stored settings for {} scope(s)", all.len());
        Ok(())
    }

    fn apply(&self, scope: SettingsScope, settings: &Map<String, Value>) {
        let registry = self.framework.registry();

        for (key, value) in settings {
            if key == PREFIX_KEY {
                match value {
                    Value::String(prefix) if !prefix.is_empty() => {
                        self.framework.restore_prefix(scope, Some(prefix.clone()))
                    }
                    Value::String(_) | Value::Null => self.framework.restore_prefix(scope, None),
                    other => warn!("Ignoring non-string prefix for {scope}: {other}"),
                }
                continue;
            }

            let Some(enabled) = value.as_bool() else {
                warn!("Ignoring non-boolean setting {key} for {scope}");
                continue;
            };

            if let Some(name) = key.strip_prefix("cmd-") {
                match registry.resolve_command(name) {
                    Ok(command) => {
                        if let Err(e) = command.set_enabled_in(scope.guild(), enabled) {
                            debug!("Skipping stored state for {name}: {e}");
                        }
                    }
                    Err(_) => debug!("Stored setting for unknown command {name}"),
                }
            } else if let Some(id) = key.strip_prefix("grp-") {
                match registry.group(id) {
                    Some(group) => {
                        if let Err(e) = group.set_enabled_in(scope.guild(), enabled) {
                            debug!("Skipping stored state for group {id}: {e}");
                        }
                    }
                    None => debug!("Stored setting for unknown group {id}"),
                }
            }
        }
    }
}

async fn run(provider: Arc<dyn SettingsProvider>, mut events: Receiver<FrameworkEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(e) = persist(provider.as_ref(), event).await {
                    error!("Failed to persist settings change: {e}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Settings sync lagged, {skipped} event(s) dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Settings sync stopped");
}

async fn persist(provider: &dyn SettingsProvider, event: FrameworkEvent) -> Result<()> {
    match event {
        FrameworkEvent::PrefixChange { scope, reset: true, .. } => {
            provider.remove(scope, PREFIX_KEY).await?;
        }
        FrameworkEvent::PrefixChange { scope, prefix, .. } => {
            let value = prefix.map_or(Value::String(String::new()), Value::String);
            provider.set(scope, PREFIX_KEY, value).await?;
        }
        FrameworkEvent::CommandStatusChange { scope, command, enabled } => {
            provider
                .set(scope, &command_key(&command), Value::Bool(enabled))
                .await?;
        }
        FrameworkEvent::GroupStatusChange { scope, group, enabled } => {
            provider
                .set(scope, &group_key(&group), Value::Bool(enabled))
                .await?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryProvider;
    use serde_json::json;
    use serenity::model::id::{GuildId, UserId};
    use std::time::Duration;

    fn framework() -> Arc<Framework> {
        let mut builder = Framework::builder().owner(UserId(1));
        builder.registry_mut().register_defaults().unwrap();
        builder.build()
    }

    #[tokio::test]
    async fn test_init_applies_stored_state() {
        let provider = Arc::new(MemoryProvider::new());
        let guild = SettingsScope::Guild(GuildId(5));
        provider.set(guild, PREFIX_KEY, json!("$")).await.unwrap();
        provider.set(guild, "cmd-ping", json!(false)).await.unwrap();
        provider.set(SettingsScope::Global, "grp-util", json!(false)).await.unwrap();
        provider.set(SettingsScope::Global, "cmd-help", json!(false)).await.unwrap();

        let fw = framework();
        SettingsSync::new(provider, Arc::clone(&fw)).init().await.unwrap();

        assert_eq!(fw.prefix(Some(GuildId(5))).as_deref(), Some("$"));
        let ping = fw.registry().resolve_command("ping").unwrap();
        assert!(!ping.is_own_enabled_in(Some(GuildId(5))));
        assert!(!fw.registry().group("util").unwrap().is_enabled_in(None));
        // guarded
        assert!(fw.registry().resolve_command("help").unwrap().is_enabled_in(None));
    }

    #[tokio::test]
    async fn test_changes_are_persisted() {
        let provider = Arc::new(MemoryProvider::new());
        let fw = framework();
        let handle = SettingsSync::new(provider.clone(), Arc::clone(&fw))
            .start()
            .await
            .unwrap();

        let guild = SettingsScope::Guild(GuildId(8));
        let ping = fw.registry().resolve_command("ping").unwrap();
        fw.set_command_enabled(&ping, guild, false).unwrap();
        fw.set_prefix(guild, None);

        let mut persisted = false;
        for _ in 0..100 {
            let prefix = provider.get(guild, PREFIX_KEY, Value::Null).await.unwrap();
            let ping_state = provider.get(guild, "cmd-ping", Value::Null).await.unwrap();
            if prefix == json!("") && ping_state == json!(false) {
                persisted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(persisted);

        fw.reset_prefix(guild);
        for _ in 0..100 {
            if provider.get(guild, PREFIX_KEY, Value::Null).await.unwrap() == Value::Null {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            provider.get(guild, PREFIX_KEY, Value::Null).await.unwrap(),
            Value::Null
        );
        handle.abort();
    }

    #[tokio::test]
    async fn test_task_ends_when_framework_is_dropped() {
        let provider = Arc::new(MemoryProvider::new());
        let handle = SettingsSync::new(provider, framework())
            .start()
            .await
            .unwrap();

        let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }
}
