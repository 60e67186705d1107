//! # Command Throttling
//!
//! Per-user usage windows for a single command. A window opens on first use and
//! is dropped when its duration elapses; usages inside a window are capped.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Fixed windows per command with fire-once expiry
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use dashmap::DashMap;
use log::debug;
use serenity::model::id::UserId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlingOptions {
    /// Uses allowed per window
    pub usages: u32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Throttle {
    start: Instant,
    usages: u32,
}

#[derive(Clone)]
pub struct Throttles {
    records: Arc<DashMap<UserId, Throttle>>,
    options: ThrottlingOptions,
}

impl Throttles {
    pub fn new(options: ThrottlingOptions) -> Self {
        Throttles {
            records: Arc::new(DashMap::new()),
            options,
        }
    }

    pub fn options(&self) -> ThrottlingOptions {
        self.options
    }

    /// Time left in the user's window when one more use would exceed the ceiling
    ///
    /// Opens a window for the user if none is active.
    pub fn check(&self, user: UserId) -> Option<Duration> {
        let record = self.open(user);
        if record.usages + 1 > self.options.usages {
            let remaining = (record.start + self.options.duration).saturating_duration_since(Instant::now());
            Some(remaining)
        } else {
            None
        }
    }

    /// Count one use against the user's current window
    pub fn record_use(&self, user: UserId) {
        self.open(user);
        if let Some(mut record) = self.records.get_mut(&user) {
            record.usages += 1;
        }
    }

    pub fn usages(&self, user: UserId) -> u32 {
        self.records.get(&user).map_or(0, |r| r.usages)
    }

    fn open(&self, user: UserId) -> Throttle {
        let now = Instant::now();
        let mut created = false;
        let record = {
            let mut entry = self.records.entry(user).or_insert_with(|| {
                created = true;
                Throttle { start: now, usages: 0 }
            });
            // a window whose expiry task has not fired yet
            if now.duration_since(entry.start) >= self.options.duration {
                *entry = Throttle { start: now, usages: 0 };
                created = true;
            }
            *entry
        };
        if created {
            self.schedule_expiry(user, record.start);
        }
        record
    }

    fn schedule_expiry(&self, user: UserId, start: Instant) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let records = Arc::clone(&self.records);
        let duration = self.options.duration;
        handle.spawn(async move {
            sleep(duration).await;
            if records.remove_if(&user, |_, t| t.start == start).is_some() {
                debug!("Throttle window for {user} expired");
            }
        });
    }
}
