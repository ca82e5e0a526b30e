use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::infra::api::NotificationApi;

const BADGE_CAP: u64 = 99;

/// Server-sourced unread count with local optimistic adjustments.
///
/// The value is never derived from cached items. `refresh` overwrites any
/// local adjustment unconditionally.
pub struct UnreadCounter {
    api: Arc<dyn NotificationApi>,
    value: AtomicU64,
}

impl UnreadCounter {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self {
            api,
            value: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Fetches the authoritative count. Failures are logged and swallowed;
    /// the previous value stays until the next cycle.
    pub async fn refresh(&self) -> Option<u64> {
        match self.api.unread_count().await {
            Ok(count) => {
                self.value.store(count, Ordering::SeqCst);
                debug!(unread = count, "unread count refreshed");
                Some(count)
            }
            Err(err) => {
                warn!(error = ?err, "failed to refresh unread count");
                None
            }
        }
    }

    /// Saturating decrement; returns the new value.
    pub fn decrement_locally(&self, n: u64) -> u64 {
        let previous = self
            .value
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                Some(value.saturating_sub(n))
            })
            .unwrap_or_else(|value| value);
        previous.saturating_sub(n)
    }

    pub fn clear_locally(&self) {
        self.value.store(0, Ordering::SeqCst);
    }

    /// Badge text: hidden at zero, capped at "99+".
    pub fn badge(&self) -> Option<String> {
        match self.get() {
            0 => None,
            count if count > BADGE_CAP => Some(format!("{}+", BADGE_CAP)),
            count => Some(count.to_string()),
        }
    }
}
