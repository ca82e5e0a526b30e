use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::app::cache::{LoadOutcome, LoadState, MarkRead, NotificationCache};
use crate::app::counter::UnreadCounter;
use crate::config::bell::BellPolicy;
use crate::domain::notification::{Notification, NotificationId};
use crate::infra::api::NotificationApi;
use crate::jobs::unread_poller::UnreadPoller;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    pub open: bool,
    pub expanded: bool,
}

/// Scroll position of the expanded list, in the units the host reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    pub fn past(&self, threshold: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height * threshold
    }
}

/// Bell widget controller.
///
/// Owns the dropdown view-state and orchestrates the [`NotificationCache`]
/// and the [`UnreadCounter`]. Mounting starts the unread poller; `unmount`
/// stops it and detaches the cache so no late result is applied.
pub struct BellWidget {
    policy: BellPolicy,
    counter: Arc<UnreadCounter>,
    cache: NotificationCache,
    view: Mutex<ViewState>,
    poller: Mutex<Option<UnreadPoller>>,
}

impl BellWidget {
    /// Must be called inside a tokio runtime.
    pub fn mount(api: Arc<dyn NotificationApi>, policy: BellPolicy) -> Self {
        let counter = Arc::new(UnreadCounter::new(api.clone()));
        let poller = UnreadPoller::spawn(counter.clone(), policy.poll_interval);
        info!(poll_secs = policy.poll_interval.as_secs(), "bell widget mounted");

        Self {
            policy,
            counter,
            cache: NotificationCache::new(api),
            view: Mutex::new(ViewState::default()),
            poller: Mutex::new(Some(poller)),
        }
    }

    /// Stops polling and detaches the cache. Safe to call more than once.
    pub async fn unmount(&self) {
        let poller = self.poller.lock().await.take();
        if let Some(poller) = poller {
            poller.stop().await;
            info!("bell widget unmounted");
        }
        self.cache.detach().await;
        *self.view.lock().await = ViewState::default();
    }

    pub async fn is_mounted(&self) -> bool {
        self.poller.lock().await.is_some()
    }

    pub fn policy(&self) -> &BellPolicy {
        &self.policy
    }

    pub fn counter(&self) -> &UnreadCounter {
        &self.counter
    }

    pub fn cache(&self) -> &NotificationCache {
        &self.cache
    }

    pub async fn view(&self) -> ViewState {
        *self.view.lock().await
    }

    pub fn unread_count(&self) -> u64 {
        self.counter.get()
    }

    pub fn badge(&self) -> Option<String> {
        self.counter.badge()
    }

    /// Bell click. Opening always starts collapsed and loads the first page
    /// when nothing is cached.
    pub async fn toggle(&self) -> Option<LoadOutcome> {
        let opened = {
            let mut view = self.view.lock().await;
            view.open = !view.open;
            if view.open {
                view.expanded = false;
            }
            view.open
        };

        if opened && self.cache.is_empty().await {
            return Some(self.cache.load_first_page(self.policy.page_size).await);
        }
        None
    }

    /// Any click outside the widget's subtree.
    pub async fn click_outside(&self) {
        *self.view.lock().await = ViewState::default();
    }

    /// "View all". Reloads a larger first page if the cache still holds at
    /// most one small page.
    pub async fn view_all(&self) -> Option<LoadOutcome> {
        {
            let mut view = self.view.lock().await;
            if !view.open {
                return None;
            }
            view.expanded = true;
        }

        if self.cache.len().await <= self.policy.page_size as usize {
            return Some(self.cache.load_first_page(self.policy.expanded_page_size).await);
        }
        None
    }

    /// "Collapse". Keeps the cache.
    pub async fn collapse(&self) {
        self.view.lock().await.expanded = false;
    }

    /// Scroll event from the expanded list. Past the threshold, requests the
    /// next page with the size the current window was loaded with.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Option<LoadOutcome> {
        let view = self.view().await;
        if !(view.open && view.expanded) || !metrics.past(self.policy.scroll_threshold) {
            return None;
        }

        let size = self.cache.inspect(|window| window.page_size()).await;
        let size = if size == 0 { self.policy.expanded_page_size } else { size };
        Some(self.cache.load_next_page(size).await)
    }

    /// Item click: marks read (decrementing the counter right after the
    /// local flip), closes the dropdown, and returns the link to navigate
    /// to, if any.
    pub async fn select(&self, id: NotificationId) -> Option<String> {
        let link = self
            .cache
            .inspect(|window| window.get(id).and_then(|item| item.link.clone()))
            .await;

        if self.cache.mark_read_local(id).await == MarkRead::Marked {
            self.counter.decrement_locally(1);
            self.cache.confirm_read(id).await;
        }

        *self.view.lock().await = ViewState::default();
        if let Some(link) = &link {
            debug!(notification_id = %id, link = %link, "navigating from notification");
        }
        link
    }

    /// "Mark all read": flips the cache and zeroes the counter locally.
    pub async fn mark_all_read(&self) -> usize {
        self.counter.clear_locally();
        self.cache.mark_all_read().await
    }

    /// Items currently on screen: the first `display_limit` while collapsed,
    /// everything while expanded, nothing while closed.
    pub async fn visible(&self) -> Vec<Notification> {
        let view = self.view().await;
        if !view.open {
            return Vec::new();
        }
        let limit = self.policy.display_limit;
        self.cache
            .inspect(|window| {
                let items = window.items();
                if view.expanded {
                    items.to_vec()
                } else {
                    items.iter().take(limit).cloned().collect()
                }
            })
            .await
    }

    /// Cached items beyond the collapsed display limit.
    pub async fn hidden_count(&self) -> usize {
        self.cache
            .len()
            .await
            .saturating_sub(self.policy.display_limit)
    }

    pub async fn shows_view_all(&self) -> bool {
        let view = self.view().await;
        view.open && !view.expanded && self.hidden_count().await > 0
    }

    /// Expanded, out of pages, and longer than the collapsed view.
    pub async fn reached_end(&self) -> bool {
        let view = self.view().await;
        let limit = self.policy.display_limit;
        view.expanded
            && self
                .cache
                .inspect(|window| window.is_loaded() && !window.has_more() && window.len() > limit)
                .await
    }

    pub async fn is_loading(&self) -> bool {
        self.cache
            .inspect(|window| window.state() == LoadState::LoadingFirst)
            .await
    }

    pub async fn is_loading_more(&self) -> bool {
        self.cache
            .inspect(|window| window.state() == LoadState::LoadingNext)
            .await
    }
}
