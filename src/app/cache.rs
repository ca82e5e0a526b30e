//! Paginated notification cache.
//!
//! [`PageWindow`] is the synchronous state machine: it owns the ordered
//! items, the page cursor and the load state, and hands out [`LoadTicket`]s
//! so a load is split into `begin_*` / `complete_*` halves around the
//! network call. [`NotificationCache`] drives it against a
//! [`NotificationApi`].
//!
//! Invariants held by `PageWindow`:
//! - `items` never contains the same id twice; appended pages go after the
//!   existing items and nothing is re-sorted.
//! - at most one load is outstanding for the current generation; a second
//!   next-page request while one is in flight is refused, not queued.
//! - an id observed read stays read for the lifetime of the window.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::domain::notification::{Notification, NotificationId};
use crate::infra::api::{ApiError, NotificationApi, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    LoadingFirst,
    LoadingNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    First,
    Next,
}

/// Proof that a load was started. Only the ticket of the current
/// generation may complete into the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    kind: LoadKind,
    request: PageRequest,
}

impl LoadTicket {
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Items were stored; `added` counts new ids.
    Loaded { added: usize },
    /// The next page came back empty; `has_more` is now false.
    Exhausted,
    /// Refused by the guard (in flight, no more pages, or detached).
    Skipped,
    /// A newer load superseded this one; the result was discarded.
    Stale,
    /// The backend call failed; the window is unchanged.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkRead {
    Marked,
    AlreadyRead,
    Missing,
}

#[derive(Debug)]
pub struct PageWindow {
    items: Vec<Notification>,
    ids: HashSet<NotificationId>,
    read_ids: HashSet<NotificationId>,
    page: u32,
    page_size: u32,
    has_more: bool,
    loaded: bool,
    detached: bool,
    state: LoadState,
    generation: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl PageWindow {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            read_ids: HashSet::new(),
            page: 0,
            page_size: 0,
            has_more: true,
            loaded: false,
            detached: false,
            state: LoadState::Idle,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size the current window was loaded with; 0 before the first load.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Starts a first-page load. Always granted while attached; any load
    /// still outstanding becomes stale.
    pub fn begin_first(&mut self, size: u32) -> Option<LoadTicket> {
        if self.detached {
            return None;
        }
        self.generation += 1;
        self.state = LoadState::LoadingFirst;
        Some(LoadTicket {
            generation: self.generation,
            kind: LoadKind::First,
            request: PageRequest::new(0, size),
        })
    }

    /// Starts a next-page load, or refuses when nothing is loaded yet, no
    /// more pages exist, or another load is in flight.
    pub fn begin_next(&mut self, size: u32) -> Option<LoadTicket> {
        if self.detached || !self.loaded || !self.has_more || self.state != LoadState::Idle {
            return None;
        }
        self.state = LoadState::LoadingNext;
        Some(LoadTicket {
            generation: self.generation,
            kind: LoadKind::Next,
            request: PageRequest::new(self.page + 1, size),
        })
    }

    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Notification>, ApiError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation || self.detached {
            return LoadOutcome::Stale;
        }
        self.state = LoadState::Idle;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(_) => return LoadOutcome::Failed,
        };
        let full_page = fetched.len() >= ticket.request.size as usize;

        match ticket.kind {
            LoadKind::First => {
                self.items.clear();
                self.ids.clear();
                let added = self.append(fetched);
                self.page = 0;
                self.page_size = ticket.request.size;
                self.has_more = full_page;
                self.loaded = true;
                LoadOutcome::Loaded { added }
            }
            LoadKind::Next => {
                if fetched.is_empty() {
                    self.has_more = false;
                    return LoadOutcome::Exhausted;
                }
                let added = self.append(fetched);
                self.page = ticket.request.page;
                self.has_more = full_page;
                LoadOutcome::Loaded { added }
            }
        }
    }

    /// Releases the guard for a load whose result will never arrive. A
    /// ticket from an older generation changes nothing.
    pub fn abandon(&mut self, ticket: LoadTicket) {
        if ticket.generation != self.generation || self.detached {
            return;
        }
        let expected = match ticket.kind {
            LoadKind::First => LoadState::LoadingFirst,
            LoadKind::Next => LoadState::LoadingNext,
        };
        if self.state == expected {
            self.state = LoadState::Idle;
        }
    }

    fn append(&mut self, fetched: Vec<Notification>) -> usize {
        let mut added = 0;
        for mut item in fetched {
            if !self.ids.insert(item.id) {
                continue;
            }
            if item.is_read {
                self.read_ids.insert(item.id);
            } else if self.read_ids.contains(&item.id) {
                item.is_read = true;
            }
            self.items.push(item);
            added += 1;
        }
        added
    }

    pub fn mark_read(&mut self, id: NotificationId) -> MarkRead {
        let outcome = match self.items.iter_mut().find(|item| item.id == id) {
            None => MarkRead::Missing,
            Some(item) if item.is_read => MarkRead::AlreadyRead,
            Some(item) => {
                item.is_read = true;
                MarkRead::Marked
            }
        };
        if outcome != MarkRead::Missing {
            self.read_ids.insert(id);
        }
        outcome
    }

    /// Flips every cached item to read; returns how many changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            if !item.is_read {
                item.is_read = true;
                changed += 1;
            }
            self.read_ids.insert(item.id);
        }
        changed
    }

    pub fn remove(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.items.iter().position(|item| item.id == id)?;
        self.ids.remove(&id);
        Some(self.items.remove(index))
    }

    /// Invalidates outstanding loads and refuses new ones.
    pub fn detach(&mut self) {
        self.detached = true;
        self.generation += 1;
        self.state = LoadState::Idle;
    }
}

/// Holds a started load's ticket across the backend call. Dropping it
/// before `complete` (the caller's future was cancelled) abandons the load
/// so the window does not stay in a loading state.
struct PendingLoad<'a> {
    window: &'a Mutex<PageWindow>,
    ticket: Option<LoadTicket>,
}

impl<'a> PendingLoad<'a> {
    fn new(window: &'a Mutex<PageWindow>, ticket: LoadTicket) -> Self {
        Self {
            window,
            ticket: Some(ticket),
        }
    }

    fn complete(mut self, result: Result<Vec<Notification>, ApiError>) -> LoadOutcome {
        match self.ticket.take() {
            Some(ticket) => lock(self.window).complete(ticket, result),
            None => LoadOutcome::Stale,
        }
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            debug!(page = ticket.request.page, "notification page load cancelled");
            lock(self.window).abandon(ticket);
        }
    }
}

fn lock(window: &Mutex<PageWindow>) -> MutexGuard<'_, PageWindow> {
    window.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Async driver for [`PageWindow`]. The lock is never held across a
/// backend call.
pub struct NotificationCache {
    api: Arc<dyn NotificationApi>,
    window: Mutex<PageWindow>,
}

impl NotificationCache {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self {
            api,
            window: Mutex::new(PageWindow::new()),
        }
    }

    /// Replaces the window with page 0. Failures leave the window as it was.
    pub async fn load_first_page(&self, size: u32) -> LoadOutcome {
        let ticket = match self.window().begin_first(size) {
            Some(ticket) => ticket,
            None => return LoadOutcome::Skipped,
        };
        self.run(ticket).await
    }

    /// Appends page `page + 1`. Refused while another load is in flight or
    /// when the last page was short.
    pub async fn load_next_page(&self, size: u32) -> LoadOutcome {
        let ticket = match self.window().begin_next(size) {
            Some(ticket) => ticket,
            None => {
                debug!(size, "next page load skipped");
                return LoadOutcome::Skipped;
            }
        };
        self.run(ticket).await
    }

    async fn run(&self, ticket: LoadTicket) -> LoadOutcome {
        let request = ticket.request();
        let pending = PendingLoad::new(&self.window, ticket);
        let result = self.api.list(request).await;
        if let Err(err) = &result {
            warn!(error = ?err, page = request.page, size = request.size, "failed to load notifications");
        }
        let outcome = pending.complete(result);
        if outcome == LoadOutcome::Stale {
            debug!(page = request.page, "discarded stale notification page");
        }
        outcome
    }

    /// Local half of `mark_read`: flips the cached item without touching
    /// the backend.
    pub async fn mark_read_local(&self, id: NotificationId) -> MarkRead {
        self.window().mark_read(id)
    }

    /// Backend half of `mark_read`. Failures are swallowed and the local
    /// flip is kept.
    pub async fn confirm_read(&self, id: NotificationId) {
        if let Err(err) = self.api.mark_read(id).await {
            warn!(error = ?err, notification_id = %id, "failed to mark notification read");
        }
    }

    /// Optimistically marks one item read. Idempotent: an already-read or
    /// absent item issues no backend call.
    pub async fn mark_read(&self, id: NotificationId) -> MarkRead {
        let outcome = self.mark_read_local(id).await;
        if outcome == MarkRead::Marked {
            self.confirm_read(id).await;
        }
        outcome
    }

    /// Optimistically marks every cached item read and asks the backend to
    /// do the same for all of the caller's notifications.
    pub async fn mark_all_read(&self) -> usize {
        let changed = self.window().mark_all_read();
        if let Err(err) = self.api.mark_all_read().await {
            warn!(error = ?err, "failed to mark all notifications read");
        }
        changed
    }

    /// Deletes on the backend and drops the local copy. A notification the
    /// backend no longer knows counts as deleted.
    pub async fn delete(&self, id: NotificationId) -> Result<(), ApiError> {
        match self.api.delete(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                debug!(notification_id = %id, "notification already gone");
            }
            Err(err) => return Err(err),
        }
        self.window().remove(id);
        Ok(())
    }

    pub async fn detach(&self) {
        self.window().detach();
    }

    pub async fn snapshot(&self) -> Vec<Notification> {
        self.window().items().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.window().len()
    }

    pub async fn is_empty(&self) -> bool {
        self.window().is_empty()
    }

    fn window(&self) -> MutexGuard<'_, PageWindow> {
        lock(&self.window)
    }

    /// Runs `f` against the window under the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&PageWindow) -> R) -> R {
        let window = self.window();
        f(&*window)
    }
}
