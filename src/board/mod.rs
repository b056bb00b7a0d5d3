//! Ticket list synchronization.
//!
//! `BoardModel` owns the authoritative in-memory ticket list for one view,
//! merges realtime insert/delete events into it, recomputes the aggregate
//! stats on every mutation, and tracks the selection and row-menu state.
//! State is kept separate from any rendering concern so the merge logic is
//! unit-testable.
//!
//! A board runs in one of two mutually exclusive modes:
//!
//! - **live**: loaded from the store and fed by the change subscription
//!   plus the session's deletion fan-out;
//! - **filtered**: built over an externally supplied ticket set, a pure
//!   function of its input, with no subscription.
//!
//! The change feed gives no ordering guarantee relative to an in-flight
//! `list()` call, so every insert path de-duplicates by id: re-applying an
//! already-present ticket never produces a duplicate row.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::events::{DeskEvent, EventBus, Subscription};
use crate::store::{ChangeEvent, TicketStore};
use crate::types::{Ticket, TicketStats};

/// Load state of a board. `Ready` is re-entered on every successful
/// refresh; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
}

#[derive(Debug, Default)]
pub struct BoardModel {
    load_state: LoadState,
    tickets: Vec<Ticket>,
    stats: TicketStats,
    selected: Option<String>,
    open_menu: Option<String>,
    filtered: bool,
}

impl BoardModel {
    /// A live board, empty until the first refresh.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board over an externally supplied filtered ticket set. Filtered
    /// boards never refresh and open no subscription; the list is a pure
    /// function of this input.
    pub fn filtered(tickets: Vec<Ticket>) -> Self {
        let mut board = Self {
            filtered: true,
            ..Self::default()
        };
        board.install(tickets);
        board
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn stats(&self) -> TicketStats {
        self.stats
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tickets.iter().any(|t| t.id == id)
    }

    pub fn ticket(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    /// Fetch the full list from the store. On success the board enters
    /// `Ready` with the returned rows; on failure the prior list survives
    /// untouched and the error is only logged, leaving an empty or stale
    /// view rather than surfacing a banner.
    pub async fn refresh(&mut self, store: &dyn TicketStore) {
        if self.filtered {
            return;
        }
        let result = store.list().await;
        self.apply_refresh(result);
    }

    /// Apply the outcome of a `list()` call that was awaited elsewhere
    /// (used when the board sits behind a lock that must not be held
    /// across a suspension point).
    pub fn apply_refresh(&mut self, result: Result<Vec<Ticket>>) {
        match result {
            Ok(tickets) => {
                self.install(tickets);
                self.load_state = LoadState::Ready;
            }
            Err(e) => {
                tracing::warn!("ticket list fetch failed: {e}");
            }
        }
    }

    /// Merge one change-feed event.
    pub fn apply_change(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::Inserted(ticket) => self.apply_insert(ticket),
            ChangeEvent::Deleted(id) => self.apply_delete(&id),
        }
    }

    /// Prepend a new ticket. Inserts are assumed to describe newly created
    /// rows, so prepending preserves newest-first order. Idempotent: an id
    /// already present (e.g. from a racing `list()` response) is ignored.
    pub fn apply_insert(&mut self, ticket: Ticket) {
        if self.contains(&ticket.id) {
            return;
        }
        self.tickets.insert(0, ticket);
        self.after_mutation();
    }

    /// Drop the matching row, whether announced by the remote feed or by
    /// the local deletion fan-out. Unknown ids are ignored.
    pub fn apply_delete(&mut self, id: &str) {
        let before = self.tickets.len();
        self.tickets.retain(|t| t.id != id);
        if self.tickets.len() == before {
            return;
        }

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.open_menu.as_deref() == Some(id) {
            self.open_menu = None;
        }
        self.after_mutation();
    }

    /// React to a session fan-out event.
    pub fn handle_desk_event(&mut self, event: &DeskEvent) {
        match event {
            DeskEvent::TicketDeleted { id } => self.apply_delete(id),
        }
    }

    /// Select a ticket for the detail view. Returns the selection so the
    /// shell can hand a copy to the conversation controller.
    pub fn select(&mut self, id: &str) -> Option<&Ticket> {
        if !self.contains(id) {
            return None;
        }
        self.selected = Some(id.to_string());
        self.ticket(id)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Ticket> {
        self.selected.as_deref().and_then(|id| self.ticket(id))
    }

    /// Toggle the row action menu for a ticket. At most one menu is open
    /// at a time; toggling another row's menu moves it there.
    pub fn toggle_menu(&mut self, id: &str) {
        if self.open_menu.as_deref() == Some(id) {
            self.open_menu = None;
        } else if self.contains(id) {
            self.open_menu = Some(id.to_string());
        }
    }

    /// Close whatever menu is open (a click outside any menu).
    pub fn close_menu(&mut self) {
        self.open_menu = None;
    }

    pub fn open_menu(&self) -> Option<&str> {
        self.open_menu.as_deref()
    }

    /// Delete through the store, then announce on the bus so every other
    /// mounted board drops the row too, then drop it here. The local drop
    /// and the fan-out delivery are each idempotent, so a board that is
    /// also subscribed converges to the same list.
    ///
    /// Callers holding this board behind a lock must not invoke this while
    /// a bus handler needs that same lock; route through the shell there.
    pub async fn delete_ticket(
        &mut self,
        store: &dyn TicketStore,
        bus: &EventBus,
        id: &str,
    ) -> Result<()> {
        store.delete(id).await?;
        bus.publish(&DeskEvent::TicketDeleted { id: id.to_string() });
        self.apply_delete(id);
        Ok(())
    }

    /// Replace the list wholesale, de-duplicating by id (first occurrence
    /// wins; the store returns newest first).
    fn install(&mut self, tickets: Vec<Ticket>) {
        let mut seen: HashSet<String> = HashSet::with_capacity(tickets.len());
        self.tickets = tickets
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();

        if let Some(selected) = self.selected.clone()
            && !self.contains(&selected)
        {
            self.selected = None;
        }
        if let Some(menu) = self.open_menu.clone()
            && !self.contains(&menu)
        {
            self.open_menu = None;
        }
        self.after_mutation();
    }

    fn after_mutation(&mut self) {
        // One shared path for both modes, so filtered boards keep their
        // stats in step with deletions as well.
        self.stats = TicketStats::compute(&self.tickets);
    }
}

/// Mount a shared board on the session bus so deletion fan-out reaches it.
/// The subscription must be held for as long as the board is mounted.
pub fn mount_on_bus(bus: &EventBus, board: Arc<Mutex<BoardModel>>) -> Subscription {
    bus.subscribe(move |event| {
        board.lock().handle_desk_event(event);
    })
}
