//! View composition shell.
//!
//! Routes between the list, detail, and settings views and feeds selection
//! events between the board and the conversation controller. Views are a
//! closed enum matched exhaustively; there is no stringly-typed routing
//! and no unreachable view state.
//!
//! The shell also does the session wiring: it mounts the board on the
//! deletion fan-out bus and pumps the store's change feed into it. Both
//! hookups are torn down when the shell is dropped, and a change that
//! arrives after teardown is simply dropped with the receiver.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::board::{BoardModel, mount_on_bus};
use crate::conversation::ConversationModel;
use crate::error::Result;
use crate::events::{DeskEvent, EventBus, Subscription};
use crate::mailer::Mailer;
use crate::store::TicketStore;
use crate::types::TicketStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    Billing,
    Usage,
    Security,
    Appearance,
}

/// The admin dashboard's view variants. `Detail` data lives in the
/// shell's conversation slot, present exactly when this variant is
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    List,
    Detail,
    Settings(SettingsSection),
}

pub struct Shell {
    store: Arc<dyn TicketStore>,
    mailer: Arc<dyn Mailer>,
    bus: EventBus,
    board: Arc<Mutex<BoardModel>>,
    view: View,
    conversation: Option<ConversationModel>,
    _fanout: Subscription,
    pump: JoinHandle<()>,
}

impl Shell {
    /// Wire a shell over the session's collaborators. The board is
    /// mounted on the bus and the change feed starts pumping immediately;
    /// call [`Shell::activate`] for the initial list fetch.
    pub fn new(store: Arc<dyn TicketStore>, mailer: Arc<dyn Mailer>, bus: EventBus) -> Self {
        let board = Arc::new(Mutex::new(BoardModel::new()));
        let fanout = mount_on_bus(&bus, Arc::clone(&board));

        let mut changes = store.subscribe_changes();
        let pump_board = Arc::clone(&board);
        let pump = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) => pump_board.lock().apply_change(event),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("change feed lagged, skipped {skipped} events");
                    }
                }
            }
        });

        Self {
            store,
            mailer,
            bus,
            board,
            view: View::List,
            conversation: None,
            _fanout: fanout,
            pump,
        }
    }

    /// Initial fetch. The list call is awaited without holding the board
    /// lock so the feed pump stays live during the fetch.
    pub async fn activate(&self) {
        let result = self.store.list().await;
        self.board.lock().apply_refresh(result);
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Human-readable title for the active view.
    pub fn view_title(&self) -> &'static str {
        match self.view {
            View::List => "Dashboard",
            View::Detail => "Ticket",
            View::Settings(SettingsSection::Billing) => "Billing",
            View::Settings(SettingsSection::Usage) => "Usage",
            View::Settings(SettingsSection::Security) => "Security",
            View::Settings(SettingsSection::Appearance) => "Appearance",
        }
    }

    pub fn board(&self) -> &Arc<Mutex<BoardModel>> {
        &self.board
    }

    pub fn conversation(&self) -> Option<&ConversationModel> {
        self.conversation.as_ref()
    }

    pub fn conversation_mut(&mut self) -> Option<&mut ConversationModel> {
        self.conversation.as_mut()
    }

    /// Open a ticket in the detail view. The conversation controller gets
    /// its own copy of the ticket; the board keeps the list row. Returns
    /// false when the id is not on the board.
    pub fn open_ticket(&mut self, id: &str) -> bool {
        let ticket = {
            let mut board = self.board.lock();
            board.close_menu();
            board.select(id).cloned()
        };

        match ticket {
            Some(ticket) => {
                self.conversation = Some(ConversationModel::new(ticket));
                self.view = View::Detail;
                true
            }
            None => false,
        }
    }

    /// Close the detail view and return to the list. No list refresh is
    /// forced; the row may stay stale until the next event or reload.
    pub fn close_detail(&mut self) {
        self.conversation = None;
        self.board.lock().clear_selection();
        self.view = View::List;
    }

    pub fn open_settings(&mut self, section: SettingsSection) {
        self.view = View::Settings(section);
    }

    /// An interaction outside any open row menu closes it.
    pub fn outside_click(&self) {
        self.board.lock().close_menu();
    }

    /// Delete a ticket from the list view: store first, then fan-out. The
    /// board's own copy is removed by its bus subscription; this method
    /// never holds the board lock across the publish, so handlers are free
    /// to take it.
    pub async fn delete_ticket(&mut self, id: &str) -> Result<()> {
        self.board.lock().close_menu();
        self.store.delete(id).await?;
        self.bus
            .publish(&DeskEvent::TicketDeleted { id: id.to_string() });

        if self.view == View::Detail
            && self
                .conversation
                .as_ref()
                .is_some_and(|c| c.ticket().id == id)
        {
            self.close_detail();
        }
        Ok(())
    }

    /// Submit the open conversation's draft reply.
    pub async fn submit_reply(&mut self) -> Result<()> {
        let mailer = Arc::clone(&self.mailer);
        match self.conversation.as_mut() {
            Some(conversation) => conversation.submit_reply(mailer.as_ref()).await,
            None => Ok(()),
        }
    }

    /// Change the open conversation's ticket status.
    pub async fn change_status(&mut self, new_status: TicketStatus) -> Result<()> {
        let store = Arc::clone(&self.store);
        match self.conversation.as_mut() {
            Some(conversation) => conversation.change_status(store.as_ref(), new_status).await,
            None => Ok(()),
        }
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
