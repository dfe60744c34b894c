//! The shopping session: sole owner of conversations, view, and pending proposal
//!
//! Every handler locks the session, runs to completion, and releases it, so
//! events are processed one at a time. The only suspension is a pending
//! product proposal, which parks the agent call outside the lock.

use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

use crate::catalog::Product;
use crate::conversation::{AgentStateMessage, ConversationId, ConversationSummary, Message};
use crate::storage::PersistenceBridge;

use super::proposal::{PendingProposal, ProductProposal, ProposalChoice};
use super::state::{AgentState, StatePatch};
use super::store::ConversationStore;
use super::sync::{self, ProposalLimits};
use super::view::{View, ViewRouter};

pub type SharedSession = Arc<Mutex<ShoppingSession>>;

/// Product ids per canvas operation, as sent by the agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanvasEdit {
    pub remove_from_canvas: Vec<String>,
    pub move_to_wishlist: Vec<String>,
    pub remove_from_wishlist: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("A product proposal is already waiting for the user")]
pub struct ProposalBusy;

pub struct ShoppingSession {
    store: ConversationStore,
    view: ViewRouter,
    bridge: PersistenceBridge,
    limits: ProposalLimits,
    pending: Option<PendingProposal>,
    report_in_flight: bool,
}

impl ShoppingSession {
    /// Rehydrate from durable storage, seeding one conversation if nothing usable is stored
    pub async fn load(bridge: PersistenceBridge, limits: ProposalLimits) -> Self {
        let wishlist = bridge.load_wishlist().await;

        let store = match bridge.load_history().await.and_then(ConversationStore::restore) {
            Some(mut store) => {
                let active = store.active_id();
                // The wishlist is user-level; the persisted copy may be stale
                if let Err(refusal) = store.switch(active, wishlist) {
                    tracing::warn!("Could not refresh wishlist of conversation {}: {}", active, refusal);
                }
                tracing::info!("Restored {} conversation(s)", store.len());
                store
            }
            None => ConversationStore::seeded(wishlist),
        };

        Self {
            store,
            view: ViewRouter::default(),
            bridge,
            limits,
            pending: None,
            report_in_flight: false,
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn active_id(&self) -> ConversationId {
        self.store.active_id()
    }

    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.store.summaries()
    }

    pub fn current_messages(&self) -> &[Message] {
        self.store.current_messages()
    }

    pub fn current_state(&self) -> Option<&AgentState> {
        self.store.current_state()
    }

    pub fn view(&self) -> View {
        self.view.current()
    }

    // ========== Conversations ==========

    pub async fn create_conversation(&mut self) -> ConversationId {
        let wishlist = self.bridge.load_wishlist().await;
        let id = self.store.create(wishlist);
        self.view.reset();
        tracing::info!("Created conversation {}", id);
        id
    }

    pub async fn delete_conversation(&mut self, id: ConversationId) -> bool {
        match self.store.delete(id) {
            Ok(Some(next)) => {
                self.switch_conversation(next).await;
                true
            }
            Ok(None) => true,
            Err(refusal) => {
                tracing::debug!("Delete of conversation {} refused: {}", id, refusal);
                false
            }
        }
    }

    pub fn rename_conversation(&mut self, id: ConversationId, name: &str) -> bool {
        match self.store.rename(id, name) {
            Ok(()) => true,
            Err(refusal) => {
                tracing::debug!("Rename of conversation {} refused: {}", id, refusal);
                false
            }
        }
    }

    pub async fn switch_conversation(&mut self, id: ConversationId) -> bool {
        let wishlist = self.bridge.load_wishlist().await;
        match self.store.switch(id, wishlist) {
            Ok(()) => {
                self.view.reset();
                true
            }
            Err(refusal) => {
                tracing::debug!("Switch to conversation {} refused: {}", id, refusal);
                false
            }
        }
    }

    pub fn append_message(&mut self, message: Message) -> bool {
        self.store.append(message)
    }

    // ========== Shared state ==========

    /// Merge into the active state, persisting the wishlist slice when it changed
    pub async fn set_state(&mut self, patch: StatePatch) -> bool {
        let touches_wishlist = patch.wishlist.is_some() || patch.favorites.is_some();
        if !self.store.set_state(patch) {
            return false;
        }
        if touches_wishlist {
            if let Some(state) = self.store.current_state() {
                self.bridge.save_wishlist(&state.wishlist).await;
            }
        }
        true
    }

    async fn apply(&mut self, plan: impl FnOnce(&AgentState) -> Option<StatePatch>) -> bool {
        let Some(patch) = self.store.current_state().and_then(plan) else {
            return false;
        };
        self.set_state(patch).await
    }

    /// Snapshot or delta pushed by the agent
    pub async fn apply_agent_state(&mut self, message: &AgentStateMessage) -> bool {
        match StatePatch::from_value(message.state.clone()) {
            Ok(patch) => self.set_state(patch).await,
            Err(e) => {
                tracing::warn!("Ignoring malformed state from {}: {}", message.agent_name, e);
                false
            }
        }
    }

    pub async fn toggle_wishlist(&mut self, product_id: &str) -> bool {
        self.apply(|state| sync::toggle_wishlist(state, product_id)).await
    }

    pub async fn clear_wishlist(&mut self) -> bool {
        self.apply(sync::clear_wishlist).await
    }

    /// Trash button on a product card
    pub async fn delete_product(&mut self, product_id: &str) -> bool {
        let ids = [product_id.to_string()];
        self.apply(|state| sync::remove_from_canvas(state, &ids)).await
    }

    /// Agent-driven canvas edit: move, then unwish, then remove
    pub async fn edit_canvas(&mut self, edit: &CanvasEdit) -> bool {
        let moved = self
            .apply(|state| sync::move_to_wishlist(state, &edit.move_to_wishlist))
            .await;
        let unwished = self
            .apply(|state| sync::remove_from_wishlist(state, &edit.remove_from_wishlist))
            .await;
        let removed = self
            .apply(|state| sync::remove_from_canvas(state, &edit.remove_from_canvas))
            .await;
        moved || unwished || removed
    }

    /// Source URL of a product on the canvas or in the wishlist
    pub fn product_link(&self, product_id: &str) -> Option<String> {
        let state = self.store.current_state()?;
        state
            .products
            .iter()
            .chain(state.wishlist.iter())
            .find(|p: &&Product| p.id == product_id)
            .and_then(|p| p.product_url.clone())
    }

    // ========== Product proposals ==========

    /// Park a proposal until the user answers
    ///
    /// A second proposal is refused while the first still has a waiting agent
    /// call; one whose caller went away is replaced.
    pub fn open_proposal(
        &mut self,
        proposal: ProductProposal,
    ) -> Result<oneshot::Receiver<ProposalChoice>, ProposalBusy> {
        if let Some(pending) = &self.pending {
            if !pending.is_abandoned() {
                return Err(ProposalBusy);
            }
            tracing::debug!("Replacing abandoned product proposal");
        }

        let (pending, receiver) = PendingProposal::open(proposal);
        self.pending = Some(pending);
        Ok(receiver)
    }

    pub fn pending_proposal(&self) -> Option<&ProductProposal> {
        self.pending.as_ref().map(|p| &p.proposal)
    }

    /// Apply the user's choice and release the waiting agent call
    pub async fn resolve_proposal(&mut self, choice: ProposalChoice) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };

        if let Some(patch) = sync::adopt_proposal(&pending.proposal, choice, self.limits) {
            self.set_state(patch).await;
        }
        if !pending.resolve(choice) {
            tracing::warn!("Product proposal resolved after its agent call went away");
        }
        true
    }

    // ========== Views ==========

    pub fn go_to_wishlist(&mut self) {
        self.view.go_to_wishlist();
    }

    /// Open the report view; true when no report exists yet and one should be requested
    ///
    /// Only one request is outstanding at a time; [`finish_report`] releases it.
    ///
    /// [`finish_report`]: Self::finish_report
    pub fn go_to_report(&mut self) -> bool {
        self.view.go_to_report();
        let missing = self
            .store
            .current_state()
            .map(|state| state.report.is_none())
            .unwrap_or(false);
        if !missing || self.report_in_flight {
            return false;
        }
        self.report_in_flight = true;
        true
    }

    pub fn finish_report(&mut self) {
        self.report_in_flight = false;
    }

    pub fn exit_to_products(&mut self) {
        self.view.exit_to_products();
    }

    // ========== Persistence ==========

    pub async fn persist_history(&self) {
        self.bridge.save_history(self.store.conversations()).await;
        tracing::debug!("Persisted {} conversation(s)", self.store.len());
    }
}
