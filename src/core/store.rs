//! Conversation store and active-conversation selector
//!
//! The store owns every conversation. Exactly one is active; all reads of the
//! current history or state resolve through the active id on every call, so
//! there is never a stale copy to refresh.

use crate::catalog::Product;
use crate::conversation::{Conversation, ConversationId, ConversationSummary, Message};

use super::state::{AgentState, StatePatch};

#[derive(Debug, Clone)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: ConversationId,
    /// Highest id handed out; ids are never reused while the store lives
    high_water: ConversationId,
}

impl ConversationStore {
    /// Store holding one default conversation
    pub fn seeded(wishlist: Vec<Product>) -> Self {
        let first = Conversation::new(1, wishlist);
        Self {
            active: first.id,
            high_water: first.id,
            conversations: vec![first],
        }
    }

    /// Rebuild from persisted conversations; `None` when there is nothing usable
    ///
    /// Duplicate ids keep their first occurrence. The first conversation
    /// becomes active.
    pub fn restore(persisted: Vec<Conversation>) -> Option<Self> {
        let mut conversations: Vec<Conversation> = Vec::with_capacity(persisted.len());
        for conversation in persisted {
            if conversations.iter().any(|c| c.id == conversation.id) {
                tracing::warn!("Dropping duplicate persisted conversation {}", conversation.id);
                continue;
            }
            conversations.push(conversation);
        }

        let active = conversations.first()?.id;
        let high_water = conversations.iter().map(|c| c.id).max().unwrap_or(active);
        Some(Self {
            conversations,
            active,
            high_water,
        })
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    pub fn summaries(&self) -> Vec<ConversationSummary> {
        self.conversations
            .iter()
            .map(|c| ConversationSummary {
                id: c.id,
                name: c.name.clone(),
                message_count: c.messages.len(),
                active: c.id == self.active,
            })
            .collect()
    }

    // ========== Active-conversation selector ==========

    pub fn active_id(&self) -> ConversationId {
        self.active
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.get(self.active)
    }

    pub fn current_mut(&mut self) -> Option<&mut Conversation> {
        let active = self.active;
        self.get_mut(active)
    }

    pub fn current_messages(&self) -> &[Message] {
        self.current().map(|c| c.messages.as_slice()).unwrap_or(&[])
    }

    pub fn current_state(&self) -> Option<&AgentState> {
        self.current().map(|c| &c.state)
    }

    /// Merge into the active state; no-op without one
    pub fn set_state(&mut self, patch: StatePatch) -> bool {
        match self.current_mut() {
            Some(conversation) => {
                conversation.state.merge(patch);
                true
            }
            None => false,
        }
    }

    /// Append to the active history
    pub fn append(&mut self, message: Message) -> bool {
        match self.current_mut() {
            Some(conversation) => {
                conversation.push(message);
                true
            }
            None => false,
        }
    }

    // ========== Store operations ==========

    /// Allocate a new conversation and make it active
    pub fn create(&mut self, wishlist: Vec<Product>) -> ConversationId {
        let existing = self.conversations.iter().map(|c| c.id).max().unwrap_or(0);
        let id = self.high_water.max(existing) + 1;
        self.high_water = id;

        self.conversations.push(Conversation::new(id, wishlist));
        self.active = id;
        id
    }

    /// Remove a conversation; refused for the last one or an unknown id
    ///
    /// Returns the id that must be switched to when the active conversation
    /// was removed.
    pub fn delete(&mut self, id: ConversationId) -> Result<Option<ConversationId>, StoreRefusal> {
        if self.conversations.len() <= 1 {
            return Err(StoreRefusal::LastConversation);
        }
        let index = self
            .conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreRefusal::NotFound(id))?;

        self.conversations.remove(index);

        if id == self.active {
            Ok(self.conversations.first().map(|c| c.id))
        } else {
            Ok(None)
        }
    }

    pub fn rename(&mut self, id: ConversationId, name: &str) -> Result<(), StoreRefusal> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreRefusal::EmptyName);
        }
        let conversation = self.get_mut(id).ok_or(StoreRefusal::NotFound(id))?;
        conversation.name = name.to_string();
        Ok(())
    }

    /// Activate a conversation, refreshing its wishlist from durable data
    pub fn switch(&mut self, id: ConversationId, wishlist: Vec<Product>) -> Result<(), StoreRefusal> {
        let conversation = self.get_mut(id).ok_or(StoreRefusal::NotFound(id))?;

        let state = &mut conversation.state;
        state.results_visible = !state.products.is_empty();
        state.load_wishlist(wishlist);

        self.active = id;
        Ok(())
    }
}

/// Why a store operation did nothing; never surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreRefusal {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Cannot delete the last conversation")]
    LastConversation,

    #[error("Conversation name is empty")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn wishlist() -> Vec<Product> {
        vec![Product::new("w1", "Saved headphones")]
    }

    #[test]
    fn test_seeded_store() {
        let store = ConversationStore::seeded(wishlist());
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_id(), 1);
        assert_eq!(store.current().unwrap().name, "Conversation 1");
        assert_eq!(store.current_state().unwrap().wishlist.len(), 1);
    }

    #[test]
    fn test_create_allocates_increasing_ids() {
        let mut store = ConversationStore::seeded(Vec::new());
        let second = store.create(Vec::new());
        let third = store.create(Vec::new());

        assert_eq!(second, 2);
        assert_eq!(third, 3);
        assert_eq!(store.active_id(), 3);
        assert_eq!(store.current().unwrap().name, "Conversation 3");
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = ConversationStore::seeded(Vec::new());
        let second = store.create(Vec::new());
        store.delete(second).unwrap();

        let next = store.create(Vec::new());
        assert_eq!(next, 3);
    }

    #[test]
    fn test_create_delete_sequences_keep_invariants() {
        let mut store = ConversationStore::seeded(Vec::new());
        // Deterministic mix of operations, including refused deletes
        let script = [
            'c', 'd', 'd', 'c', 'c', 'd', 'c', 'd', 'd', 'd', 'c', 'c', 'c', 'd', 'd', 'd', 'd',
        ];

        for (step, op) in script.iter().enumerate() {
            match op {
                'c' => {
                    store.create(Vec::new());
                }
                _ => {
                    let target = store.conversations()[step % store.len()].id;
                    if let Ok(Some(next)) = store.delete(target) {
                        store.switch(next, Vec::new()).unwrap();
                    }
                }
            }

            assert!(store.len() >= 1);
            let ids: HashSet<_> = store.conversations().iter().map(|c| c.id).collect();
            assert_eq!(ids.len(), store.len());
            assert!(store.current().is_some());
        }
    }

    #[test]
    fn test_delete_last_is_refused() {
        let mut store = ConversationStore::seeded(Vec::new());
        assert_eq!(store.delete(1), Err(StoreRefusal::LastConversation));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_active_falls_to_first() {
        let mut store = ConversationStore::seeded(Vec::new());
        store.create(Vec::new());
        let third = store.create(Vec::new());

        assert_eq!(store.delete(third), Ok(Some(1)));
        assert_eq!(store.delete(99), Err(StoreRefusal::NotFound(99)));
    }

    #[test]
    fn test_delete_inactive_keeps_active() {
        let mut store = ConversationStore::seeded(Vec::new());
        let second = store.create(Vec::new());
        assert_eq!(store.delete(1), Ok(None));
        assert_eq!(store.active_id(), second);
    }

    #[test]
    fn test_rename() {
        let mut store = ConversationStore::seeded(Vec::new());
        store.rename(1, "  Laptops  ").unwrap();
        assert_eq!(store.current().unwrap().name, "Laptops");

        assert_eq!(store.rename(1, "   "), Err(StoreRefusal::EmptyName));
        assert_eq!(store.current().unwrap().name, "Laptops");
    }

    #[test]
    fn test_switch_recomputes_results_visible_from_target() {
        let mut store = ConversationStore::seeded(Vec::new());
        store.set_state(StatePatch {
            products: Some(vec![Product::new("p1", "One")]),
            results_visible: Some(false),
            ..Default::default()
        });

        let second = store.create(Vec::new());
        store.set_state(StatePatch {
            results_visible: Some(true),
            ..Default::default()
        });

        // Target has products but a stale flag
        store.switch(1, Vec::new()).unwrap();
        assert!(store.current_state().unwrap().results_visible);

        // Target has no products, previous active was visible
        store.switch(second, Vec::new()).unwrap();
        assert!(!store.current_state().unwrap().results_visible);
    }

    #[test]
    fn test_switch_reloads_wishlist() {
        let mut store = ConversationStore::seeded(Vec::new());
        store.create(Vec::new());

        store.switch(1, wishlist()).unwrap();
        let state = store.current_state().unwrap();
        assert_eq!(state.wishlist.len(), 1);
        assert!(state.is_favorite("w1"));
    }

    #[test]
    fn test_switch_unknown_is_noop() {
        let mut store = ConversationStore::seeded(Vec::new());
        assert_eq!(store.switch(7, Vec::new()), Err(StoreRefusal::NotFound(7)));
        assert_eq!(store.active_id(), 1);
    }

    #[test]
    fn test_reads_go_through_active_pointer() {
        let mut store = ConversationStore::seeded(Vec::new());
        store.append(Message::user("laptops"));
        assert_eq!(store.current_messages().len(), 1);

        store.create(Vec::new());
        assert!(store.current_messages().is_empty());

        store.switch(1, Vec::new()).unwrap();
        assert_eq!(store.current_messages().len(), 1);
    }

    #[test]
    fn test_restore() {
        let mut first = Conversation::new(4, Vec::new());
        first.name = "Phones".into();
        let persisted = vec![first, Conversation::new(9, Vec::new()), Conversation::new(4, Vec::new())];

        let mut store = ConversationStore::restore(persisted).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_id(), 4);
        assert_eq!(store.create(Vec::new()), 10);

        assert!(ConversationStore::restore(Vec::new()).is_none());
    }
}
