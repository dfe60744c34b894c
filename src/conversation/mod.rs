//! Conversation types

mod message;

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::core::AgentState;

pub use message::{ActionExecutionMessage, AgentStateMessage, Message, MessageDecodeError};

pub type ConversationId = u64;

/// One chat session: its history and the agent state it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    pub messages: Vec<Message>,
    pub state: AgentState,
}

impl Conversation {
    /// Fresh conversation seeded with the durable wishlist
    pub fn new(id: ConversationId, wishlist: Vec<Product>) -> Self {
        Self {
            id,
            name: default_name(id),
            messages: Vec::new(),
            state: AgentState::seeded(wishlist),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

pub fn default_name(id: ConversationId) -> String {
    format!("Conversation {}", id)
}

/// Sidebar entry for a conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub name: String,
    pub message_count: usize,
    pub active: bool,
}
