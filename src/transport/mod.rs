//! Remote agent transport
//!
//! The shopping agent runs elsewhere; this module only knows how to hand it
//! the current history and state and collect the messages it sends back.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::actions::ActionDefinition;
use crate::conversation::{Message, MessageDecodeError};
use crate::core::AgentState;

pub use http::HttpTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Undecodable message from agent: {0}")]
    Decode(#[from] MessageDecodeError),
}

/// One agent run: everything the agent needs to continue the conversation
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest {
    pub agent: String,
    pub messages: Vec<Message>,
    pub state: AgentState,
    pub actions: Vec<ActionDefinition>,
}

/// Messages produced by one agent run, in arrival order
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub messages: Vec<Message>,
}

/// Raw reply body; messages are decoded one by one
#[derive(Debug, Deserialize)]
pub(crate) struct ReplyEnvelope {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
}

#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn run(&self, request: AgentRequest) -> Result<AgentReply, TransportError>;

    /// Forget any pending chat history the transport holds
    fn reset(&self) {}
}
