//! Chat relay between the session and the remote shopping agent
//!
//! The ChatRelay:
//! 1. Appends the user's message to the active conversation
//! 2. Sends the history, state, and available actions to the agent
//! 3. Appends every message the agent returns, merging state snapshots
//! 4. Runs requested actions and appends their results
//! 5. Repeats until the agent stops asking for actions

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::actions::{ActionRegistry, ActionResult};
use crate::conversation::{ActionExecutionMessage, ConversationId, Message};
use crate::transport::{AgentRequest, AgentTransport, TransportError};

use super::session::SharedSession;

/// Maximum agent round-trips per user message
const MAX_ACTION_ROUNDS: usize = 10;

/// Summary of an action run during a relay
#[derive(Debug, Clone, Serialize)]
pub struct ActionCallSummary {
    pub name: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    pub conversation_id: ConversationId,

    /// Messages appended during this relay, user message included
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub action_calls: Vec<ActionCallSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Max action rounds exceeded")]
    MaxRoundsExceeded,
}

pub struct ChatRelay {
    agent_name: String,
    session: SharedSession,
    transport: Arc<dyn AgentTransport>,
    actions: Arc<ActionRegistry>,
}

impl ChatRelay {
    pub fn new(
        agent_name: impl Into<String>,
        session: SharedSession,
        transport: Arc<dyn AgentTransport>,
        actions: Arc<ActionRegistry>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            session,
            transport,
            actions,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// New conversation; the transport's chat history starts over
    pub async fn new_conversation(&self) -> ConversationId {
        let id = self.session.lock().await.create_conversation().await;
        self.transport.reset();
        id
    }

    pub async fn switch_conversation(&self, id: ConversationId) -> bool {
        let mut session = self.session.lock().await;
        let changed = session.active_id() != id;
        let switched = session.switch_conversation(id).await;
        if switched && changed {
            self.transport.reset();
        }
        switched
    }

    pub async fn delete_conversation(&self, id: ConversationId) -> bool {
        let mut session = self.session.lock().await;
        let before = session.active_id();
        let deleted = session.delete_conversation(id).await;
        if session.active_id() != before {
            self.transport.reset();
        }
        deleted
    }

    /// Relay a user message and everything the agent does in response
    pub async fn send(&self, text: &str) -> Result<RelayOutcome, RelayError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let message = Message::user(text);
        self.session.lock().await.append_message(message.clone());

        let mut outcome = self.run().await?;
        outcome.messages.insert(0, message);
        Ok(outcome)
    }

    /// Let the agent continue from the current history without new user input
    pub async fn run(&self) -> Result<RelayOutcome, RelayError> {
        let mut outcome = RelayOutcome {
            conversation_id: self.session.lock().await.active_id(),
            messages: Vec::new(),
            action_calls: Vec::new(),
        };

        for _ in 0..MAX_ACTION_ROUNDS {
            let request = {
                let session = self.session.lock().await;
                AgentRequest {
                    agent: self.agent_name.clone(),
                    messages: session.current_messages().to_vec(),
                    state: session.current_state().cloned().unwrap_or_default(),
                    actions: self.actions.definitions(),
                }
            };

            let reply = self.transport.run(request).await?;

            let mut executions = Vec::new();
            {
                let mut session = self.session.lock().await;
                for message in reply.messages {
                    match &message {
                        Message::AgentState(snapshot) => {
                            session.apply_agent_state(snapshot).await;
                        }
                        Message::ActionExecution(execution) => executions.push(execution.clone()),
                        Message::Text(_) | Message::Result(_) => {}
                    }
                    session.append_message(message.clone());
                    outcome.messages.push(message);
                }
            }

            if executions.is_empty() {
                return Ok(outcome);
            }

            for execution in executions {
                let result = self.execute(&execution).await;
                outcome.action_calls.push(ActionCallSummary {
                    name: execution.name.clone(),
                    success: result.success,
                });

                let message = Message::result_for(&execution, result.output);
                self.session.lock().await.append_message(message.clone());
                outcome.messages.push(message);
            }
        }

        Err(RelayError::MaxRoundsExceeded)
    }

    async fn execute(&self, execution: &ActionExecutionMessage) -> ActionResult {
        let args = match &execution.arguments {
            Value::Null => Value::Object(Default::default()),
            args => args.clone(),
        };

        match self.actions.execute(&execution.name, &self.session, args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Action {} failed: {}", execution.name, e);
                ActionResult::failure(e.to_string())
            }
        }
    }
}
