//! Chat message variants exchanged with the shopping agent
//!
//! Messages are immutable once created. Persisted or received messages are
//! plain JSON objects tagged by `type`; [`Message::decode`] turns them back
//! into typed variants and refuses anything it does not recognise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The agent asking the UI to run one of its registered actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExecutionMessage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an action execution, correlated by `action_execution_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub id: String,
    pub action_execution_id: String,
    pub action_name: String,
    #[serde(default)]
    pub result: Value,
    pub created_at: DateTime<Utc>,
}

/// Full agent state snapshot pushed by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStateMessage {
    pub id: String,
    pub agent_name: String,
    pub state: Value,
    #[serde(default)]
    pub running: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", try_from = "Value")]
pub enum Message {
    #[serde(rename = "TextMessage")]
    Text(TextMessage),
    #[serde(rename = "ActionExecutionMessage")]
    ActionExecution(ActionExecutionMessage),
    #[serde(rename = "ResultMessage")]
    Result(ResultMessage),
    #[serde(rename = "AgentStateMessage")]
    AgentState(AgentStateMessage),
}

#[derive(Debug, Error)]
pub enum MessageDecodeError {
    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("Message has no type tag")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid {kind}: {source}")]
    InvalidFields {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn fields<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    value: Value,
) -> Result<T, MessageDecodeError> {
    serde_json::from_value(value).map_err(|source| MessageDecodeError::InvalidFields { kind, source })
}

impl Message {
    /// Rebuild a typed message from its plain JSON form
    pub fn decode(value: Value) -> Result<Self, MessageDecodeError> {
        let Value::Object(mut map) = value else {
            return Err(MessageDecodeError::NotAnObject);
        };

        let kind = match map.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return Err(MessageDecodeError::MissingType),
        };
        let body = Value::Object(map);

        match kind.as_str() {
            "TextMessage" => fields("TextMessage", body).map(Message::Text),
            "ActionExecutionMessage" => {
                fields("ActionExecutionMessage", body).map(Message::ActionExecution)
            }
            "ResultMessage" => fields("ResultMessage", body).map(Message::Result),
            "AgentStateMessage" => fields("AgentStateMessage", body).map(Message::AgentState),
            _ => Err(MessageDecodeError::UnknownType(kind)),
        }
    }

    /// Decode a list, failing on the first bad entry
    pub fn decode_all(values: Vec<Value>) -> Result<Vec<Self>, MessageDecodeError> {
        values.into_iter().map(Message::decode).collect()
    }

    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Message::Text(TextMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        })
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn action_execution(name: impl Into<String>, arguments: Value) -> Self {
        Message::ActionExecution(ActionExecutionMessage {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            parent_message_id: None,
            created_at: Utc::now(),
        })
    }

    /// Result correlated to the given execution
    pub fn result_for(execution: &ActionExecutionMessage, result: Value) -> Self {
        Message::Result(ResultMessage {
            id: Uuid::new_v4().to_string(),
            action_execution_id: execution.id.clone(),
            action_name: execution.name.clone(),
            result,
            created_at: Utc::now(),
        })
    }

    pub fn agent_state(agent_name: impl Into<String>, state: Value) -> Self {
        Message::AgentState(AgentStateMessage {
            id: Uuid::new_v4().to_string(),
            agent_name: agent_name.into(),
            state,
            running: false,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Message::Text(m) => &m.id,
            Message::ActionExecution(m) => &m.id,
            Message::Result(m) => &m.id,
            Message::AgentState(m) => &m.id,
        }
    }
}

impl TryFrom<Value> for Message {
    type Error = MessageDecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Message::decode(value)
    }
}
