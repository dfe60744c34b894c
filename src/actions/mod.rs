//! Actions the remote agent can invoke on the UI
//!
//! The agent sees each action as a named tool with a JSON Schema for its
//! arguments. When an `ActionExecutionMessage` arrives, the relay looks the
//! handler up here and feeds the outcome back as a `ResultMessage`.
//!
//! # Built-in actions
//!
//! - `edit_product_canvas` - remove products from the canvas, move them to or
//!   out of the wishlist
//! - `list_products` - propose a product list; blocks until the user accepts,
//!   rejects, or asks for more

pub mod canvas;
pub mod list_products;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::{ProposalBusy, SharedSession};

pub use canvas::EditProductCanvas;
pub use list_products::ListProducts;

/// Errors that can occur while running an action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error(transparent)]
    ProposalPending(#[from] ProposalBusy),

    #[error("Product proposal was dropped before the user answered")]
    ProposalAbandoned,
}

/// Definition of an action the agent can call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Unique name of the action (e.g., "list_products")
    pub name: String,

    /// Description for the agent to understand when to use this action
    pub description: String,

    /// JSON Schema defining the expected arguments
    pub parameters: Value,

    /// Whether the UI renders a prompt and waits for the user before answering
    #[serde(default)]
    pub render_and_wait: bool,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            render_and_wait: false,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn waiting_for_user(mut self) -> Self {
        self.render_and_wait = true;
        self
    }
}

/// Result of running an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,

    /// What the agent receives
    pub output: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success(output: impl Into<Value>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            output: Value::String(error.clone()),
            error: Some(error),
        }
    }
}

/// A handler for one agent-invocable action
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn definition(&self) -> ActionDefinition;

    async fn execute(&self, session: &SharedSession, args: Value) -> Result<ActionResult, ActionError>;
}

/// Name-indexed set of action handlers
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the canvas actions the shopping agent expects
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(EditProductCanvas);
        registry.register(ListProducts);
        registry
    }

    pub fn register<H: ActionHandler + 'static>(&mut self, handler: H) {
        let name = handler.definition().name;
        self.handlers.insert(name, Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Definitions sorted by name, as advertised to the agent
    pub fn definitions(&self) -> Vec<ActionDefinition> {
        let mut definitions: Vec<_> = self.handlers.values().map(|h| h.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub async fn execute(
        &self,
        name: &str,
        session: &SharedSession,
        args: Value,
    ) -> Result<ActionResult, ActionError> {
        let handler = self
            .get(name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;
        handler.execute(session, args).await
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
