//! `list_products`: product proposals that wait on the user
//!
//! The handler parks the proposal on the session and returns only once the
//! user has accepted, rejected, or asked for more. The session lock is not
//! held while waiting.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::{ProductProposal, SharedSession};

use super::{ActionDefinition, ActionError, ActionHandler, ActionResult};

pub const NAME: &str = "list_products";

pub struct ListProducts;

#[async_trait]
impl ActionHandler for ListProducts {
    fn definition(&self) -> ActionDefinition {
        ActionDefinition::new(NAME, "A list of products that are scraped from the web")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "products": {
                        "type": "array",
                        "description": "Top products to show on the canvas",
                        "items": { "type": "object" }
                    },
                    "buffer_products": {
                        "type": "array",
                        "description": "All products found, used for backfill and 'show more'",
                        "items": { "type": "object" }
                    }
                },
                "required": ["products", "buffer_products"]
            }))
            .waiting_for_user()
    }

    async fn execute(&self, session: &SharedSession, args: Value) -> Result<ActionResult, ActionError> {
        let proposal: ProductProposal = serde_json::from_value(args)?;
        let count = proposal.products.len();

        let receiver = session.lock().await.open_proposal(proposal)?;
        tracing::info!("Waiting for the user to review {} proposed product(s)", count);

        let choice = receiver.await.map_err(|_| ActionError::ProposalAbandoned)?;
        tracing::info!("Product proposal resolved: {:?}", choice);

        Ok(ActionResult::success(choice.response()))
    }
}
