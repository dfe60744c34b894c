//! `edit_product_canvas`: agent-driven canvas and wishlist edits

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{CanvasEdit, SharedSession};

use super::{ActionDefinition, ActionError, ActionHandler, ActionResult};

pub const NAME: &str = "edit_product_canvas";
pub const CONFIRMATION: &str = "Product edited successfully";

#[derive(Debug, Deserialize)]
struct ProductRef {
    product_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct CanvasEditArgs {
    #[serde(default)]
    remove_from_canvas: Vec<ProductRef>,
    #[serde(default)]
    move_to_wishlist: Vec<ProductRef>,
    #[serde(default)]
    remove_from_wishlist: Vec<ProductRef>,
}

fn ids(refs: Vec<ProductRef>) -> Vec<String> {
    refs.into_iter().map(|r| r.product_id).collect()
}

impl From<CanvasEditArgs> for CanvasEdit {
    fn from(args: CanvasEditArgs) -> Self {
        Self {
            remove_from_canvas: ids(args.remove_from_canvas),
            move_to_wishlist: ids(args.move_to_wishlist),
            remove_from_wishlist: ids(args.remove_from_wishlist),
        }
    }
}

fn product_refs(description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": {
            "type": "object",
            "properties": {
                "product_id": { "type": "string", "description": "The id of the product" }
            },
            "required": ["product_id"]
        }
    })
}

pub struct EditProductCanvas;

#[async_trait]
impl ActionHandler for EditProductCanvas {
    fn definition(&self) -> ActionDefinition {
        ActionDefinition::new(
            NAME,
            "Edit the products on the canvas: move them to the wishlist, remove them \
             from the wishlist, or remove them from the product canvas",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "remove_from_canvas": product_refs("Products to remove from the canvas"),
                "move_to_wishlist": product_refs("Products to move to the wishlist"),
                "remove_from_wishlist": product_refs("Products to remove from the wishlist")
            },
            "required": []
        }))
    }

    async fn execute(&self, session: &SharedSession, args: Value) -> Result<ActionResult, ActionError> {
        let args: CanvasEditArgs = if args.is_null() {
            CanvasEditArgs::default()
        } else {
            serde_json::from_value(args)?
        };
        let edit = CanvasEdit::from(args);

        let changed = session.lock().await.edit_canvas(&edit).await;
        tracing::debug!(changed, "Applied canvas edit {:?}", edit);

        Ok(ActionResult::success(CONFIRMATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::test_session;
    use crate::catalog::{self, Product};
    use crate::core::StatePatch;

    async fn seeded() -> SharedSession {
        let session = test_session().await;
        session
            .lock()
            .await
            .set_state(StatePatch {
                products: Some(vec![
                    Product::new("P1", "One"),
                    Product::new("P2", "Two"),
                    Product::new("P3", "Three"),
                ]),
                buffered_products: Some(vec![Product::new("B1", "Buffered")]),
                ..Default::default()
            })
            .await;
        session
    }

    #[tokio::test]
    async fn test_remove_from_canvas_backfills() {
        let session = seeded().await;
        let result = EditProductCanvas
            .execute(&session, json!({ "remove_from_canvas": [{ "product_id": "P2" }] }))
            .await
            .unwrap();

        assert_eq!(result.output, json!(CONFIRMATION));
        let guard = session.lock().await;
        let state = guard.current_state().unwrap();
        assert_eq!(catalog::ids(&state.products), vec!["P1", "P3", "B1"]);
        assert!(state.buffered_products.is_empty());
    }

    #[tokio::test]
    async fn test_wishlist_moves() {
        let session = seeded().await;
        EditProductCanvas
            .execute(
                &session,
                json!({
                    "move_to_wishlist": [{ "product_id": "P1" }, { "product_id": "P3" }],
                    "remove_from_wishlist": [{ "product_id": "P1" }]
                }),
            )
            .await
            .unwrap();

        let guard = session.lock().await;
        let state = guard.current_state().unwrap();
        assert_eq!(catalog::ids(&state.wishlist), vec!["P3"]);
        assert!(state.wishlist_consistent());
        assert_eq!(state.products.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_ids_still_confirm() {
        let session = seeded().await;
        let result = EditProductCanvas
            .execute(&session, json!({ "remove_from_canvas": [{ "product_id": "zzz" }] }))
            .await;
        tokio_test::assert_ok!(&result);

        let guard = session.lock().await;
        assert_eq!(guard.current_state().unwrap().products.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_arguments() {
        let session = seeded().await;
        let result = EditProductCanvas
            .execute(&session, json!({ "remove_from_canvas": "P1" }))
            .await;
        assert!(matches!(result, Err(ActionError::InvalidArguments(_))));
    }
}
