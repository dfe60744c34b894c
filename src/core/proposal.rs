//! Blocking product proposals
//!
//! When the agent proposes a product list the UI must ask the user before
//! adopting it. The agent-side call is parked on a oneshot channel until the
//! UI resolves it with a [`ProposalChoice`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::catalog::{self, Product};

/// Candidate products plus the larger pool they were drawn from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductProposal {
    #[serde(default, deserialize_with = "catalog::product_list")]
    pub products: Vec<Product>,
    #[serde(
        default,
        rename = "buffer_products",
        alias = "buffer",
        deserialize_with = "catalog::product_list"
    )]
    pub buffer: Vec<Product>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalChoice {
    Accept,
    Reject,
    RequestMore,
}

impl ProposalChoice {
    /// What the agent receives as the action's result
    pub fn response(self) -> Value {
        match self {
            ProposalChoice::Accept => json!(true),
            ProposalChoice::Reject => json!("Rejected"),
            ProposalChoice::RequestMore => json!("Show more products"),
        }
    }
}

/// A proposal waiting on the user
#[derive(Debug)]
pub struct PendingProposal {
    pub proposal: ProductProposal,
    responder: oneshot::Sender<ProposalChoice>,
}

impl PendingProposal {
    /// Park a proposal; the receiver completes once the user chooses
    pub fn open(proposal: ProductProposal) -> (Self, oneshot::Receiver<ProposalChoice>) {
        let (responder, receiver) = oneshot::channel();
        (
            Self {
                proposal,
                responder,
            },
            receiver,
        )
    }

    /// The agent call that opened this proposal is gone
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_closed()
    }

    /// Hand the choice back to the waiting action; false if nobody waits anymore
    pub fn resolve(self, choice: ProposalChoice) -> bool {
        self.responder.send(choice).is_ok()
    }
}

/// Title/URL pairs the choice prompt lists
#[derive(Debug, Clone, Serialize)]
pub struct ProposalPreview {
    pub title: String,
    pub url: Option<String>,
}

impl ProductProposal {
    pub fn preview(&self) -> Vec<ProposalPreview> {
        self.products
            .iter()
            .map(|p| ProposalPreview {
                title: p.title.clone(),
                url: p.product_url.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolution_wakes_waiter() {
        let (pending, receiver) = PendingProposal::open(ProductProposal::default());

        let waiter = tokio::spawn(async move { receiver.await });
        assert!(pending.resolve(ProposalChoice::RequestMore));

        let choice = waiter.await.unwrap().unwrap();
        assert_eq!(choice, ProposalChoice::RequestMore);
    }

    #[test]
    fn test_resolve_without_waiter() {
        let (pending, receiver) = PendingProposal::open(ProductProposal::default());
        drop(receiver);
        assert!(!pending.resolve(ProposalChoice::Accept));
    }

    #[test]
    fn test_responses() {
        assert_eq!(ProposalChoice::Accept.response(), json!(true));
        assert_eq!(ProposalChoice::Reject.response(), json!("Rejected"));
        assert_eq!(ProposalChoice::RequestMore.response(), json!("Show more products"));
    }

    #[test]
    fn test_proposal_arguments() {
        let proposal: ProductProposal = serde_json::from_value(json!({
            "products": [{ "id": "p1", "title": "Laptop", "product_url": "https://x/p1" }],
            "buffer_products": [{ "id": "b1", "title": "Other laptop" }]
        }))
        .unwrap();

        assert_eq!(proposal.buffer.len(), 1);
        let preview = proposal.preview();
        assert_eq!(preview[0].title, "Laptop");
        assert_eq!(preview[0].url.as_deref(), Some("https://x/p1"));
    }
}
