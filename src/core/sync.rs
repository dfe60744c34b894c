//! Shared state synchronizer
//!
//! Each edit is planned against the current state and returned as a
//! [`StatePatch`]; the caller applies it through the one merge path. `None`
//! means the edit changes nothing.

use serde::Deserialize;
use std::collections::BTreeSet;

use crate::catalog::Product;

use super::proposal::{ProductProposal, ProposalChoice};
use super::state::{AgentState, StatePatch};

/// How many products each proposal choice adopts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProposalLimits {
    #[serde(default = "default_accept")]
    pub accept: usize,
    #[serde(default = "default_more")]
    pub more: usize,
}

fn default_accept() -> usize {
    5
}

fn default_more() -> usize {
    10
}

impl Default for ProposalLimits {
    fn default() -> Self {
        Self {
            accept: default_accept(),
            more: default_more(),
        }
    }
}

fn wishlist_patch(favorites: BTreeSet<String>, wishlist: Vec<Product>) -> StatePatch {
    StatePatch {
        favorites: Some(favorites),
        wishlist: Some(wishlist),
        ..Default::default()
    }
}

/// Flip wishlist membership of a product on the canvas
pub fn toggle_wishlist(state: &AgentState, product_id: &str) -> Option<StatePatch> {
    if state.is_favorite(product_id) {
        return remove_from_wishlist(state, &[product_id.to_string()]);
    }
    move_to_wishlist(state, &[product_id.to_string()])
}

/// Add products to favorites, snapshotting each into the wishlist
///
/// Ids that match no known product are skipped so favorites never point at a
/// product the wishlist cannot show.
pub fn move_to_wishlist(state: &AgentState, ids: &[String]) -> Option<StatePatch> {
    let mut favorites = state.favorites.clone();
    let mut wishlist = state.wishlist.clone();

    for id in ids {
        if favorites.contains(id) {
            continue;
        }
        if wishlist.iter().any(|p| &p.id == id) {
            favorites.insert(id.clone());
            continue;
        }
        match state.product(id) {
            Some(product) => {
                favorites.insert(id.clone());
                wishlist.push(product.clone());
            }
            None => tracing::warn!("Cannot wishlist unknown product {}", id),
        }
    }

    if favorites == state.favorites {
        return None;
    }
    Some(wishlist_patch(favorites, wishlist))
}

pub fn remove_from_wishlist(state: &AgentState, ids: &[String]) -> Option<StatePatch> {
    if !ids.iter().any(|id| state.is_favorite(id)) {
        return None;
    }

    let favorites = state
        .favorites
        .iter()
        .filter(|id| !ids.contains(*id))
        .cloned()
        .collect();
    let wishlist = state
        .wishlist
        .iter()
        .filter(|p| !ids.contains(&p.id))
        .cloned()
        .collect();
    Some(wishlist_patch(favorites, wishlist))
}

pub fn clear_wishlist(state: &AgentState) -> Option<StatePatch> {
    if state.favorites.is_empty() && state.wishlist.is_empty() {
        return None;
    }
    Some(wishlist_patch(BTreeSet::new(), Vec::new()))
}

/// Drop products from the canvas, backfilling one slot from the buffer
///
/// The most recently buffered product (the last one) is promoted, once per
/// call, and only when something was actually removed.
pub fn remove_from_canvas(state: &AgentState, ids: &[String]) -> Option<StatePatch> {
    let mut products: Vec<Product> = state
        .products
        .iter()
        .filter(|p| !ids.contains(&p.id))
        .cloned()
        .collect();

    if products.len() == state.products.len() {
        return None;
    }

    let mut patch = StatePatch::default();
    let mut buffered = state.buffered_products.clone();
    if let Some(promoted) = buffered.pop() {
        products.push(promoted);
        patch.buffered_products = Some(buffered);
    }
    patch.products = Some(products);
    Some(patch)
}

/// State change for the user's answer to a product proposal
pub fn adopt_proposal(
    proposal: &ProductProposal,
    choice: ProposalChoice,
    limits: ProposalLimits,
) -> Option<StatePatch> {
    let (products, buffered): (Vec<Product>, Vec<Product>) = match choice {
        ProposalChoice::Reject => return None,
        ProposalChoice::Accept => (
            proposal.products.iter().take(limits.accept).cloned().collect(),
            proposal.buffer.iter().skip(limits.accept).cloned().collect(),
        ),
        ProposalChoice::RequestMore => (
            proposal.buffer.iter().take(limits.more).cloned().collect(),
            proposal.buffer.iter().skip(limits.more).cloned().collect(),
        ),
    };

    Some(StatePatch {
        results_visible: Some(!products.is_empty()),
        products: Some(products),
        buffered_products: Some(buffered),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn products(prefix: &str, count: usize) -> Vec<Product> {
        (1..=count)
            .map(|n| Product::new(format!("{prefix}{n}"), format!("{prefix} {n}")))
            .collect()
    }

    fn apply(state: &mut AgentState, patch: Option<StatePatch>) {
        if let Some(patch) = patch {
            state.merge(patch);
        }
    }

    #[test]
    fn test_toggle_keeps_favorites_and_wishlist_in_step() {
        let mut state = AgentState {
            products: products("P", 3),
            ..Default::default()
        };

        for id in ["P1", "P2", "P1", "P9", "P3", "P2", "P2"] {
            let patch = toggle_wishlist(&state, id);
            let patch = patch;
            apply(&mut state, patch);

            assert_eq!(
                state.is_favorite(id),
                state.wishlist.iter().any(|p| p.id == id),
                "after toggling {id}"
            );
            assert!(state.wishlist_consistent());
        }

        assert_eq!(catalog::ids(&state.wishlist), vec!["P3", "P2"]);
    }

    #[test]
    fn test_toggle_off_works_for_product_no_longer_on_canvas() {
        let mut state = AgentState::seeded(vec![Product::new("old", "From last week")]);
        let patch = toggle_wishlist(&state, "old");
        let patch = patch;
        apply(&mut state, patch);

        assert!(state.wishlist.is_empty());
        assert!(state.favorites.is_empty());
    }

    #[test]
    fn test_move_to_wishlist_is_union() {
        let mut state = AgentState {
            products: products("P", 3),
            ..Default::default()
        };
        let patch = move_to_wishlist(&state, &["P1".into()]);
        apply(&mut state, patch);
        let patch = move_to_wishlist(&state, &["P1".into(), "P2".into(), "nope".into()]);
        apply(&mut state, patch);

        assert_eq!(state.favorites.len(), 2);
        assert_eq!(catalog::ids(&state.wishlist), vec!["P1", "P2"]);
        assert!(move_to_wishlist(&state, &["P1".into()]).is_none());
    }

    #[test]
    fn test_move_skips_ids_already_snapshotted() {
        // Favorites lost P1 but the wishlist still holds its snapshot
        let mut state = AgentState {
            products: products("P", 2),
            wishlist: products("P", 1),
            ..Default::default()
        };

        let patch = toggle_wishlist(&state, "P1");
        apply(&mut state, patch);

        assert_eq!(catalog::ids(&state.wishlist), vec!["P1"]);
        assert!(state.is_favorite("P1"));
        assert!(state.wishlist_consistent());
    }

    #[test]
    fn test_toggle_after_favorites_only_snapshot() {
        let mut state = AgentState {
            products: products("P", 3),
            ..Default::default()
        };

        let patch = toggle_wishlist(&state, "P1");
        apply(&mut state, patch);
        state.merge(
            StatePatch::from_value(serde_json::json!({ "favorites": [], "buffer_products": [] }))
                .unwrap(),
        );
        assert!(state.wishlist.is_empty());

        let patch = toggle_wishlist(&state, "P1");
        apply(&mut state, patch);

        assert_eq!(catalog::ids(&state.wishlist), vec!["P1"]);
        assert!(state.wishlist_consistent());
    }

    #[test]
    fn test_remove_from_wishlist_is_difference() {
        let mut state = AgentState {
            products: products("P", 3),
            ..Default::default()
        };
        let patch = move_to_wishlist(&state, &["P1".into(), "P2".into(), "P3".into()]);
        apply(&mut state, patch);
        let patch = remove_from_wishlist(&state, &["P2".into(), "P7".into()]);
        apply(&mut state, patch);

        assert_eq!(catalog::ids(&state.wishlist), vec!["P1", "P3"]);
        assert!(state.wishlist_consistent());
        assert!(remove_from_wishlist(&state, &["P2".into()]).is_none());
    }

    #[test]
    fn test_clear_wishlist() {
        let mut state = AgentState::seeded(products("W", 2));
        let patch = clear_wishlist(&state);
        apply(&mut state, patch);
        assert!(state.wishlist.is_empty() && state.favorites.is_empty());
        assert!(clear_wishlist(&state).is_none());
    }

    #[test]
    fn test_remove_from_canvas_backfills_from_buffer() {
        let mut state = AgentState {
            products: products("P", 3),
            buffered_products: products("B", 1),
            ..Default::default()
        };

        let patch = remove_from_canvas(&state, &["P2".into()]);
        apply(&mut state, patch);

        assert_eq!(catalog::ids(&state.products), vec!["P1", "P3", "B1"]);
        assert!(state.buffered_products.is_empty());
    }

    #[test]
    fn test_remove_from_canvas_promotes_most_recent_once() {
        let mut state = AgentState {
            products: products("P", 3),
            buffered_products: products("B", 3),
            ..Default::default()
        };

        let patch = remove_from_canvas(&state, &["P1".into(), "P2".into()]);
        apply(&mut state, patch);

        assert_eq!(catalog::ids(&state.products), vec!["P3", "B3"]);
        assert_eq!(catalog::ids(&state.buffered_products), vec!["B1", "B2"]);
    }

    #[test]
    fn test_remove_from_canvas_shrinks_without_buffer() {
        let mut state = AgentState {
            products: products("P", 2),
            ..Default::default()
        };
        let patch = remove_from_canvas(&state, &["P1".into()]);
        apply(&mut state, patch);
        assert_eq!(catalog::ids(&state.products), vec!["P2"]);
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let state = AgentState {
            products: products("P", 3),
            buffered_products: products("B", 2),
            ..Default::default()
        };

        assert!(remove_from_canvas(&state, &["P9".into()]).is_none());
        assert!(remove_from_canvas(&state, &[]).is_none());
    }

    #[test]
    fn test_accept_adopts_first_five() {
        let mut state = AgentState {
            products: products("P", 8),
            buffered_products: products("B", 12),
            ..Default::default()
        };
        let proposal = ProductProposal {
            products: products("P", 5),
            buffer: products("B", 12),
        };

        let patch = adopt_proposal(&proposal, ProposalChoice::Accept, ProposalLimits::default());
        apply(&mut state, patch);

        assert_eq!(catalog::ids(&state.products), vec!["P1", "P2", "P3", "P4", "P5"]);
        assert_eq!(
            catalog::ids(&state.buffered_products),
            vec!["B6", "B7", "B8", "B9", "B10", "B11", "B12"]
        );
        assert!(state.results_visible);
    }

    #[test]
    fn test_request_more_adopts_ten_from_buffer() {
        let mut state = AgentState {
            products: products("P", 8),
            buffered_products: products("B", 12),
            ..Default::default()
        };
        let proposal = ProductProposal {
            products: products("P", 5),
            buffer: products("B", 12),
        };

        let patch = adopt_proposal(&proposal, ProposalChoice::RequestMore, ProposalLimits::default());
        apply(&mut state, patch);

        let expected: Vec<String> = (1..=10).map(|n| format!("B{n}")).collect();
        assert_eq!(catalog::ids(&state.products), expected);
        assert_eq!(catalog::ids(&state.buffered_products), vec!["B11", "B12"]);
    }

    #[test]
    fn test_reject_changes_nothing() {
        let proposal = ProductProposal {
            products: products("P", 5),
            buffer: products("B", 12),
        };
        assert!(adopt_proposal(&proposal, ProposalChoice::Reject, ProposalLimits::default()).is_none());
    }

    #[test]
    fn test_short_proposals() {
        let proposal = ProductProposal {
            products: products("P", 2),
            buffer: products("B", 3),
        };
        let patch =
            adopt_proposal(&proposal, ProposalChoice::Accept, ProposalLimits::default()).unwrap();
        assert_eq!(patch.products.as_ref().map(Vec::len), Some(2));
        assert_eq!(patch.buffered_products.as_ref().map(Vec::len), Some(0));
    }
}
