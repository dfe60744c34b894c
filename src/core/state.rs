//! Shared agent state and the shallow merge both writers go through
//!
//! The UI and the remote agent both write the same object. Every write is a
//! [`StatePatch`]: keys present in the patch replace the current value, keys
//! absent are left alone. The last write to a key wins; there is no
//! field-level conflict resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::catalog::{self, Product};

/// Report produced by the agent; its layout belongs to the agent
pub type Report = Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentState {
    #[serde(deserialize_with = "catalog::product_list")]
    pub products: Vec<Product>,
    pub favorites: BTreeSet<String>,
    #[serde(deserialize_with = "catalog::product_list")]
    pub wishlist: Vec<Product>,
    #[serde(
        alias = "buffer_products",
        alias = "bufferedProducts",
        deserialize_with = "catalog::product_list"
    )]
    pub buffered_products: Vec<Product>,
    pub logs: Vec<LogEntry>,
    pub report: Option<Report>,
    #[serde(alias = "show_results", alias = "resultsVisible")]
    pub results_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_logs: Option<CanvasLogs>,
}

/// Progress line emitted by an agent tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub status: LogStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    #[default]
    Processing,
    Completed,
}

/// Headline shown on the canvas while the agent works
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasLogs {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

/// Partial state; `None` means "leave this key alone"
///
/// `report` is doubly optional so a patch can clear it: `Some(None)` sets the
/// report to null, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(
        default,
        deserialize_with = "catalog::product_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<BTreeSet<String>>,
    #[serde(
        default,
        deserialize_with = "catalog::product_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub wishlist: Option<Vec<Product>>,
    #[serde(
        default,
        alias = "buffer_products",
        alias = "bufferedProducts",
        deserialize_with = "catalog::product_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub buffered_products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub report: Option<Option<Report>>,
    #[serde(
        default,
        alias = "show_results",
        alias = "resultsVisible",
        skip_serializing_if = "Option::is_none"
    )]
    pub results_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_logs: Option<CanvasLogs>,
}

// A key that is present (even as null) deserializes to Some.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Report>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(match value {
        Value::Null => None,
        other => Some(other),
    }))
}

impl AgentState {
    /// Empty canvas with the durable wishlist loaded
    pub fn seeded(wishlist: Vec<Product>) -> Self {
        let mut state = Self::default();
        state.load_wishlist(wishlist);
        state
    }

    /// Replace the wishlist and re-derive favorites from it
    ///
    /// Repeated snapshots of one id collapse to the first.
    pub fn load_wishlist(&mut self, wishlist: Vec<Product>) {
        let mut favorites = BTreeSet::new();
        self.wishlist = wishlist
            .into_iter()
            .filter(|p| favorites.insert(p.id.clone()))
            .collect();
        self.favorites = favorites;
    }

    /// Rebuild the wishlist for a favorites set sent without one
    ///
    /// Retained ids keep their snapshot, new ids are snapshotted from the
    /// canvas, and ids with no product to snapshot are dropped.
    fn follow_favorites(&mut self, favorites: BTreeSet<String>) {
        let mut wishlist: Vec<Product> = self
            .wishlist
            .iter()
            .filter(|p| favorites.contains(&p.id))
            .cloned()
            .collect();

        for id in &favorites {
            if wishlist.iter().any(|p| &p.id == id) {
                continue;
            }
            match self.product(id) {
                Some(product) => wishlist.push(product.clone()),
                None => tracing::warn!("Dropping favorite {} with no product to save", id),
            }
        }

        self.load_wishlist(wishlist);
    }

    /// Shallow merge by top-level key
    pub fn merge(&mut self, patch: StatePatch) {
        let StatePatch {
            products,
            favorites,
            wishlist,
            buffered_products,
            logs,
            report,
            results_visible,
            canvas_logs,
        } = patch;

        if let Some(products) = products {
            self.products = products;
        }
        match (favorites, wishlist) {
            (_, Some(wishlist)) => self.load_wishlist(wishlist),
            (Some(favorites), None) => self.follow_favorites(favorites),
            (None, None) => {}
        }
        if let Some(buffered) = buffered_products {
            self.buffered_products = buffered;
        }
        if let Some(logs) = logs {
            self.logs = logs;
        }
        if let Some(report) = report {
            self.report = report;
        }
        if let Some(visible) = results_visible {
            self.results_visible = visible;
        }
        if let Some(canvas_logs) = canvas_logs {
            self.canvas_logs = Some(canvas_logs);
        }
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    /// Holds when every favorite id has exactly one wishlist snapshot and vice versa
    pub fn wishlist_consistent(&self) -> bool {
        let saved: BTreeSet<&str> = self.wishlist.iter().map(|p| p.id.as_str()).collect();
        saved.len() == self.wishlist.len()
            && saved.len() == self.favorites.len()
            && self.favorites.iter().all(|id| saved.contains(id.as_str()))
    }
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Parse a snapshot or delta pushed by the agent
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
