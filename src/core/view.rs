//! Presentation selector for the main pane

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Products,
    Wishlist,
    Report,
}

/// Transitions only happen on user navigation or conversation changes
#[derive(Debug, Clone, Default)]
pub struct ViewRouter {
    current: View,
}

impl ViewRouter {
    pub fn current(&self) -> View {
        self.current
    }

    pub fn go_to_wishlist(&mut self) {
        self.current = View::Wishlist;
    }

    pub fn go_to_report(&mut self) {
        self.current = View::Report;
    }

    pub fn exit_to_products(&mut self) {
        self.current = View::Products;
    }

    /// Conversation created or switched
    pub fn reset(&mut self) {
        self.current = View::Products;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation() {
        let mut router = ViewRouter::default();
        assert_eq!(router.current(), View::Products);

        router.go_to_wishlist();
        assert_eq!(router.current(), View::Wishlist);

        router.go_to_report();
        assert_eq!(router.current(), View::Report);

        router.exit_to_products();
        assert_eq!(router.current(), View::Products);
    }

    #[test]
    fn test_reset_from_any_view() {
        let mut router = ViewRouter::default();
        router.go_to_report();
        router.reset();
        assert_eq!(router.current(), View::Products);
    }
}
