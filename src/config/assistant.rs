//! Assistant configuration loaded from TOML files
//!
//! Everything here is optional; a missing file or section falls back to the
//! defaults the shopping canvas ships with.

use serde::Deserialize;
use std::path::Path;

use crate::core::{ProposalLimits, View};

/// Root assistant configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub assistant: AssistantInfo,

    /// How many products each proposal choice adopts
    #[serde(default)]
    pub proposal: ProposalLimits,

    /// Chat suggestions per view
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

impl AssistantConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AssistantConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.proposal.accept == 0 || self.proposal.more == 0 {
            return Err(ConfigError::Validation(
                "proposal limits must be at least 1".into(),
            ));
        }
        if self.assistant.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Remote agent settings
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantInfo {
    /// Overrides `SHOPPING_AGENT_NAME` when set
    #[serde(default)]
    pub agent_name: Option<String>,

    /// Timeout for one agent run, in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    300
}

impl Default for AssistantInfo {
    fn default() -> Self {
        Self {
            agent_name: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsConfig {
    #[serde(default = "default_products")]
    pub products: Vec<String>,

    #[serde(default = "default_wishlist")]
    pub wishlist: Vec<String>,

    #[serde(default = "default_report")]
    pub report: Vec<String>,
}

impl SuggestionsConfig {
    pub fn for_view(&self, view: View) -> &[String] {
        match view {
            View::Products => &self.products,
            View::Wishlist => &self.wishlist,
            View::Report => &self.report,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_products() -> Vec<String> {
    strings(&[
        "Find laptops under $1500",
        "Compare gaming headphones",
        "Show wireless earbuds with ANC",
        "Best smartphones for photography",
        "Budget 4K monitors under $400",
    ])
}

fn default_wishlist() -> Vec<String> {
    strings(&[
        "Compare my saved products",
        "Which is the best value?",
        "Find deals on these items",
    ])
}

fn default_report() -> Vec<String> {
    strings(&[
        "Which one should I buy?",
        "Compare battery life",
        "What about performance?",
    ])
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            products: default_products(),
            wishlist: default_wishlist(),
            report: default_report(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[assistant]
agent_name = "deal_hunter"
request_timeout_secs = 60

[proposal]
accept = 3
more = 6

[suggestions]
products = ["Find a quiet mechanical keyboard"]
"#;

    #[test]
    fn test_parse_config() {
        let config = AssistantConfig::from_toml(SAMPLE_CONFIG).unwrap();

        assert_eq!(config.assistant.agent_name.as_deref(), Some("deal_hunter"));
        assert_eq!(config.assistant.request_timeout_secs, 60);
        assert_eq!(config.proposal, ProposalLimits { accept: 3, more: 6 });
        assert_eq!(
            config.suggestions.for_view(View::Products),
            ["Find a quiet mechanical keyboard".to_string()]
        );
        // Unset lists keep their defaults
        assert_eq!(config.suggestions.wishlist.len(), 3);
    }

    #[test]
    fn test_empty_config() {
        let config = AssistantConfig::from_toml("").unwrap();
        assert_eq!(config.proposal, ProposalLimits::default());
        assert_eq!(config.assistant.request_timeout_secs, 300);
        assert_eq!(config.suggestions.products[0], "Find laptops under $1500");
    }

    #[test]
    fn test_partial_proposal_section() {
        let config = AssistantConfig::from_toml("[proposal]\nmore = 20\n").unwrap();
        assert_eq!(config.proposal, ProposalLimits { accept: 5, more: 20 });
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = AssistantConfig::from_toml("[proposal]\naccept = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_bad_toml() {
        let err = AssistantConfig::from_toml("[proposal\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
