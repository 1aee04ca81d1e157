//! Routing configuration.

use serde::{Deserialize, Serialize};

use super::cost::CostModel;
use super::types::SearchMode;

/// Configuration for graph building, route search and route execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Edge cost constants.
    #[serde(default)]
    pub costs: CostModel,

    /// Category sequences no yielded route may contain as consecutive steps.
    #[serde(default = "default_forbidden_chains")]
    pub forbidden_chains: Vec<Vec<String>>,

    /// Search mode used when a request doesn't name one.
    #[serde(default)]
    pub default_mode: SearchMode,

    /// Maximum number of routes a conversion tries. Unlimited when unset.
    #[serde(default)]
    pub max_route_attempts: Option<usize>,

    /// Log search progress every this many iterations.
    #[serde(default = "default_progress_interval")]
    pub progress_log_interval: u64,
}

fn default_forbidden_chains() -> Vec<Vec<String>> {
    // image -> video -> audio keeps nothing of the original media
    vec![vec![
        "image".to_string(),
        "video".to_string(),
        "audio".to_string(),
    ]]
}

fn default_progress_interval() -> u64 {
    100
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            costs: CostModel::default(),
            forbidden_chains: default_forbidden_chains(),
            default_mode: SearchMode::default(),
            max_route_attempts: None,
            progress_log_interval: default_progress_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoutingConfig::default();
        assert_eq!(config.forbidden_chains, vec![vec!["image", "video", "audio"]]);
        assert_eq!(config.default_mode, SearchMode::Simple);
        assert!(config.max_route_attempts.is_none());
        assert_eq!(config.progress_log_interval, 100);
    }

    #[test]
    fn test_nested_costs_from_toml() {
        let toml = r#"
            default_mode = "advanced"
            max_route_attempts = 5

            [costs]
            priority_cost = 0.1
        "#;
        let config: RoutingConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_mode, SearchMode::Advanced);
        assert_eq!(config.max_route_attempts, Some(5));
        assert_eq!(config.costs.priority_cost, 0.1);
        assert_eq!(config.costs.depth_cost, 1.0);
        assert_eq!(config.forbidden_chains.len(), 1);
    }
}
