//! Global configuration types for FlexFlow.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! REST server binding and routing policy.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.flexflow/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,
}

/// REST server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Routing engine policy knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub dead_end_policy: DeadEndPolicy,
}

/// What to do when a decision lands on a node with no outgoing edges that
/// is not flagged terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadEndPolicy {
    /// Treat the node exactly like a terminal node.
    #[default]
    Collapse,
    /// Refuse the decision with `RoutingError::DeadEndNode`.
    Reject,
}
