use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::graph::{RoutingConfig, SearchMode};
use crate::handler::FfmpegConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest total input size a conversion request may read, in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_input_bytes: default_max_input_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_max_input_bytes() -> u64 {
    256 * 1024 * 1024
}

/// Sanitized config for API responses (local paths hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub routing: SanitizedRoutingConfig,
    pub ffmpeg: SanitizedFfmpegConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRoutingConfig {
    pub default_mode: SearchMode,
    pub max_route_attempts: Option<usize>,
    pub forbidden_chains: Vec<Vec<String>>,
    pub category_hard_search: bool,
    pub category_change_costs: usize,
}

/// Sanitized FFmpeg config (binary and scratch paths hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFfmpegConfig {
    pub enabled: bool,
    pub custom_binary: bool,
    pub timeout_secs: u64,
    pub prioritized_formats: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            routing: SanitizedRoutingConfig {
                default_mode: config.routing.default_mode,
                max_route_attempts: config.routing.max_route_attempts,
                forbidden_chains: config.routing.forbidden_chains.clone(),
                category_hard_search: config.routing.costs.category_hard_search,
                category_change_costs: config.routing.costs.category_change_costs.len(),
            },
            ffmpeg: SanitizedFfmpegConfig {
                enabled: config.ffmpeg.enabled,
                custom_binary: config.ffmpeg.ffmpeg_path != FfmpegConfig::default().ffmpeg_path,
                timeout_secs: config.ffmpeg.timeout_secs,
                prioritized_formats: config.ffmpeg.prioritized_formats.clone(),
            },
        }
    }
}
