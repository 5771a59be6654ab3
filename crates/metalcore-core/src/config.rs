//! Configuration management for the network dashboard.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`METALCORE_` prefix, `__` between sections)
//! 2. Config file (`metalcore.toml` by default)
//! 3. Defaults

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub network: NetworkConfig,
}

/// Backend connection settings for the graph query.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the scoring API (default: "http://localhost:8000").
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Tunables for the network view.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Traversal depth used before the user picks one (1..=3).
    pub default_depth: u8,
    /// Top-N cap applied to the uncentered overview.
    pub default_top_n: u32,
    /// Quiet period before a search keystroke triggers a recentre.
    pub search_debounce_ms: u64,
    /// Composite score divisor for artist node weight.
    pub score_scale: f64,
    /// Weight of an artist without a score.
    pub default_artist_weight: f64,
    /// Weight of every non-artist node.
    pub auxiliary_weight: f64,
    /// Zoom level above which link labels may be drawn.
    pub label_zoom_threshold: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_depth: 2,
            default_top_n: 50,
            search_debounce_ms: 300,
            score_scale: 20.0,
            default_artist_weight: 2.0,
            auxiliary_weight: 1.5,
            label_zoom_threshold: 1.5,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from `<file_prefix>.{toml,yaml,json}` (optional) and
    /// `METALCORE_` environment variables, then validate it.
    pub fn load(file_prefix: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("METALCORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: DashboardConfig = cfg.try_deserialize()?;
        loaded.validate()?;
        tracing::debug!(base_url = %loaded.api.base_url, "Dashboard configuration loaded");
        Ok(loaded)
    }

    /// Reject values the view engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let net = &self.network;
        if !(1..=3).contains(&net.default_depth) {
            return Err(ConfigError::Invalid(format!(
                "network.default_depth must be within 1..=3, got {}",
                net.default_depth
            )));
        }
        if net.score_scale <= 0.0 || !net.score_scale.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "network.score_scale must be positive, got {}",
                net.score_scale
            )));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".to_string()));
        }
        Ok(())
    }
}
