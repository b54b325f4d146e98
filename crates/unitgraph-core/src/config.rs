use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::debug;

/// Knobs for the graph analyses.
///
/// Every field has a default, so an empty or missing `config.toml` yields
/// [`AnalysisConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_hub_limit")]
    pub hub_limit: usize,
    #[serde(default = "default_bridge_limit")]
    pub bridge_limit: usize,
    #[serde(default = "default_bridge_sample_size")]
    pub bridge_sample_size: usize,
    /// Graphs with fewer nodes than this skip bridge sampling entirely.
    #[serde(default = "default_bridge_min_nodes")]
    pub bridge_min_nodes: usize,
    /// Upper bound on cycles enumerated before the search stops.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,
    /// Seed for bridge sampling. `None` samples from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_pagerank_damping")]
    pub pagerank_damping: f64,
    #[serde(default = "default_pagerank_tolerance")]
    pub pagerank_tolerance: f64,
    #[serde(default = "default_pagerank_max_iter")]
    pub pagerank_max_iter: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hub_limit: default_hub_limit(),
            bridge_limit: default_bridge_limit(),
            bridge_sample_size: default_bridge_sample_size(),
            bridge_min_nodes: default_bridge_min_nodes(),
            max_cycles: default_max_cycles(),
            seed: None,
            pagerank_damping: default_pagerank_damping(),
            pagerank_tolerance: default_pagerank_tolerance(),
            pagerank_max_iter: default_pagerank_max_iter(),
        }
    }
}

impl AnalysisConfig {
    /// Same config with a fixed sampling seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Load config from `path`. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AnalysisConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<AnalysisConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/unitgraph/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the user config exists but is malformed.
pub fn load_user_config() -> Result<AnalysisConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(AnalysisConfig::default());
    };

    load_config(&config_dir.join("unitgraph/config.toml"))
}

/// Resolve the effective config.
///
/// Precedence (highest wins):
/// 1. `UNITGRAPH_SEED` env var (seed only)
/// 2. `explicit` path, when given
/// 3. user config file
/// 4. defaults
///
/// # Errors
///
/// Returns an error if `explicit` does not exist, a config file is
/// malformed, or `UNITGRAPH_SEED` is not an unsigned integer.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match explicit {
        Some(path) => {
            anyhow::ensure!(path.exists(), "config file {} does not exist", path.display());
            load_config(path)?
        }
        None => load_user_config()?,
    };

    apply_env_seed(config, env::var("UNITGRAPH_SEED").ok().as_deref())
}

fn apply_env_seed(mut config: AnalysisConfig, env_seed: Option<&str>) -> Result<AnalysisConfig> {
    if let Some(raw) = env_seed {
        let seed = raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("UNITGRAPH_SEED must be an unsigned integer, got {raw:?}"))?;
        config.seed = Some(seed);
    }
    Ok(config)
}

const fn default_hub_limit() -> usize {
    20
}

const fn default_bridge_limit() -> usize {
    20
}

const fn default_bridge_sample_size() -> usize {
    1000
}

const fn default_bridge_min_nodes() -> usize {
    3
}

const fn default_max_cycles() -> usize {
    10_000
}

const fn default_pagerank_damping() -> f64 {
    0.85
}

const fn default_pagerank_tolerance() -> f64 {
    1e-6
}

const fn default_pagerank_max_iter() -> usize {
    100
}
