//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MBOXCOMPACT_CONFIG` (environment variable)
//! 2. `~/.config/mboxcompact/config.toml` (Linux/macOS)
//!    `%APPDATA%\mboxcompact\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::budget::TokenBudget;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Thread summary defaults.
    pub summary: SummaryConfig,
    /// Diff rendering defaults.
    pub diff: DiffConfig,
    /// Token budget defaults.
    pub budget: BudgetConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Thread summary defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Messages kept per summary after deduplication.
    pub max_messages: usize,
    /// Remove quoted replies and signatures from bodies.
    pub strip_quoted: bool,
    /// Body length (bytes) before truncation.
    pub short_body_bytes: usize,
}

/// Diff rendering defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Files rendered per patch, largest change first.
    pub max_files: usize,
    pub max_hunks_per_file: usize,
    pub max_hunk_lines: usize,
    /// Attach rendered diffs to patch entries.
    pub include_diffs: bool,
    /// Only report statistics.
    pub stat_only: bool,
}

/// Token budget defaults. No budget is applied unless `token_budget` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub token_budget: Option<usize>,
    /// Fraction the budget may be exceeded by (default: 0.10).
    pub overflow_allowance: f64,
    pub base_per_item: usize,
    pub base_per_patch: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_messages: 50,
            strip_quoted: true,
            short_body_bytes: 1500,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_files: 8,
            max_hunks_per_file: 6,
            max_hunk_lines: 40,
            include_diffs: true,
            stat_only: false,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            token_budget: None,
            overflow_allowance: TokenBudget::DEFAULT_OVERFLOW_ALLOWANCE,
            base_per_item: TokenBudget::DEFAULT_BASE_PER_ITEM,
            base_per_patch: TokenBudget::DEFAULT_BASE_PER_PATCH,
        }
    }
}

impl BudgetConfig {
    /// The configured budget with `token_budget` replaced by `budget`.
    pub fn token_budget_for(&self, budget: usize) -> TokenBudget {
        TokenBudget {
            budget,
            overflow_allowance: self.overflow_allowance,
            base_per_item: self.base_per_item,
            base_per_patch: self.base_per_patch,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MBOXCOMPACT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mboxcompact").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mboxcompact")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mboxcompact.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.summary.max_messages, 50);
        assert!(cfg.summary.strip_quoted);
        assert_eq!(cfg.diff.max_hunk_lines, 40);
        assert_eq!(cfg.budget.token_budget, None);
        assert_eq!(cfg.budget.base_per_patch, 40);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.budget.token_budget = Some(4000);
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[summary]
max_messages = 10

[budget]
token_budget = 2000
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.summary.max_messages, 10);
        assert_eq!(cfg.budget.token_budget, Some(2000));
        // Other fields use defaults
        assert!(cfg.summary.strip_quoted);
        assert_eq!(cfg.diff.max_files, 8);
        assert_eq!(cfg.budget.overflow_allowance, 0.10);
    }

    #[test]
    fn test_token_budget_for_carries_costs() {
        let budget = BudgetConfig {
            base_per_item: 10,
            ..Default::default()
        };
        let tb = budget.token_budget_for(500);
        assert_eq!(tb.budget, 500);
        assert_eq!(tb.base_per_item, 10);
        assert_eq!(tb.hard_limit(), 550);
    }

    #[test]
    fn test_cache_dir_override() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/compact-cache"));
        assert_eq!(
            log_file_path(&cfg),
            PathBuf::from("/tmp/compact-cache/mboxcompact.log")
        );
    }
}
