// Configuration loading and parsing (config/edge.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use fpl_edge_core::valuation::ValuationWeights;

const CONFIG_FILE: &str = "edge.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// edge.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub ingest: IngestConfig,
    pub valuation: ValuationConfig,
    pub captain: CaptainConfig,
    pub simulation: SimulationSection,
    pub insights: InsightsConfig,
    pub squad: SquadConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub history_timeout_ms: u64,
    pub max_players: usize,
    pub min_total_minutes: u32,
    pub fdr_fixtures: usize,
}

impl IngestConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn history_timeout(&self) -> Duration {
        Duration::from_millis(self.history_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    pub w_form: f64,
    pub w_xgi: f64,
}

impl ValuationConfig {
    pub fn weights(&self) -> ValuationWeights {
        ValuationWeights {
            w_form: self.w_form,
            w_xgi: self.w_xgi,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptainConfig {
    pub limit: usize,
    pub min_minutes_risk: f64,
    #[serde(default)]
    pub include_goalkeepers: bool,
    pub shortlist: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSection {
    pub trials: usize,
    /// Top captain picks passed on to the simulator.
    pub candidates: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    pub heatmap_horizon: u32,
    pub vorp_horizon: u32,
    pub vorp_limit: usize,
    pub differentials_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquadConfig {
    #[serde(default)]
    pub player_ids: Vec<u32>,
    pub chip_horizon: u32,
    pub stacks_limit: usize,
    pub template_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub metrics_path: String,
    pub captain_path: String,
    pub insights_path: String,
    pub squad_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/edge.toml` relative to
/// `base_dir`. Does not copy defaults; prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Seed `config/edge.toml` from `defaults/edge.toml` when it is missing.
/// Returns whether a copy was made; an existing file is never touched.
pub fn ensure_config_files(base_dir: &Path) -> Result<bool, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(false);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} exists; run from the crate root",
                target.display(),
                source.display()
            ),
        });
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;
    Ok(true)
}

/// Load config relative to the current working directory, seeding
/// `config/` from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let upstream = &config.upstream;
    if upstream.base_url.trim().is_empty() {
        return Err(invalid("upstream.base_url", "must not be empty"));
    }
    if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://") {
        return Err(invalid(
            "upstream.base_url",
            format!("must be an http(s) URL, got {}", upstream.base_url),
        ));
    }
    if upstream.request_timeout_ms == 0 {
        return Err(invalid("upstream.request_timeout_ms", "must be > 0"));
    }

    let ingest = &config.ingest;
    let ingest_fields: &[(&str, u64)] = &[
        ("ingest.batch_size", ingest.batch_size as u64),
        ("ingest.history_timeout_ms", ingest.history_timeout_ms),
        ("ingest.max_players", ingest.max_players as u64),
        ("ingest.fdr_fixtures", ingest.fdr_fixtures as u64),
    ];
    for (name, val) in ingest_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let weight_fields: &[(&str, f64)] = &[
        ("valuation.w_form", config.valuation.w_form),
        ("valuation.w_xgi", config.valuation.w_xgi),
        ("captain.min_minutes_risk", config.captain.min_minutes_risk),
    ];
    for (name, val) in weight_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }

    if config.captain.limit == 0 {
        return Err(invalid("captain.limit", "must be > 0"));
    }
    if config.simulation.trials == 0 {
        return Err(invalid("simulation.trials", "must be > 0"));
    }
    if !(1..=10).contains(&config.insights.heatmap_horizon) {
        return Err(invalid(
            "insights.heatmap_horizon",
            format!("must be between 1 and 10, got {}", config.insights.heatmap_horizon),
        ));
    }

    if !(1..=6).contains(&config.squad.chip_horizon) {
        return Err(invalid(
            "squad.chip_horizon",
            format!("must be between 1 and 6, got {}", config.squad.chip_horizon),
        ));
    }

    for (name, val) in [
        ("output.metrics_path", &config.output.metrics_path),
        ("output.captain_path", &config.output.captain_path),
        ("output.insights_path", &config.output.insights_path),
        ("output.squad_path", &config.output.squad_path),
    ] {
        if val.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Path to the app crate root (works from the crate or the workspace).
    fn crate_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/fpl-edge-app/defaults").exists() {
            cwd.join("crates/fpl-edge-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with config/edge.toml holding `text`.
    fn temp_config(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    fn defaults_text() -> String {
        fs::read_to_string(crate_root().join("defaults").join(CONFIG_FILE)).unwrap()
    }

    #[test]
    fn load_defaults() {
        let tmp = temp_config("edge_config_defaults", &defaults_text());
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.upstream.base_url, "https://fantasy.premierleague.com/api");
        assert_eq!(config.ingest.batch_size, 10);
        assert_eq!(config.ingest.batch_pause(), Duration::from_millis(300));
        assert_eq!(config.ingest.history_timeout(), Duration::from_millis(5000));
        assert_eq!(config.ingest.max_players, 350);
        assert!((config.valuation.w_form - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.captain.limit, 3);
        assert!(!config.captain.include_goalkeepers);
        assert_eq!(config.simulation.trials, 10_000);
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.insights.heatmap_horizon, 6);
        assert!(config.squad.player_ids.is_empty());
        assert_eq!(config.squad.chip_horizon, 3);
        assert_eq!(config.output.metrics_path, "data/metrics.json");
        assert_eq!(config.output.squad_path, "data/squad.json");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_once() {
        let tmp = std::env::temp_dir().join("edge_config_seed");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), defaults_text()).unwrap();

        assert!(ensure_config_files(&tmp).unwrap());
        assert!(tmp.join("config").join(CONFIG_FILE).exists());
        assert!(!ensure_config_files(&tmp).unwrap());
        assert!(load_config_from(&tmp).is_ok());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn existing_config_is_kept_and_missing_defaults_fail() {
        let tmp = temp_config("edge_config_keep", "# edited by hand");
        assert!(!ensure_config_files(&tmp).unwrap());
        assert_eq!(
            fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap(),
            "# edited by hand"
        );
        let _ = fs::remove_dir_all(&tmp);

        let empty = std::env::temp_dir().join("edge_config_no_defaults");
        let _ = fs::remove_dir_all(&empty);
        fs::create_dir_all(&empty).unwrap();
        assert!(matches!(
            ensure_config_files(&empty),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        let _ = fs::remove_dir_all(&empty);
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = std::env::temp_dir().join("edge_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::FileNotFound { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let text = defaults_text().replace("batch_size = 10", "batch_size = 0");
        let tmp = temp_config("edge_config_batch_zero", &text);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "ingest.batch_size"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_weight_out_of_range() {
        let text = defaults_text().replace("w_xgi = 0.4", "w_xgi = 1.4");
        let tmp = temp_config("edge_config_weight", &text);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "valuation.w_xgi"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let text = defaults_text().replace(
            "https://fantasy.premierleague.com/api",
            "ftp://example.org",
        );
        let tmp = temp_config("edge_config_url", &text);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "upstream.base_url"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_long_heatmap_horizon() {
        let text = defaults_text().replace("heatmap_horizon = 6", "heatmap_horizon = 12");
        let tmp = temp_config("edge_config_heatmap", &text);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "insights.heatmap_horizon")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn squad_ids_parse_and_horizon_is_checked() {
        let text = defaults_text().replace("player_ids = []", "player_ids = [12, 301, 7]");
        let tmp = temp_config("edge_config_squad_ids", &text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.squad.player_ids, vec![12, 301, 7]);
        let _ = fs::remove_dir_all(&tmp);

        let text = defaults_text().replace("chip_horizon = 3", "chip_horizon = 8");
        let tmp = temp_config("edge_config_chip_horizon", &text);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "squad.chip_horizon"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_names_the_file() {
        let tmp = temp_config("edge_config_parse", "[upstream\nbase_url = ");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn seed_is_optional() {
        let text = defaults_text().replace("# seed = 42", "seed = 42");
        let tmp = temp_config("edge_config_seed_value", &text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.simulation.seed, Some(42));
        let _ = fs::remove_dir_all(&tmp);
    }
}
