//! Configuration loading for Emergence.
//! Reads emergence.toml from the path given on the command line, the path in
//! the EMERGENCE_CONFIG env var, or the current directory.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::{Indicator, StatusColumn};
use crate::error::{EmergenceError, Result};

pub const CONFIG_ENV_VAR: &str = "EMERGENCE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "emergence.toml";
pub const INDICATOR_PLACEHOLDER: &str = "{indicator}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

// ── Inputs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory holding one GAM output table per indicator
    #[serde(default = "default_gam_dir")]
    pub gam_dir: PathBuf,
    /// Directory holding one decision-rule output table per indicator
    #[serde(default = "default_decision_rules_dir")]
    pub decision_rules_dir: PathBuf,
    #[serde(default = "default_gam_template")]
    pub gam_file_template: String,
    #[serde(default = "default_decision_rules_template")]
    pub decision_rules_file_template: String,
    /// Taxonomic lookup (taxonKey, canonicalName, kingdom, class)
    #[serde(default = "default_taxonomy")]
    pub taxonomy: PathBuf,
}

fn default_gam_dir()                 -> PathBuf { PathBuf::from("data/interim/gam") }
fn default_decision_rules_dir()      -> PathBuf { PathBuf::from("data/interim/decision_rules") }
fn default_gam_template()            -> String  { "em_status_gam_{indicator}.tsv".to_string() }
fn default_decision_rules_template() -> String  { "em_status_decision_rules_{indicator}.tsv".to_string() }
fn default_taxonomy()                -> PathBuf { PathBuf::from("data/interim/taxonomy.tsv") }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            gam_dir: default_gam_dir(),
            decision_rules_dir: default_decision_rules_dir(),
            gam_file_template: default_gam_template(),
            decision_rules_file_template: default_decision_rules_template(),
            taxonomy: default_taxonomy(),
        }
    }
}

impl InputConfig {
    pub fn gam_path(&self, indicator: Indicator) -> PathBuf {
        self.gam_dir.join(render_template(&self.gam_file_template, indicator))
    }

    pub fn decision_rules_path(&self, indicator: Indicator) -> PathBuf {
        self.decision_rules_dir
            .join(render_template(&self.decision_rules_file_template, indicator))
    }
}

fn render_template(template: &str, indicator: Indicator) -> String {
    template.replace(INDICATOR_PLACEHOLDER, indicator.as_str())
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Number of taxa listed per strategy in the run summary
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "bool_true")]
    pub write_summary: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("data/output") }
fn default_top_n()      -> usize   { 20 }
fn bool_true()          -> bool    { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            top_n: default_top_n(),
            write_summary: true,
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────────────────────

/// How the point ranker treats a missing status term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingScorePolicy {
    /// Any missing term makes the total missing; such taxa rank last.
    #[default]
    Propagate,
    /// Missing terms contribute nothing to the total.
    Zero,
}

impl fmt::Display for MissingScorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingScorePolicy::Propagate => f.write_str("propagate"),
            MissingScorePolicy::Zero => f.write_str("zero"),
        }
    }
}

impl FromStr for MissingScorePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "propagate" => Ok(MissingScorePolicy::Propagate),
            "zero" => Ok(MissingScorePolicy::Zero),
            other => Err(format!("unknown missing-score policy `{other}` (expected propagate or zero)")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub missing_policy: MissingScorePolicy,
    /// Per-column gain factor overrides, keyed by status column name
    #[serde(default)]
    pub gain_factors: BTreeMap<String, f64>,
}

// ── Loading ───────────────────────────────────────────────────────────────────


impl RankingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RankingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EmergenceError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        debug!("Loading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the configuration: explicit path, then EMERGENCE_CONFIG,
    /// then ./emergence.toml, falling back to defaults when none exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::resolve_from(explicit, from_env.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Lookup order behind [`RankingConfig::resolve`] with the environment
    /// value and default location passed in. Only the default file may be
    /// absent.
    pub fn resolve_from(
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        default_path: &Path,
    ) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = from_env {
            debug!("Using {} = {:?}", CONFIG_ENV_VAR, path);
            return Self::load(path);
        }
        if default_path.exists() {
            return Self::load(default_path);
        }
        info!("No {:?} found, using default configuration", default_path);
        Ok(Self::default())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, template) in [
            ("inputs.gam_file_template", &self.inputs.gam_file_template),
            ("inputs.decision_rules_file_template", &self.inputs.decision_rules_file_template),
        ] {
            if !template.contains(INDICATOR_PLACEHOLDER) {
                return Err(EmergenceError::Config(format!(
                    "{field} must contain {INDICATOR_PLACEHOLDER}, got `{template}`"
                )));
            }
        }

        for (name, factor) in &self.scoring.gain_factors {
            name.parse::<StatusColumn>()
                .map_err(|e| EmergenceError::Config(format!("scoring.gain_factors: {e}")))?;
            if !factor.is_finite() || *factor < 0.0 {
                return Err(EmergenceError::Config(format!(
                    "scoring.gain_factors.{name} must be a non-negative number, got {factor}"
                )));
            }
        }

        Ok(())
    }
}
