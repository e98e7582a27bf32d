//! Detection policy: the tunable thresholds behind recurring detection
//!
//! ## Configuration Resolution
//!
//! Policy is loaded with a layered resolution:
//! 1. An explicit path (CLI `--policy`)
//! 2. Override in data dir (~/.local/share/recur/config/detection.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::FrequencyLabel;

/// Embedded default policy (compiled into binary)
const DEFAULT_POLICY: &str = include_str!("../../../config/detection.toml");

/// Relative amount difference allowed between a member and its cluster
pub const AMOUNT_TOLERANCE: f64 = 0.10;

/// Maximum interval std dev as a share of the mean interval
pub const INTERVAL_CONSISTENCY_RATIO: f64 = 0.25;

/// Fewest dated transactions that can form a pattern
pub const MIN_SAMPLES: usize = 2;

/// Confidence added per reached sample tier
pub const SAMPLE_BONUS: f64 = 0.1;

/// Sample counts at which `SAMPLE_BONUS` is added
pub const SAMPLE_BONUS_TIERS: [usize; 2] = [4, 6];

/// Confidence for intervals that match no named cadence
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Default upcoming window
pub const UPCOMING_HORIZON_DAYS: u32 = 30;

/// How transactions are assigned to amount clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// Single forward pass, compare against each cluster's first member
    #[default]
    FirstFit,
    /// Compare against the running mean of each cluster
    Centroid,
}

impl ClusterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstFit => "first_fit",
            Self::Centroid => "centroid",
        }
    }
}

impl std::str::FromStr for ClusterStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first_fit" | "first-fit" => Ok(Self::FirstFit),
            "centroid" => Ok(Self::Centroid),
            _ => Err(format!("Unknown cluster strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ClusterStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An inclusive day range mapped to a cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceBand {
    pub label: FrequencyLabel,
    pub min_days: f64,
    pub max_days: f64,
    /// Base confidence before sample bonuses
    pub confidence: f64,
}

impl CadenceBand {
    fn new(label: FrequencyLabel, min_days: f64, max_days: f64, confidence: f64) -> Self {
        Self {
            label,
            min_days,
            max_days,
            confidence,
        }
    }

    pub fn contains(&self, days: f64) -> bool {
        days >= self.min_days && days <= self.max_days
    }
}

/// Thresholds for the detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPolicy {
    pub amount_tolerance: f64,
    pub interval_consistency_ratio: f64,
    pub min_samples: usize,
    pub sample_bonus: f64,
    pub sample_bonus_tiers: Vec<usize>,
    pub fallback_confidence: f64,
    pub cluster_strategy: ClusterStrategy,
    pub upcoming_horizon_days: u32,
    /// Checked in order; the first band containing the interval wins
    pub bands: Vec<CadenceBand>,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            amount_tolerance: AMOUNT_TOLERANCE,
            interval_consistency_ratio: INTERVAL_CONSISTENCY_RATIO,
            min_samples: MIN_SAMPLES,
            sample_bonus: SAMPLE_BONUS,
            sample_bonus_tiers: SAMPLE_BONUS_TIERS.to_vec(),
            fallback_confidence: FALLBACK_CONFIDENCE,
            cluster_strategy: ClusterStrategy::FirstFit,
            upcoming_horizon_days: UPCOMING_HORIZON_DAYS,
            bands: vec![
                CadenceBand::new(FrequencyLabel::Weekly, 6.0, 8.0, 0.8),
                CadenceBand::new(FrequencyLabel::BiWeekly, 13.0, 16.0, 0.7),
                CadenceBand::new(FrequencyLabel::Monthly, 25.0, 35.0, 0.8),
                CadenceBand::new(FrequencyLabel::Quarterly, 85.0, 95.0, 0.7),
                CadenceBand::new(FrequencyLabel::Yearly, 355.0, 375.0, 0.7),
            ],
        }
    }
}

impl DetectionPolicy {
    /// Load the policy, preferring `path`, then the data-dir override, then defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(p) if p.exists() => read_policy(p)?,
            Some(p) => {
                warn!(path = %p.display(), "Policy file not found, using defaults");
                DEFAULT_POLICY.to_string()
            }
            None => match default_policy_path().filter(|p| p.exists()) {
                Some(p) => {
                    debug!(path = %p.display(), "Using policy override");
                    read_policy(&p)?
                }
                None => DEFAULT_POLICY.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse and validate a TOML policy
    pub fn from_toml(content: &str) -> Result<Self> {
        let policy: Self = toml::from_str(content)
            .map_err(|e| Error::Policy(format!("Failed to parse policy: {}", e)))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Render as TOML (for `recur policy`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Policy(format!("Failed to render policy: {}", e)))
    }

    pub fn with_cluster_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.cluster_strategy = strategy;
        self
    }

    /// Reject policies the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.amount_tolerance > 0.0 && self.amount_tolerance <= 1.0) {
            return Err(Error::Policy(format!(
                "amount_tolerance must be in (0, 1], got {}",
                self.amount_tolerance
            )));
        }
        if self.interval_consistency_ratio.is_nan() || self.interval_consistency_ratio < 0.0 {
            return Err(Error::Policy(format!(
                "interval_consistency_ratio must be >= 0, got {}",
                self.interval_consistency_ratio
            )));
        }
        if self.min_samples < 2 {
            return Err(Error::Policy(format!(
                "min_samples must be at least 2, got {}",
                self.min_samples
            )));
        }
        if self.sample_bonus.is_nan() || self.sample_bonus < 0.0 {
            return Err(Error::Policy(format!(
                "sample_bonus must be >= 0, got {}",
                self.sample_bonus
            )));
        }
        if !is_unit(self.fallback_confidence) {
            return Err(Error::Policy(format!(
                "fallback_confidence must be in [0, 1], got {}",
                self.fallback_confidence
            )));
        }
        for band in &self.bands {
            if band.min_days > band.max_days {
                return Err(Error::Policy(format!(
                    "band {} has min_days {} > max_days {}",
                    band.label, band.min_days, band.max_days
                )));
            }
            if !is_unit(band.confidence) {
                return Err(Error::Policy(format!(
                    "band {} confidence must be in [0, 1], got {}",
                    band.label, band.confidence
                )));
            }
        }
        Ok(())
    }
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn read_policy(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Policy(format!(
            "Failed to read policy {}: {}",
            path.display(),
            e
        ))
    })
}

/// Default policy override path
pub fn default_policy_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("recur").join("config").join("detection.toml"))
}
