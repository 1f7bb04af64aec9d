//! Simulation configuration with documented constants
//!
//! Only the knobs a caller may reasonably tune live here. Hard limits such as
//! the iteration clamp are fixed constants in `simulation`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{OddsError, Result};

/// Configuration for the stochastic simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of equal-width bins in each output histogram
    ///
    /// Damage samples are usually small integers, so 20 bins resolves
    /// single values for most matchups while keeping large ones readable.
    pub histogram_bins: usize,

    /// Deterministic seed for the per-worker random sources
    ///
    /// `None` seeds every worker from OS entropy. `Some` gives each worker
    /// its own ChaCha stream derived from this seed, which makes runs
    /// reproducible for a fixed iteration count and worker layout.
    pub seed: Option<u64>,

    /// Minimum number of trials handed to one worker
    ///
    /// Below this, rayon task overhead exceeds the cost of the trials.
    /// At 1000, a 10,000 iteration run splits into at most 10 chunks.
    pub min_trials_per_worker: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 20,
            seed: None,
            min_trials_per_worker: 1_000,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Same config with a fixed seed
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.histogram_bins == 0 {
            return Err(OddsError::InvalidConfig(
                "histogram_bins must be at least 1".into(),
            ));
        }

        if self.min_trials_per_worker == 0 {
            return Err(OddsError::InvalidConfig(
                "min_trials_per_worker must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        if let Err(e) = config.validate() {
            tracing::warn!("Rejected simulation config: {}", e);
            return Err(e);
        }
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
