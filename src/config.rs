//! YAML configuration
//!
//! ```yaml
//! gradcheck:
//!   delta: 0.01
//!   precision: 0.001
//!   seed: 42
//! binning:
//!   num_bins: 10
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use crate::error::{Error, Result};
use crate::gradcheck::CheckConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for binning analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    pub num_bins: usize,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self { num_bins: 10 }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    pub gradcheck: CheckConfig,
    pub binning: BinningConfig,
}

impl ProbeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.gradcheck.validate()?;
        if self.binning.num_bins == 0 {
            return Err(Error::ConfigValue {
                field: "binning.num_bins".to_string(),
                message: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Read and validate a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProbeConfig> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading config {}", path.display()), e))?;
    ProbeConfig::from_yaml(&yaml)
}
