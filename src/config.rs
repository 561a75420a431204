//! Pipeline configuration

use crate::domain::Year;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First year of the observation window
    pub first_year: i32,

    /// Last year of the observation window, inclusive
    pub last_year: i32,

    /// Process positions on the rayon pool
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            first_year: 2012,
            last_year: 2012,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: PipelineConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_year > self.last_year {
            return Err(Error::InvalidArgument(format!(
                "first_year {} is after last_year {}",
                self.first_year, self.last_year
            )));
        }
        Ok(())
    }

    pub fn window(&self) -> (Year, Year) {
        (Year(self.first_year), Year(self.last_year))
    }
}
