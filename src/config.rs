//! Run configuration. Every field defaults to its `FLEDGE_` constant, so a config file only
//! needs to name what it changes.

use crate::{
    constants::{FLEDGE_DECISION_THRESHOLD, FLEDGE_ELITE_STEP, FLEDGE_GENERATIONS, FLEDGE_POPULATION},
    environment::{Normalizer, SpawnJitter},
    error::{Error, Result},
    network::Topology,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Sensor values fed to every network
pub const SENSOR_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub population: usize,
    pub topology: Topology,
    pub elite_step: usize,
    pub decision_threshold: f64,
    pub normalizer: Normalizer,
    pub spawn_jitter: SpawnJitter,
    /// Seed for every random draw, OS entropy if absent
    pub seed: Option<u64>,
    /// Generations the demo binary runs for
    pub generations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population: FLEDGE_POPULATION,
            topology: Topology::default(),
            elite_step: FLEDGE_ELITE_STEP,
            decision_threshold: FLEDGE_DECISION_THRESHOLD,
            normalizer: Normalizer::default(),
            spawn_jitter: SpawnJitter::default(),
            seed: None,
            generations: FLEDGE_GENERATIONS,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(Error::EmptyPopulation);
        }
        self.topology.validate()?;
        self.normalizer.validate()?;
        self.spawn_jitter.validate()?;
        if self.topology.inputs != SENSOR_COUNT {
            return Err(Error::InvalidTopology(format!(
                "networks take {SENSOR_COUNT} sensor inputs, topology has {}",
                self.topology.inputs
            )));
        }
        Ok(())
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
