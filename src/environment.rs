//! The boundary between the engine and whatever world its agents live in. The engine never
//! simulates agents itself: it reads [Reading]s, answers with [Decision]s, and tells the
//! environment when a generation starts and ends.

use crate::{
    constants::{
        FLEDGE_DECISION_THRESHOLD, FLEDGE_NORM_HEIGHT, FLEDGE_NORM_VELOCITY, FLEDGE_NORM_WIDTH,
        FLEDGE_SPAWN_JITTER_X, FLEDGE_SPAWN_JITTER_Y,
    },
    error::{Error, Result},
};
use rand::{
    distr::{Distribution, Uniform},
    Rng,
};
use serde::{Deserialize, Serialize};

/// Raw sensor values of one agent, in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensors {
    /// Distance to the center of the next obstacle ahead
    pub horizontal_distance: f64,
    /// Offset from the agent to the center of the next gap, positive below
    pub vertical_offset: f64,
    pub vertical_velocity: f64,
    pub gap_size: f64,
}

/// What an agent reports at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Alive, with an obstacle to sense
    Sensing(Sensors),
    /// Alive, with nothing ahead to sense
    Blind,
    /// Dead, having survived for `survival` ticks
    Dead { survival: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Act,
    Idle,
}

impl Decision {
    /// Act iff `output[0]` is above `threshold`. Any further outputs aren't consulted.
    pub fn from_output(output: &[f64], threshold: f64) -> Self {
        match output.first() {
            Some(y) if *y > threshold => Self::Act,
            _ => Self::Idle,
        }
    }
}

/// Scales raw [Sensors] into network inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalizer {
    pub width: f64,
    pub height: f64,
    pub velocity: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            width: FLEDGE_NORM_WIDTH,
            height: FLEDGE_NORM_HEIGHT,
            velocity: FLEDGE_NORM_VELOCITY,
        }
    }
}

impl Normalizer {
    /// Every scale must be finite and positive
    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [
            ("width", self.width),
            ("height", self.height),
            ("velocity", self.velocity),
        ] {
            if !(scale.is_finite() && scale > 0.) {
                return Err(Error::InvalidConfig(format!(
                    "normalizer {name} must be finite and positive, got {scale}"
                )));
            }
        }
        Ok(())
    }

    pub fn normalize(&self, s: &Sensors) -> [f64; 4] {
        [
            s.horizontal_distance / self.width,
            s.vertical_offset / self.height,
            s.vertical_velocity / self.velocity,
            s.gap_size / self.height,
        ]
    }
}

/// Maximum spawn offset from the environment's spawn point, per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnJitter {
    pub x: f64,
    pub y: f64,
}

impl Default for SpawnJitter {
    fn default() -> Self {
        Self {
            x: FLEDGE_SPAWN_JITTER_X,
            y: FLEDGE_SPAWN_JITTER_Y,
        }
    }
}

impl SpawnJitter {
    /// Offsets drawn uniformly from `[-extent, extent]`, or none for a zero extent
    fn distribution(extent: f64) -> Result<Option<Uniform<f64>>> {
        if extent == 0. {
            return Ok(None);
        }
        Uniform::new_inclusive(-extent, extent)
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("spawn jitter {extent}: {e}")))
    }

    /// Every extent must be non-negative and finite, with a samplable width
    pub fn validate(&self) -> Result<()> {
        Self::distribution(self.x)?;
        Self::distribution(self.y)?;
        Ok(())
    }

    pub fn spawn(&self, index: usize, rng: &mut impl Rng) -> Result<Spawn> {
        let mut offset = |extent| {
            Self::distribution(extent).map(|d| d.map_or(0., |d| d.sample(&mut *rng)))
        };
        Ok(Spawn {
            index,
            dx: offset(self.x)?,
            dy: offset(self.y)?,
        })
    }
}

/// Where the agent bound to population `index` should start, relative to the spawn point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub index: usize,
    pub dx: f64,
    pub dy: f64,
}

/// A world hosting one agent per population index for the length of a generation
pub trait Environment {
    /// Discard every agent, and bind a fresh one to each of `spawns`, where agent `i` is
    /// `spawns[i]`
    fn spawn(&mut self, spawns: &[Spawn]);

    /// Report on the agent bound to `index`
    fn sense(&self, index: usize) -> Reading;

    /// Hand the agent bound to `index` its decision for this tick
    fn apply(&mut self, index: usize, decision: Decision);

    /// Reset world state (obstacles, clocks) for a new generation
    fn restart(&mut self);
}
