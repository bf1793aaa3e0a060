//! Fixed topology neuroevolution: a population of small feedforward networks, scored by how long
//! their agents survive in an [Environment], and evolved by striped elitist duplication plus
//! random mutation.

pub mod config;
pub mod constants;
pub mod controller;
pub mod environment;
pub mod error;
pub mod genome;
pub mod macros;
pub mod network;
pub mod population;
pub mod random;
pub mod scenario;
mod serialize;

pub use config::Config;
pub use controller::{Controller, GenerationReport};
pub use environment::{Decision, Environment, Normalizer, Reading, Sensors, Spawn, SpawnJitter};
pub use error::{Error, Result};
pub use genome::{mutate, Genome, Mutation, MutationKind};
pub use network::{activate, Network, Topology};
pub use population::Population;
pub use random::WyRng;
pub use scenario::GapRunner;
