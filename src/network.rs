//! Fixed topology feedforward networks, whose weights live in a single flat buffer laid out
//! exactly as their [Genome]. Layers are bias-augmented: every layer's input vector has
//! [FLEDGE_BIAS] appended, and every neuron carries one trailing bias weight.

use crate::{
    constants::{
        FLEDGE_BIAS, FLEDGE_HIDDEN_LAYERS, FLEDGE_HIDDEN_SIZE, FLEDGE_INPUTS, FLEDGE_OUTPUTS,
        FLEDGE_WEIGHT_MAX, FLEDGE_WEIGHT_MIN,
    },
    error::{Error, Result},
    genome::Genome,
    serialize::{deserialize_weights, serialize_weights},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub mod activate {
    use crate::constants::{FLEDGE_RELU_CEILING, FLEDGE_SIGMOID_GUARD};

    /// Rectifier clamped to [0, FLEDGE_RELU_CEILING], so activations can't run away across layers.
    /// NaN rectifies to 0.
    pub fn relu(x: f64) -> f64 {
        if x.is_nan() || x < 0. {
            0.
        } else if x < FLEDGE_RELU_CEILING {
            x
        } else {
            FLEDGE_RELU_CEILING
        }
    }

    /// Logistic sigmoid, saturated outside of ±FLEDGE_SIGMOID_GUARD
    pub fn sigmoid(x: f64) -> f64 {
        if x.is_nan() || x <= -FLEDGE_SIGMOID_GUARD {
            0.
        } else if x >= FLEDGE_SIGMOID_GUARD {
            1.
        } else {
            1. / (1. + (-x).exp())
        }
    }
}

/// The structural shape of a network. Immutable once a network is built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub hidden_layers: usize,
    pub inputs: usize,
    pub hidden_size: usize,
    pub outputs: usize,
}

impl Topology {
    pub fn new(hidden_layers: usize, inputs: usize, hidden_size: usize, outputs: usize) -> Result<Self> {
        let topology = Self {
            hidden_layers,
            inputs,
            hidden_size,
            outputs,
        };
        topology.validate()?;
        Ok(topology)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers == 0 {
            return Err(Error::InvalidTopology("at least one hidden layer is required".into()));
        }
        if self.hidden_size == 0 {
            return Err(Error::InvalidTopology("hidden layers must hold at least one neuron".into()));
        }
        if self.outputs == 0 {
            return Err(Error::InvalidTopology("at least one output is required".into()));
        }
        Ok(())
    }

    /// Weights per neuron in hidden layer `layer`, bias included
    #[inline]
    fn fan_in(&self, layer: usize) -> usize {
        if layer == 0 {
            self.inputs + 1
        } else {
            self.hidden_size + 1
        }
    }

    /// Length of every genome of this topology
    pub fn total_weights(&self) -> usize {
        (0..self.hidden_layers)
            .map(|layer| self.hidden_size * self.fan_in(layer))
            .sum::<usize>()
            + self.outputs * (self.hidden_size + 1)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            hidden_layers: FLEDGE_HIDDEN_LAYERS,
            inputs: FLEDGE_INPUTS,
            hidden_size: FLEDGE_HIDDEN_SIZE,
            outputs: FLEDGE_OUTPUTS,
        }
    }
}

/// A feedforward network. Weights are ordered layer-major, then neuron-major, then
/// weight-major for hidden layers, followed by the output layer's neurons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNetwork")]
pub struct Network {
    topology: Topology,
    #[serde(serialize_with = "serialize_weights")]
    weights: Vec<f64>,
}

#[derive(Deserialize)]
struct RawNetwork {
    topology: Topology,
    #[serde(deserialize_with = "deserialize_weights")]
    weights: Vec<f64>,
}

impl TryFrom<RawNetwork> for Network {
    type Error = Error;

    fn try_from(RawNetwork { topology, weights }: RawNetwork) -> Result<Self> {
        Self::from_weights(topology, weights)
    }
}

#[inline]
fn dot(l: &[f64], r: &[f64]) -> f64 {
    l.iter().zip(r).map(|(l, r)| l * r).sum()
}

impl Network {
    /// A network whose every weight is drawn uniformly from [FLEDGE_WEIGHT_MIN, FLEDGE_WEIGHT_MAX]
    pub fn random(topology: Topology, rng: &mut impl Rng) -> Result<Self> {
        topology.validate()?;
        let weights = (0..topology.total_weights())
            .map(|_| rng.random_range(FLEDGE_WEIGHT_MIN..=FLEDGE_WEIGHT_MAX))
            .collect();
        Ok(Self { topology, weights })
    }

    /// A network with exactly these weights, which must be genome ordered
    pub fn from_weights(topology: Topology, weights: Vec<f64>) -> Result<Self> {
        topology.validate()?;
        let expected = topology.total_weights();
        if weights.len() != expected {
            return Err(Error::GenomeLengthMismatch {
                expected,
                actual: weights.len(),
            });
        }
        Ok(Self { topology, weights })
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn total_weights(&self) -> usize {
        self.weights.len()
    }

    /// Borrow the weights in genome order
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn to_genome(&self) -> Genome {
        self.weights.clone()
    }

    /// Overwrite every weight from `genome`. Either all weights are replaced, or on a length
    /// mismatch none are.
    pub fn from_genome(&mut self, genome: &[f64]) -> Result<()> {
        if genome.len() != self.weights.len() {
            return Err(Error::GenomeLengthMismatch {
                expected: self.weights.len(),
                actual: genome.len(),
            });
        }
        self.weights.copy_from_slice(genome);
        Ok(())
    }

    /// Feed `input` forward through every layer. Hidden layers activate with a clamped
    /// [activate::relu], outputs with [activate::sigmoid].
    pub fn compute(&self, input: &[f64]) -> Result<Vec<f64>> {
        let Topology {
            hidden_layers,
            inputs,
            hidden_size,
            ..
        } = self.topology;

        if input.len() != inputs {
            return Err(Error::InvalidInputShape {
                expected: inputs,
                actual: input.len(),
            });
        }

        let mut prev = Vec::with_capacity(inputs + 1);
        prev.extend_from_slice(input);
        prev.push(FLEDGE_BIAS);

        let mut offset = 0;
        for _ in 0..hidden_layers {
            let fan_in = prev.len();
            let span = hidden_size * fan_in;
            let mut next = Vec::with_capacity(hidden_size + 1);
            next.extend(
                self.weights[offset..offset + span]
                    .chunks_exact(fan_in)
                    .map(|neuron| activate::relu(dot(&prev, neuron))),
            );
            next.push(FLEDGE_BIAS);
            offset += span;
            prev = next;
        }

        Ok(self.weights[offset..]
            .chunks_exact(prev.len())
            .map(|neuron| activate::sigmoid(dot(&prev, neuron)))
            .collect())
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
