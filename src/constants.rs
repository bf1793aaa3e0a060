//! Centralized constants for fledge evolution parameters.
//!
//! All configurable parameters are defined here with the `FLEDGE_` prefix.
//! [crate::config::Config] takes its defaults from these.

// ============================================================================
// Population Parameters
// ============================================================================

/// Number of individuals per generation
pub const FLEDGE_POPULATION: usize = 1000;

/// Number of ranked individuals used as duplication templates, and left unmutated
pub const FLEDGE_ELITE_STEP: usize = 5;

// ============================================================================
// Topology Parameters
// ============================================================================

pub const FLEDGE_HIDDEN_LAYERS: usize = 1;
pub const FLEDGE_INPUTS: usize = 4;
pub const FLEDGE_HIDDEN_SIZE: usize = 6;

/// Only the first output drives decisions, the second is carried for genome compatibility
pub const FLEDGE_OUTPUTS: usize = 2;

/// Value appended to every layer's input vector
pub const FLEDGE_BIAS: f64 = 1.0;

// ============================================================================
// Activation Parameters
// ============================================================================

/// Upper clamp of the hidden layer rectifier
pub const FLEDGE_RELU_CEILING: f64 = 10_000.0;

/// Pre-activation magnitude beyond which the sigmoid saturates to 0 or 1
pub const FLEDGE_SIGMOID_GUARD: f64 = 60.0;

// ============================================================================
// Genome Mutation Parameters
// ============================================================================

/// Lower bound for freshly drawn weights
pub const FLEDGE_WEIGHT_MIN: f64 = -1000.0;

/// Upper bound for freshly drawn weights
pub const FLEDGE_WEIGHT_MAX: f64 = 1000.0;

/// Lower bound of the scale mutation factor
pub const FLEDGE_SCALE_MIN: f64 = 0.5;

/// Number of discrete steps between the scale mutation bounds, [0.5, 1.5]
pub const FLEDGE_SCALE_STEPS: u32 = 10_000;

/// A perturbation is a fresh weight divided by this, landing in [-10, 10]
pub const FLEDGE_PERTURB_DIVISOR: f64 = 100.0;

// ============================================================================
// Decision Parameters
// ============================================================================

/// Output 0 above this means "act"
pub const FLEDGE_DECISION_THRESHOLD: f64 = 0.5;

/// Horizontal sensor normalization
pub const FLEDGE_NORM_WIDTH: f64 = 576.0;

/// Vertical offset and gap size normalization
pub const FLEDGE_NORM_HEIGHT: f64 = 512.0;

/// Vertical velocity normalization
pub const FLEDGE_NORM_VELOCITY: f64 = 500.0;

// ============================================================================
// Spawn Parameters
// ============================================================================

/// Horizontal spawn offset is drawn from [-x, x]
pub const FLEDGE_SPAWN_JITTER_X: f64 = 5.0;

/// Vertical spawn offset is drawn from [-y, y]
pub const FLEDGE_SPAWN_JITTER_Y: f64 = 20.0;

// ============================================================================
// Run Parameters
// ============================================================================

/// Generations the demo binary runs for when not configured
pub const FLEDGE_GENERATIONS: usize = 100;
