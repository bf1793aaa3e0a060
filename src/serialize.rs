//! Weight buffers are stored as their IEEE-754 bit patterns, so a saved network reloads to the
//! exact same weights, `-0.0` and NaN payloads included.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize_weights<S: Serializer>(weights: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    weights
        .iter()
        .map(|w| w.to_bits())
        .collect::<Vec<_>>()
        .serialize(serializer)
}

pub fn deserialize_weights<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let bits = Vec::<u64>::deserialize(deserializer)?;
    Ok(bits.into_iter().map(f64::from_bits).collect())
}
