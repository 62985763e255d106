use std::iter;

use crate::{Error, Network, Result};

/// Mean binary cross-entropy between the output layer's activations and `target`.
///
/// Output activations must lie strictly inside `(0, 1)`. A saturated unit makes the result
/// non-finite, which is returned as is so that divergence can be detected by the caller.
pub fn cost(network: &Network, target: &[f32]) -> Result<f32> {
    let a = network.output();
    if target.len() != a.len() {
        return Err(Error::TargetLength {
            expected: a.len(),
            found: target.len(),
        });
    }
    let sum: f32 = iter::zip(a, target)
        .map(|(&ak, &yk)| yk * ak.ln() + (1.0 - yk) * (1.0 - ak).ln())
        .sum();
    Ok(-sum / a.len() as f32)
}
