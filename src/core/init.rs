use rand::{Rng, RngCore};

use crate::{Network, lcg::unit_interval};

/// Fills every weight and bias with `draw / 2^32 - 0.5`, kept strictly inside `(-0.5, 0.5)`.
///
/// Draw order: connection by connection, and within a connection output unit by output unit,
/// each unit's bias first and then its weights in input order. A given seed therefore always
/// produces the same parameters.
pub fn randomize(network: &mut Network, rng: &mut impl RngCore) {
    for connection in network.connections_mut() {
        let n_inputs = connection.input_size();
        let (weight, bias) = connection.params_mut();
        for (b, row) in bias.iter_mut().zip(weight.chunks_exact_mut(n_inputs)) {
            *b = centered(rng);
            for w in row {
                *w = centered(rng);
            }
        }
    }
}

/// Largest `f32` below 0.5.
const BELOW_HALF: f32 = 0.5 - f32::EPSILON / 4.0;

/// Draws near either end of the `u32` range would otherwise round onto `±0.5`.
#[inline(always)]
fn centered(rng: &mut impl RngCore) -> f32 {
    ((unit_interval(rng.next_u32()) - 0.5) as f32).clamp(-BELOW_HALF, BELOW_HALF)
}

/// Permutes `items` by sweeping forward and swapping slot `i` with `i + draw % (len - i)`.
///
/// The modulo reduction is slightly biased whenever `len - i` does not divide `2^32`. That is
/// fine for ordering training samples and keeps orders reproducible against the historical
/// generator; use [`shuffle_unbiased`] when an exact uniform permutation matters.
pub fn shuffle<T>(items: &mut [T], rng: &mut impl RngCore) {
    let len = items.len();
    for i in 0..len.saturating_sub(1) {
        let remaining = (len - i) as u64;
        let j = i + (rng.next_u32() as u64 % remaining) as usize;
        items.swap(i, j);
    }
}

/// Same forward sweep as [`shuffle`], with `j` drawn uniformly from `i..len`.
pub fn shuffle_unbiased<T>(items: &mut [T], rng: &mut impl RngCore) {
    let len = items.len();
    for i in 0..len.saturating_sub(1) {
        let j = rng.random_range(i..len);
        items.swap(i, j);
    }
}
