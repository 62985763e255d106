//! The logistic activation shared by every layer.
//!
//! Back propagation in this crate is only correct for logistic units paired with cross-entropy
//! loss, so this is deliberately the only activation on offer.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sigmoid;

impl Sigmoid {
    pub const NAME: &'static str = "sigmoid";

    #[inline(always)]
    pub fn apply(x: f32) -> f32 {
        1.0 / (1.0 + f32::exp(-x))
    }

    /// Derivative expressed through the activation `a = sigmoid(z)`, i.e. `a * (1 - a)`.
    #[inline(always)]
    pub fn deriv_from_output(a: f32) -> f32 {
        a * (1.0 - a)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn midpoint() {
        assert_eq!(Sigmoid::apply(0.0), 0.5);
        assert_eq!(Sigmoid::deriv_from_output(0.5), 0.25);
    }

    #[test]
    fn deriv_matches_finite_difference() {
        let h = 1e-3f32;
        for &z in &[-2.0f32, -0.3, 0.0, 0.7, 1.9] {
            let numeric = (Sigmoid::apply(z + h) - Sigmoid::apply(z - h)) / (2.0 * h);
            let analytic = Sigmoid::deriv_from_output(Sigmoid::apply(z));
            assert_relative_eq!(numeric, analytic, epsilon = 1e-3);
        }
    }
}
