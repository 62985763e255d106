use std::iter;

use faer::{linalg::matmul::matmul, prelude::*};
use tracing::trace;

use crate::{
    Error, Network, Result, Sigmoid,
    core::{GradientRecord, TrainBuffer},
};

/// Computes the error signal of every layer for one sample.
///
/// The forward pass for this sample must already have run. The output error is seeded with
/// `a - target`, which is the gradient of cross-entropy loss through a logistic output unit, and
/// then carried backwards as `error[i - 1] = (W_i^T error[i]) * a_i * (1 - a_i)`. This is only
/// correct for networks of logistic units trained on cross-entropy loss.
pub fn compute_error(network: &Network, buffer: &mut TrainBuffer, target: &[f32]) -> Result<()> {
    buffer.check_topology(network)?;
    let output = network.output();
    if target.len() != output.len() {
        return Err(Error::TargetLength {
            expected: output.len(),
            found: target.len(),
        });
    }
    let depth = network.depth();
    let deepest = &mut buffer.errors[depth - 1];
    for ((e, &a), &y) in iter::zip(deepest.error.iter_mut(), output).zip(target) {
        *e = a - y;
    }
    for i in (1..depth).rev() {
        let (lower, upper) = buffer.errors.split_at_mut(i);
        let prev = &mut lower[i - 1];
        let current = &upper[0];
        let connection = &network.connections()[i];
        // buffer = W^T * error;
        matmul(
            ColMut::from_slice_mut(&mut prev.buffer[..]),
            faer::Accum::Replace,
            connection.w().transpose(),
            ColRef::from_slice(&current.error[..]),
            1.0,
            Par::Seq,
        );
        // error = buffer * a * (1 - a);
        let a = network.layers()[i].activation();
        for ((e, &s), &ak) in iter::zip(prev.error.iter_mut(), prev.buffer.iter()).zip(a) {
            *e = s * Sigmoid::deriv_from_output(ak);
        }
    }
    Ok(())
}

/// Adds the gradient of the current sample into the accumulators.
///
/// Call exactly once per sample, after [`compute_error`].
pub fn add_gradient(network: &Network, buffer: &mut TrainBuffer) -> Result<()> {
    buffer.check_topology(network)?;
    let records = iter::zip(buffer.gradients.iter_mut(), buffer.errors.iter());
    for ((connection, input_layer), (gradient, error)) in
        iter::zip(network.connections_with_inputs(), records)
    {
        let a_prev = input_layer.activation();
        let GradientRecord {
            grad_weight,
            grad_bias,
            buffer: outer,
            ..
        } = gradient;
        // outer = error * a_prev^T;
        let rows = outer.chunks_exact_mut(connection.input_size());
        for (row, &e) in iter::zip(rows, error.error.iter()) {
            for (o, &a) in iter::zip(row, a_prev) {
                *o = e * a;
            }
        }
        for (dw, &o) in iter::zip(grad_weight.iter_mut(), outer.iter()) {
            *dw += o;
        }
        for (db, &e) in iter::zip(grad_bias.iter_mut(), error.error.iter()) {
            *db += e;
        }
    }
    Ok(())
}

/// Turns the accumulated sums into a mean over `batch_size` samples.
pub fn normalize_gradient(buffer: &mut TrainBuffer, batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Error::EmptyBatch);
    }
    let n = batch_size as f32;
    for gradient in &mut buffer.gradients {
        for p in gradient.accumulators_mut() {
            *p /= n;
        }
    }
    Ok(())
}

/// Zeroes every accumulator.
pub fn clear_gradient(buffer: &mut TrainBuffer) {
    for gradient in &mut buffer.gradients {
        bytemuck::fill_zeroes(&mut gradient.grad_weight[..]);
        bytemuck::fill_zeroes(&mut gradient.grad_bias[..]);
    }
}

/// Moves every parameter against its accumulated gradient, `p -= rate * dp`.
///
/// `rate` is used as given, a non-positive or huge rate produces the corresponding update.
pub fn perform_descent(network: &mut Network, buffer: &mut TrainBuffer, rate: f32) -> Result<()> {
    buffer.check_topology(network)?;
    for (connection, gradient) in iter::zip(network.connections_mut(), buffer.gradients.iter_mut())
    {
        let GradientRecord {
            grad_weight,
            grad_bias,
            buffer: scaled,
            ..
        } = gradient;
        let (weight, bias) = connection.params_mut();
        let scaled_bias = &mut scaled[..grad_bias.len()];
        for (s, &db) in iter::zip(scaled_bias.iter_mut(), grad_bias.iter()) {
            *s = rate * db;
        }
        for (b, &s) in iter::zip(bias.iter_mut(), scaled_bias.iter()) {
            *b -= s;
        }
        for (s, &dw) in iter::zip(scaled.iter_mut(), grad_weight.iter()) {
            *s = rate * dw;
        }
        for (w, &s) in iter::zip(weight.iter_mut(), scaled.iter()) {
            *w -= s;
        }
    }
    trace!(rate, "applied gradient descent step");
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::Topology;

    fn network() -> Network {
        let mut nn = Network::new(Topology::new(&[2, 3, 1]).unwrap()).unwrap();
        nn.randomize(42);
        nn
    }

    fn accumulators(buffer: &TrainBuffer) -> Vec<f32> {
        (0..buffer.depth())
            .map(|i| buffer.gradient(i).unwrap())
            .flat_map(|g| g.grad_weight().iter().chain(g.grad_bias()).copied())
            .collect()
    }

    #[test]
    fn error_is_zero_when_output_matches_target() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        let target = nn.forward(&[0.2, 0.9]).unwrap().to_vec();
        compute_error(&nn, &mut buffer, &target).unwrap();
        assert!(buffer.error(1).unwrap().error().iter().all(|&e| e == 0.0));
        assert!(buffer.error(0).unwrap().error().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn error_by_hand() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        nn.forward(&[1.0, 0.0]).unwrap();
        compute_error(&nn, &mut buffer, &[1.0]).unwrap();
        let out = nn.output()[0];
        let delta_out = out - 1.0;
        assert_eq!(buffer.error(1).unwrap().error(), &[delta_out]);
        let hidden = nn.layer(1).unwrap().activation();
        let w = nn.connection(1).unwrap();
        for (k, &e) in buffer.error(0).unwrap().error().iter().enumerate() {
            let expected = w.weight_at(0, k) * delta_out * hidden[k] * (1.0 - hidden[k]);
            assert_relative_eq!(e, expected, epsilon = 1e-7);
        }
    }

    #[test]
    fn add_twice_doubles() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        clear_gradient(&mut buffer);
        nn.forward(&[0.4, -0.6]).unwrap();
        compute_error(&nn, &mut buffer, &[1.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        let once = accumulators(&buffer);
        add_gradient(&nn, &mut buffer).unwrap();
        let twice = accumulators(&buffer);
        for (a, b) in iter::zip(&once, &twice) {
            assert_eq!(2.0 * a, *b);
        }
    }

    #[test]
    fn clear_then_add_has_no_carryover() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        clear_gradient(&mut buffer);
        nn.forward(&[0.4, -0.6]).unwrap();
        compute_error(&nn, &mut buffer, &[1.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        let single = accumulators(&buffer);

        nn.forward(&[0.9, 0.1]).unwrap();
        compute_error(&nn, &mut buffer, &[0.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        clear_gradient(&mut buffer);
        assert!(accumulators(&buffer).iter().all(|&p| p == 0.0));

        nn.forward(&[0.4, -0.6]).unwrap();
        compute_error(&nn, &mut buffer, &[1.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        assert_eq!(accumulators(&buffer), single);
    }

    #[test]
    fn outer_product_layout() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        clear_gradient(&mut buffer);
        nn.forward(&[0.25, 0.75]).unwrap();
        compute_error(&nn, &mut buffer, &[0.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        for i in 0..nn.depth() {
            let a_prev = nn.layer(i).unwrap().activation();
            let error = buffer.error(i).unwrap().error();
            let gradient = buffer.gradient(i).unwrap();
            for (row, &e) in error.iter().enumerate() {
                assert_eq!(gradient.grad_bias()[row], e);
                for (col, &a) in a_prev.iter().enumerate() {
                    assert_eq!(gradient.grad_weight_at(row, col), e * a);
                }
            }
        }
    }

    #[test]
    fn normalize_divides() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        clear_gradient(&mut buffer);
        nn.forward(&[0.1, 0.2]).unwrap();
        compute_error(&nn, &mut buffer, &[1.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        let sum = accumulators(&buffer);
        normalize_gradient(&mut buffer, 4).unwrap();
        for (s, m) in iter::zip(sum, accumulators(&buffer)) {
            assert_relative_eq!(s / 4.0, m);
        }
        assert_eq!(normalize_gradient(&mut buffer, 0).unwrap_err(), Error::EmptyBatch);
    }

    #[test]
    fn descent_subtracts_scaled_gradient() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        clear_gradient(&mut buffer);
        nn.forward(&[0.3, 0.8]).unwrap();
        compute_error(&nn, &mut buffer, &[0.0]).unwrap();
        add_gradient(&nn, &mut buffer).unwrap();
        let before = nn.clone();
        perform_descent(&mut nn, &mut buffer, 0.5).unwrap();
        for i in 0..nn.depth() {
            let old = before.connection(i).unwrap();
            let new = nn.connection(i).unwrap();
            let gradient = buffer.gradient(i).unwrap();
            for (k, (&b_new, &b_old)) in iter::zip(new.bias(), old.bias()).enumerate() {
                assert_relative_eq!(b_new, b_old - 0.5 * gradient.grad_bias()[k]);
            }
            for (k, (&w_new, &w_old)) in iter::zip(new.weight(), old.weight()).enumerate() {
                assert_relative_eq!(w_new, w_old - 0.5 * gradient.grad_weight()[k]);
            }
        }
    }

    #[test]
    fn rejects_foreign_buffer() {
        let mut nn = network();
        let other = Network::new(Topology::new(&[2, 2, 1]).unwrap()).unwrap();
        let mut buffer = TrainBuffer::create(&other).unwrap();
        nn.forward(&[0.0, 0.0]).unwrap();
        assert!(matches!(
            compute_error(&nn, &mut buffer, &[1.0]),
            Err(Error::TopologyMismatch { .. })
        ));
        assert!(matches!(
            add_gradient(&nn, &mut buffer),
            Err(Error::TopologyMismatch { .. })
        ));
        assert!(matches!(
            perform_descent(&mut nn, &mut buffer, 0.1),
            Err(Error::TopologyMismatch { .. })
        ));
    }

    #[test]
    fn rejects_wrong_target_length() {
        let mut nn = network();
        let mut buffer = TrainBuffer::create(&nn).unwrap();
        nn.forward(&[0.0, 0.0]).unwrap();
        assert_eq!(
            compute_error(&nn, &mut buffer, &[1.0, 0.0]).unwrap_err(),
            Error::TargetLength {
                expected: 1,
                found: 2
            }
        );
    }
}
