use faer::{linalg::matmul::matmul, prelude::*};

use crate::{Connection, Error, Layer, Result, Sigmoid};

/// Copies `input` into the first layer and propagates it through every connection.
///
/// `connections` and `layers` must have matching shapes, as those of one network do.
pub fn forward(connections: &[Connection], layers: &mut [Layer], input: &[f32]) -> Result<()> {
    check_shapes(connections, layers)?;
    let input_layer = layers[0].activation_mut();
    if input.len() != input_layer.len() {
        return Err(Error::InputLength {
            expected: input_layer.len(),
            found: input.len(),
        });
    }
    input_layer.copy_from_slice(input);
    for (u, connection) in connections.iter().enumerate() {
        let (before, after) = layers.split_at_mut(u + 1);
        let a_prev = before[u].activation();
        let a = after[0].activation_mut();
        // z = W * a_prev;
        matmul(
            // A = α*L*R + β*A
            ColMut::from_slice_mut(a), // A = z, written in place of a
            faer::Accum::Replace,      // β = 0.0
            connection.w(),            // L = W
            ColRef::from_slice(a_prev), // R = a_prev
            1.0,                       // α = 1.0
            Par::Seq,
        );
        // a = sigmoid(z + b);
        for (ak, &bk) in a.iter_mut().zip(connection.bias()) {
            *ak = Sigmoid::apply(*ak + bk);
        }
    }
    Ok(())
}

/// Fails unless layer `i` feeds connection `i` and connection `i` fills layer `i + 1`.
fn check_shapes(connections: &[Connection], layers: &[Layer]) -> Result<()> {
    if connections.is_empty() {
        return Err(Error::InvalidTopology {
            reason: "needs at least an input and an output layer",
        });
    }
    let expected = connections
        .first()
        .map(Connection::input_size)
        .into_iter()
        .chain(connections.iter().map(Connection::output_size));
    let found = layers.iter().map(Layer::size);
    if !expected.clone().eq(found.clone()) {
        return Err(Error::TopologyMismatch {
            expected: expected.collect(),
            found: found.collect(),
        });
    }
    Ok(())
}
