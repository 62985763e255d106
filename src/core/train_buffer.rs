use tracing::debug;

use crate::{Error, Network, PrettyPrintGradient, Result, error::try_zeroed_floats};

/// Error signal at one layer, the loss gradient w.r.t. that layer's pre-activations.
#[derive(Debug)]
pub struct ErrorRecord {
    pub(crate) error: Box<[f32]>,
    /// Scratch space for the back-projected signal before the derivative is applied.
    pub(crate) buffer: Box<[f32]>,
}

impl ErrorRecord {
    fn create(size: usize) -> Result<Self> {
        Ok(Self {
            error: try_zeroed_floats(size)?,
            buffer: try_zeroed_floats(size)?,
        })
    }

    pub fn size(&self) -> usize {
        self.error.len()
    }

    pub fn error(&self) -> &[f32] {
        &self.error
    }
}

/// Accumulated gradient of one connection.
#[derive(Debug)]
pub struct GradientRecord {
    pub(crate) input_size: usize,
    pub(crate) output_size: usize,
    /// Same layout as the connection's weight matrix.
    pub(crate) grad_weight: Box<[f32]>,
    pub(crate) grad_bias: Box<[f32]>,
    /// Scratch space sized like `grad_weight`.
    pub(crate) buffer: Box<[f32]>,
}

impl GradientRecord {
    fn create(input_size: usize, output_size: usize) -> Result<Self> {
        Ok(Self {
            input_size,
            output_size,
            grad_weight: try_zeroed_floats(input_size * output_size)?,
            grad_bias: try_zeroed_floats(output_size)?,
            buffer: try_zeroed_floats(input_size * output_size)?,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn grad_weight(&self) -> &[f32] {
        &self.grad_weight
    }

    pub fn grad_bias(&self) -> &[f32] {
        &self.grad_bias
    }

    /// Accumulated gradient of the weight from input unit `col` to output unit `row`.
    #[track_caller]
    pub fn grad_weight_at(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.output_size && col < self.input_size);
        self.grad_weight[row * self.input_size + col]
    }

    pub(crate) fn accumulators_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.grad_weight.iter_mut().chain(self.grad_bias.iter_mut())
    }
}

/// Buffer needed for performing back propagation on a network.
///
/// Record `i` belongs to connection `i`: its error record holds the signal at layer `i + 1` (the
/// output side of the connection) and its gradient record the accumulated gradient of the
/// connection's parameters.
#[derive(Debug)]
pub struct TrainBuffer {
    layer_sizes: Box<[usize]>,
    pub(crate) errors: Box<[ErrorRecord]>,
    pub(crate) gradients: Box<[GradientRecord]>,
}

impl TrainBuffer {
    /// Allocates records matching `network`'s topology.
    ///
    /// Accumulators are not guaranteed to start at zero, call
    /// [`clear_gradient`](crate::core::clear_gradient) before the first batch.
    pub fn create(network: &Network) -> Result<Self> {
        let layer_sizes: Box<[usize]> = network.topology().layer_sizes().into();
        let errors = network
            .connections()
            .iter()
            .map(|connection| ErrorRecord::create(connection.output_size()))
            .collect::<Result<Box<[ErrorRecord]>>>()?;
        let gradients = network
            .connections()
            .iter()
            .map(|connection| {
                GradientRecord::create(connection.input_size(), connection.output_size())
            })
            .collect::<Result<Box<[GradientRecord]>>>()?;
        let buffer = Self {
            layer_sizes,
            errors,
            gradients,
        };
        debug!(
            layer_sizes = ?buffer.layer_sizes,
            n_floats = buffer.n_floats(),
            "created training buffer"
        );
        Ok(buffer)
    }

    /// Releases every array. Same as dropping the buffer.
    pub fn destroy(self) {}

    /// Layer sizes of the network this buffer was created for.
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Number of connections covered, one record of each kind per connection.
    pub fn depth(&self) -> usize {
        self.gradients.len()
    }

    /// Total number of floats owned by the buffer.
    pub fn n_floats(&self) -> usize {
        let errors: usize = self.errors.iter().map(|e| 2 * e.size()).sum();
        let gradients: usize = self
            .gradients
            .iter()
            .map(|g| g.grad_weight.len() + g.grad_bias.len() + g.buffer.len())
            .sum();
        errors + gradients
    }

    pub fn error(&self, index: usize) -> Option<&ErrorRecord> {
        self.errors.get(index)
    }

    pub fn gradient(&self, index: usize) -> Option<&GradientRecord> {
        self.gradients.get(index)
    }

    pub fn pretty_print_gradient(&self, index: usize) -> Option<PrettyPrintGradient<'_>> {
        let gradient = self.gradient(index)?;
        Some(PrettyPrintGradient::new(index, gradient))
    }

    /// Fails unless `network` has the topology this buffer was created for.
    pub fn check_topology(&self, network: &Network) -> Result<()> {
        let found = network.topology().layer_sizes();
        if *self.layer_sizes != *found {
            return Err(Error::TopologyMismatch {
                expected: self.layer_sizes.to_vec(),
                found: found.to_vec(),
            });
        }
        Ok(())
    }
}
