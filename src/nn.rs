use std::iter;

use faer::prelude::*;
use rand::RngCore;

use crate::{
    Error, Lcg, PrettyPrintParams, Result,
    core::{cost, forward, randomize},
    error::try_zeroed_floats,
};

/// Layer sizes of a network, input layer first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    layer_sizes: Box<[usize]>,
}

impl Topology {
    /// `layer_sizes` must contain at least an input and an output layer, none of them empty.
    pub fn new(layer_sizes: &[usize]) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidTopology {
                reason: "needs at least an input and an output layer",
            });
        }
        if layer_sizes.contains(&0) {
            return Err(Error::InvalidTopology {
                reason: "layers must have at least one unit",
            });
        }
        Ok(Self {
            layer_sizes: layer_sizes.into(),
        })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn n_inputs(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn n_outputs(&self) -> usize {
        self.layer_sizes[self.depth()]
    }

    /// Number of connections, one less than the number of layers.
    pub fn depth(&self) -> usize {
        self.layer_sizes.len() - 1
    }

    pub fn n_layers(&self) -> usize {
        self.layer_sizes.len()
    }
}

/// Activations of one layer, written by the forward pass.
#[derive(Debug, Clone)]
pub struct Layer {
    activation: Box<[f32]>,
}

impl Layer {
    pub fn size(&self) -> usize {
        self.activation.len()
    }

    pub fn activation(&self) -> &[f32] {
        &self.activation
    }

    pub fn activation_mut(&mut self) -> &mut [f32] {
        &mut self.activation
    }
}

/// Weights and biases mapping layer `i` onto the pre-activations of layer `i + 1`.
///
/// `weight` is row-major with `output_size` rows and `input_size` columns, so row `r` belongs to
/// output unit `r` and column `c` to input unit `c`.
#[derive(Debug, Clone)]
pub struct Connection {
    input_size: usize,
    output_size: usize,
    weight: Box<[f32]>,
    bias: Box<[f32]>,
}

impl Connection {
    fn create(input_size: usize, output_size: usize) -> Result<Self> {
        Ok(Self {
            input_size,
            output_size,
            weight: try_zeroed_floats(input_size * output_size)?,
            bias: try_zeroed_floats(output_size)?,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn weight(&self) -> &[f32] {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut [f32] {
        &mut self.weight
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    pub fn bias_mut(&mut self) -> &mut [f32] {
        &mut self.bias
    }

    /// Both parameter arrays at once, `(weight, bias)`.
    pub fn params_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.weight, &mut self.bias)
    }

    /// Weight of the edge from input unit `col` to output unit `row`.
    #[track_caller]
    pub fn weight_at(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.output_size && col < self.input_size);
        self.weight[row * self.input_size + col]
    }

    /// The weights as an `output_size × input_size` matrix view.
    pub fn w(&self) -> MatRef<'_, f32> {
        MatRef::from_row_major_slice(&self.weight, self.output_size, self.input_size)
    }
}

/// A fully connected network of logistic units.
#[derive(Debug, Clone)]
pub struct Network {
    topology: Topology,
    layers: Box<[Layer]>,
    connections: Box<[Connection]>,
}

impl Network {
    /// Allocates a network with all parameters and activations zeroed.
    pub fn new(topology: Topology) -> Result<Self> {
        let layers = topology
            .layer_sizes()
            .iter()
            .map(|&n| {
                Ok(Layer {
                    activation: try_zeroed_floats(n)?,
                })
            })
            .collect::<Result<Box<[Layer]>>>()?;
        let connections = topology
            .layer_sizes()
            .windows(2)
            .map(|pair| Connection::create(pair[0], pair[1]))
            .collect::<Result<Box<[Connection]>>>()?;
        Ok(Self {
            topology,
            layers,
            connections,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn depth(&self) -> usize {
        self.topology.depth()
    }

    pub fn n_inputs(&self) -> usize {
        self.topology.n_inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.topology.n_outputs()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Direct access to the activations, e.g. for driving a forward pass from outside.
    /// Layer sizes cannot change through this.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut [Connection] {
        &mut self.connections
    }

    pub fn connection(&self, index: usize) -> Option<&Connection> {
        self.connections.get(index)
    }

    pub fn connection_mut(&mut self, index: usize) -> Option<&mut Connection> {
        self.connections.get_mut(index)
    }

    /// Activations of the output layer.
    pub fn output(&self) -> &[f32] {
        self.layers[self.depth()].activation()
    }

    /// Runs the forward pass and returns the output activations.
    pub fn forward(&mut self, input: &[f32]) -> Result<&[f32]> {
        forward(&self.connections, &mut self.layers, input)?;
        Ok(self.output())
    }

    /// Initializes all parameters from an [`Lcg`] started at `seed`.
    pub fn randomize(&mut self, seed: u32) {
        randomize(self, &mut Lcg::new(seed));
    }

    /// Initializes all parameters from any generator.
    pub fn randomize_with(&mut self, rng: &mut impl RngCore) {
        randomize(self, rng);
    }

    /// Mean cross-entropy cost over `samples`, each an `(input, target)` pair.
    pub fn loss(&mut self, samples: &[(&[f32], &[f32])]) -> Result<f32> {
        if samples.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let mut total = 0.0f32;
        for &(x, y) in samples {
            self.forward(x)?;
            total += cost(self, y)?;
        }
        Ok(total / samples.len() as f32)
    }

    pub fn pretty_print_connection(&self, index: usize) -> Option<PrettyPrintParams<'_>> {
        let connection = self.connection(index)?;
        Some(PrettyPrintParams::new(index, connection))
    }

    /// Iterates over `(connection, input layer)` pairs.
    pub(crate) fn connections_with_inputs(&self) -> impl Iterator<Item = (&Connection, &Layer)> {
        iter::zip(self.connections.iter(), self.layers.iter())
    }
}
