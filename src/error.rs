use thiserror::Error;

/// Errors reported by network construction and the training routines.
///
/// Numeric trouble (saturated activations, diverging parameters) is never an error here, it shows
/// up as non-finite values in the returned cost.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid topology: {reason}")]
    InvalidTopology { reason: &'static str },
    #[error("training buffer was created for layer sizes {expected:?}, network has {found:?}")]
    TopologyMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("target has {found} elements, output layer has {expected}")]
    TargetLength { expected: usize, found: usize },
    #[error("input has {found} elements, input layer has {expected}")]
    InputLength { expected: usize, found: usize },
    #[error("batch must contain at least one sample")]
    EmptyBatch,
    #[error("invalid training config: {reason}")]
    InvalidConfig { reason: &'static str },
    #[error("failed to allocate {n_floats} floats")]
    Allocation { n_floats: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Allocates a zeroed float slice, reporting failure instead of aborting.
pub(crate) fn try_zeroed_floats(n_floats: usize) -> Result<Box<[f32]>> {
    bytemuck::allocation::try_zeroed_slice_box(n_floats).map_err(|()| Error::Allocation { n_floats })
}
