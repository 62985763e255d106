//! Core parts of the training algorithms without abstraction.

pub mod train_buffer;

pub use train_buffer::{ErrorRecord, GradientRecord, TrainBuffer};

mod back_propagation;
mod cost;
mod forward;
mod init;

pub use back_propagation::*;
pub use cost::*;
pub use forward::*;
pub use init::*;
