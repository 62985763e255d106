//! Training step of a fully connected network of logistic units: seeded initialization,
//! back propagation of cross-entropy error, batch gradient accumulation and gradient descent.
//!
//! ```
//! use backprop::{Gym, Network, Topology, TrainConfig};
//!
//! let samples: &[(&[f32], &[f32])] = &[
//!     (&[0., 0.], &[0.]),
//!     (&[0., 1.], &[1.]),
//!     (&[1., 0.], &[1.]),
//!     (&[1., 1.], &[0.]),
//! ];
//! let mut nn = Network::new(Topology::new(&[2, 3, 1])?)?;
//! nn.randomize(42);
//! let mut gym = Gym::new(&mut nn, TrainConfig::default().n_epochs(100))?;
//! let cost = gym.train(samples)?;
//! assert!(cost.is_finite());
//! # Ok::<(), backprop::Error>(())
//! ```

pub use faer;

mod activation;
mod config;
mod error;
mod gym;
mod lcg;
mod nn;
mod pretty_print;

pub mod core;

pub use activation::*;
pub use config::*;
pub use crate::core::{ErrorRecord, GradientRecord, TrainBuffer};
pub use error::{Error, Result};
pub use gym::*;
pub use lcg::*;
pub use nn::*;
pub use pretty_print::*;
