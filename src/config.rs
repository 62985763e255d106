use derive_more::{Display, IsVariant};

use crate::{Error, Result};

/// How the sample order is permuted at the start of every epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum ShuffleMode {
    /// Forward modulo sweep of [`shuffle`](crate::core::shuffle), reproducible against
    /// historical runs.
    #[default]
    #[display("legacy")]
    Legacy,
    /// [`shuffle_unbiased`](crate::core::shuffle_unbiased).
    #[display("unbiased")]
    Unbiased,
    /// Samples are visited in the order given.
    #[display("none")]
    None,
}

/// Hyperparameters of a [`Gym`](crate::Gym).
///
/// The defaults are:
///
/// * a learning rate of 0.5,
/// * stochastic updates (batch size 1),
/// * 1000 epochs,
/// * seed 42 for the sample shuffler,
/// * [`ShuffleMode::Legacy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub rate: f32,
    pub batch_size: usize,
    pub n_epochs: usize,
    pub seed: u32,
    pub shuffle: ShuffleMode,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            rate: 0.5,
            batch_size: 1,
            n_epochs: 1000,
            seed: 42,
            shuffle: ShuffleMode::Legacy,
        }
    }
}

impl TrainConfig {
    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Number of samples averaged into one descent step. The last batch of an epoch may be short.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn shuffle(mut self, shuffle: ShuffleMode) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Rejects a zero batch size and a zero epoch count.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::EmptyBatch);
        }
        if self.n_epochs == 0 {
            return Err(Error::InvalidConfig {
                reason: "n_epochs must be at least 1",
            });
        }
        Ok(())
    }
}
