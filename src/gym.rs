use tracing::{debug, info, trace, warn};

use crate::{
    Error, Lcg, Network, Result, ShuffleMode, TrainConfig,
    core::{
        TrainBuffer, add_gradient, clear_gradient, compute_error, cost, normalize_gradient,
        perform_descent, shuffle, shuffle_unbiased,
    },
};

/// Runs mini-batch gradient descent on a network.
///
/// Owns the training buffer for the lifetime of the training session, so nothing is allocated
/// per step.
pub struct Gym<'a> {
    nn: &'a mut Network,
    buffer: TrainBuffer,
    config: TrainConfig,
    rng: Lcg,
    order: Vec<usize>,
    i_epoch: usize,
}

impl<'a> Gym<'a> {
    pub fn new(nn: &'a mut Network, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let mut buffer = TrainBuffer::create(nn)?;
        clear_gradient(&mut buffer);
        Ok(Self {
            nn,
            buffer,
            config,
            rng: Lcg::new(config.seed),
            order: Vec::new(),
            i_epoch: 0,
        })
    }

    pub fn nn(&mut self) -> &mut Network {
        &mut *self.nn
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn buffer(&self) -> &TrainBuffer {
        &self.buffer
    }

    /// Number of epochs run so far.
    pub fn i_epoch(&self) -> usize {
        self.i_epoch
    }

    /// One pass over `samples`, each an `(input, target)` pair.
    ///
    /// Returns the mean cost of the samples as seen by the forward passes of this epoch. A
    /// non-finite cost means training has diverged or an output unit saturated.
    pub fn train_epoch(&mut self, samples: &[(&[f32], &[f32])]) -> Result<f32> {
        if samples.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if self.order.len() != samples.len() {
            self.order = (0..samples.len()).collect();
        }
        match self.config.shuffle {
            ShuffleMode::Legacy => shuffle(&mut self.order, &mut self.rng),
            ShuffleMode::Unbiased => shuffle_unbiased(&mut self.order, &mut self.rng),
            ShuffleMode::None => (),
        }
        let mut total = 0.0f32;
        for batch in self.order.chunks(self.config.batch_size) {
            for &i_sample in batch {
                let (x, y) = samples[i_sample];
                self.nn.forward(x)?;
                total += cost(self.nn, y)?;
                compute_error(self.nn, &mut self.buffer, y)?;
                add_gradient(self.nn, &mut self.buffer)?;
            }
            normalize_gradient(&mut self.buffer, batch.len())?;
            perform_descent(self.nn, &mut self.buffer, self.config.rate)?;
            clear_gradient(&mut self.buffer);
            trace!(batch_len = batch.len(), "finished batch");
        }
        let mean = total / samples.len() as f32;
        self.i_epoch += 1;
        if mean.is_finite() {
            debug!(epoch = self.i_epoch, cost = mean, "finished epoch");
        } else {
            warn!(epoch = self.i_epoch, cost = mean, "cost is not finite, training diverged");
        }
        Ok(mean)
    }

    /// Runs the configured number of epochs and returns the cost of the last one.
    pub fn train(&mut self, samples: &[(&[f32], &[f32])]) -> Result<f32> {
        let mut last = f32::NAN;
        for _ in 0..self.config.n_epochs {
            last = self.train_epoch(samples)?;
        }
        info!(
            epochs = self.i_epoch,
            cost = last,
            rate = self.config.rate,
            batch_size = self.config.batch_size,
            shuffle = %self.config.shuffle,
            "training finished"
        );
        Ok(last)
    }

    /// Ends the session and releases the training buffer.
    pub fn finish(self) {
        self.buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::Topology;

    const XOR: &[(&[f32], &[f32])] = &[
        (&[0., 0.], &[0.]),
        (&[0., 1.], &[1.]),
        (&[1., 0.], &[1.]),
        (&[1., 1.], &[0.]),
    ];

    fn network(seed: u32) -> Network {
        let mut nn = Network::new(Topology::new(&[2, 3, 1]).unwrap()).unwrap();
        nn.randomize(seed);
        nn
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut nn = network(1);
        assert!(matches!(
            Gym::new(&mut nn, TrainConfig::default().batch_size(0)),
            Err(Error::EmptyBatch)
        ));
    }

    #[test]
    fn rejects_zero_epochs() {
        let mut nn = network(1);
        assert!(matches!(
            Gym::new(&mut nn, TrainConfig::default().n_epochs(0)),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_empty_samples() {
        let mut nn = network(1);
        let mut gym = Gym::new(&mut nn, TrainConfig::default()).unwrap();
        assert_eq!(gym.train_epoch(&[]).unwrap_err(), Error::EmptyBatch);
    }

    #[test]
    fn full_batch_epoch_is_one_averaged_step() {
        let mut nn = network(42);
        let mut expected = nn.clone();
        let config = TrainConfig::default()
            .rate(0.3)
            .batch_size(XOR.len())
            .shuffle(ShuffleMode::None);

        let mut buffer = TrainBuffer::create(&expected).unwrap();
        clear_gradient(&mut buffer);
        for &(x, y) in XOR {
            expected.forward(x).unwrap();
            compute_error(&expected, &mut buffer, y).unwrap();
            add_gradient(&expected, &mut buffer).unwrap();
        }
        normalize_gradient(&mut buffer, XOR.len()).unwrap();
        perform_descent(&mut expected, &mut buffer, 0.3).unwrap();

        let mut gym = Gym::new(&mut nn, config).unwrap();
        gym.train_epoch(XOR).unwrap();
        gym.finish();
        for (c, e) in nn.connections().iter().zip(expected.connections()) {
            assert_eq!(c.weight(), e.weight());
            assert_eq!(c.bias(), e.bias());
        }
    }

    #[test]
    fn same_seed_same_run() {
        let config = TrainConfig::default().batch_size(2).n_epochs(20);
        let mut a = network(3);
        let mut b = network(3);
        let cost_a = Gym::new(&mut a, config).unwrap().train(XOR).unwrap();
        let cost_b = Gym::new(&mut b, config).unwrap().train(XOR).unwrap();
        assert_eq!(cost_a, cost_b);
        assert_eq!(a.connection(0).unwrap().weight(), b.connection(0).unwrap().weight());
    }

    #[test]
    fn cost_goes_down() {
        let mut nn = network(42);
        let before = nn.loss(XOR).unwrap();
        let mut gym = Gym::new(&mut nn, TrainConfig::default().rate(0.5).n_epochs(2000)).unwrap();
        gym.train(XOR).unwrap();
        assert_eq!(gym.i_epoch(), 2000);
        let after = gym.nn().loss(XOR).unwrap();
        assert!(after < before, "{after} >= {before}");
        assert!(after < 0.05, "XOR not learned, cost {after}");
        assert_relative_eq!(before, std::f32::consts::LN_2, epsilon = 0.1);
    }
}
