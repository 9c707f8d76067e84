//! Mini-batch gradient descent over a [`TrainingData`] source.

use crate::data::TrainingData;
use crate::loss;
use crate::network::Network;
use crate::vector::Vector;
use crate::{Error, Result};

/// Training hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    /// Gradient accumulators are flushed after this many samples.
    pub mini_batch_size: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            learning_rate: 0.1,
            mini_batch_size: 32,
        }
    }
}

/// Loss summary for one epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochReport {
    pub epoch: usize,
    /// Mean squared error over all samples and output components.
    pub mse: f32,
}

/// Per-epoch reports for a whole training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: Vec<EpochReport>,
}

impl TrainReport {
    /// MSE of the last epoch.
    pub fn final_mse(&self) -> f32 {
        self.epochs.last().map_or(f32::NAN, |e| e.mse)
    }
}

/// Runs epochs of per-sample forward/backward passes with exact mini-batch
/// flush boundaries.
#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Result<Self> {
        if config.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if config.mini_batch_size == 0 {
            return Err(Error::InvalidConfig(
                "mini batch size must be > 0".to_owned(),
            ));
        }
        if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                config.learning_rate
            )));
        }
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train `network` on `data` and report per-epoch loss.
    ///
    /// Each sample runs one forward and one backward pass; accumulators are
    /// flushed every `mini_batch_size` samples and once more at the end of
    /// the epoch if a partial batch remains, scaled by the actual count.
    pub fn train<D: TrainingData>(&self, network: &mut Network, data: &D) -> Result<TrainReport> {
        if data.is_empty() {
            return Err(Error::InvalidData("no training samples".to_owned()));
        }
        if data.input_length() != network.input_size() {
            return Err(Error::DimensionMismatch(format!(
                "data inputs have {} values, network {} expects {}",
                data.input_length(),
                network.name(),
                network.input_size()
            )));
        }
        if data.output_length() != network.output_size() {
            return Err(Error::DimensionMismatch(format!(
                "data outputs have {} values, network {} produces {}",
                data.output_length(),
                network.name(),
                network.output_size()
            )));
        }

        let mut input = Vector::zeroed("trainer.input", data.input_length())?;
        let mut expected = Vector::zeroed("trainer.expected", data.output_length())?;
        let denom = (data.len() * data.output_length()) as f32;
        let mut epochs = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            let mut squared_sum = 0.0f32;
            let mut pending = 0usize;

            for idx in 0..data.len() {
                let (x, e) = data.sample(idx)?;
                input.load(x)?;
                expected.load(e)?;

                let predicted = network.forward(&input)?;
                squared_sum += loss::squared_error(predicted.as_slice(), expected.as_slice())?;
                network.backward(&expected)?;
                pending += 1;

                if (idx + 1) % self.config.mini_batch_size == 0 {
                    network.apply_gradients(self.config.learning_rate, pending)?;
                    pending = 0;
                }
            }
            // Trailing partial batch, flushed exactly once.
            if pending > 0 {
                network.apply_gradients(self.config.learning_rate, pending)?;
            }

            epochs.push(EpochReport {
                epoch,
                mse: squared_sum / denom,
            });
        }

        Ok(TrainReport { epochs })
    }
}
