//! A single fully connected layer.
//!
//! A layer owns its parameters (`weights`, `biases`), the caches filled by
//! the forward and backward passes, and the gradient accumulators that
//! persist across samples until [`Layer::apply_gradients`] flushes them.
//! All scratch storage is allocated at construction; the training loop
//! itself never allocates.

use rand::Rng;

use crate::activation::Activation;
use crate::backend::Backend;
use crate::matrix::Matrix;
use crate::vector::{self, Vector};
use crate::{Error, Result};

/// Weight initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Init {
    /// Uniform in `±sqrt(6 / (fan_in + fan_out))`, suited to sigmoid/tanh.
    #[default]
    Xavier,
    /// Uniform in `±sqrt(6 / fan_in)`, suited to ReLU.
    He,
}

impl Init {
    fn limit(self, fan_in: usize, fan_out: usize) -> f32 {
        match self {
            Init::Xavier => (6.0 / (fan_in + fan_out) as f32).sqrt(),
            Init::He => (6.0 / fan_in as f32).sqrt(),
        }
    }
}

/// Fully connected layer with cached activations and persistent gradient
/// accumulators.
#[derive(Debug)]
pub struct Layer {
    name: String,
    activation: Activation,
    backend: Backend,
    weights: Matrix,
    biases: Vector,
    // Forward/backward caches, sized once at construction.
    last_input: Vector,
    outputs: Vector,
    derivative: Vector,
    error: Vector,
    input_gradient: Vector,
    // Accumulators, zeroed only by apply_gradients.
    weight_gradient: Matrix,
    bias_gradient: Vector,
}

impl Layer {
    /// Build a layer with zeroed parameters.
    ///
    /// `input_size` and `output_size` must both be even and non-zero (the
    /// vector invariant), which also keeps the weight matrix's linear
    /// length divisible by 4.
    pub fn new(
        name: &str,
        input_size: usize,
        output_size: usize,
        activation: Activation,
        backend: Backend,
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_owned(),
            activation,
            backend,
            weights: Matrix::zeroed(&format!("{name}.weights"), output_size, input_size)?,
            biases: Vector::zeroed(&format!("{name}.biases"), output_size)?,
            last_input: Vector::zeroed(&format!("{name}.last_input"), input_size)?,
            outputs: Vector::zeroed(&format!("{name}.outputs"), output_size)?,
            derivative: Vector::zeroed(&format!("{name}.derivative"), output_size)?,
            error: Vector::zeroed(&format!("{name}.error"), output_size)?,
            input_gradient: Vector::zeroed(&format!("{name}.input_gradient"), input_size)?,
            weight_gradient: Matrix::zeroed(&format!("{name}.weight_gradient"), output_size, input_size)?,
            bias_gradient: Vector::zeroed(&format!("{name}.bias_gradient"), output_size)?,
        })
    }

    /// Build a layer with randomly initialized weights and zero biases.
    pub fn random<R: Rng + ?Sized>(
        name: &str,
        input_size: usize,
        output_size: usize,
        activation: Activation,
        backend: Backend,
        init: Init,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer = Self::new(name, input_size, output_size, activation, backend)?;
        let limit = init.limit(input_size, output_size);
        for w in layer.weights.as_mut_slice() {
            *w = rng.random_range(-limit..limit);
        }
        Ok(layer)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.weights.input_count()
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.weights.output_count()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    #[inline]
    pub fn biases(&self) -> &Vector {
        &self.biases
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut Vector {
        &mut self.biases
    }

    /// The output of the most recent forward pass.
    #[inline]
    pub fn output(&self) -> &Vector {
        &self.outputs
    }

    /// The input gradient produced by the most recent backward pass.
    #[inline]
    pub fn input_gradient(&self) -> &Vector {
        &self.input_gradient
    }

    /// The weight-gradient accumulator (for inspection in tests/tools).
    #[inline]
    pub fn weight_gradient(&self) -> &Matrix {
        &self.weight_gradient
    }

    /// The bias-gradient accumulator.
    #[inline]
    pub fn bias_gradient(&self) -> &Vector {
        &self.bias_gradient
    }

    /// `outputs = activation(W · input + b)`; caches `input` and the result.
    pub fn forward(&mut self, input: &Vector) -> Result<&Vector> {
        if input.len() != self.input_size() {
            return Err(Error::DimensionMismatch(format!(
                "layer {}: input {}[len={}] does not match input size {}",
                self.name,
                input.name(),
                input.len(),
                self.input_size()
            )));
        }
        self.last_input.load(input.as_slice())?;
        self.weights.multiply(input, &mut self.outputs, self.backend)?;
        vector::add_assign(self.outputs.as_mut_slice(), self.biases.as_slice());
        self.activation.apply_slice(self.outputs.as_mut_slice());
        Ok(&self.outputs)
    }

    /// Consume the gradient of the loss with respect to this layer's output
    /// and return the gradient with respect to its input.
    ///
    /// Accumulates into `weight_gradient` and `bias_gradient`; the
    /// accumulators keep growing until `apply_gradients` flushes them.
    pub fn backward(&mut self, output_gradient: &Vector) -> Result<&Vector> {
        if output_gradient.len() != self.output_size() {
            return Err(Error::DimensionMismatch(format!(
                "layer {}: gradient {}[len={}] does not match output size {}",
                self.name,
                output_gradient.name(),
                output_gradient.len(),
                self.output_size()
            )));
        }

        self.activation
            .derivative_slice(self.outputs.as_slice(), self.derivative.as_mut_slice());
        vector::mul_into_slices(
            output_gradient.as_slice(),
            self.derivative.as_slice(),
            self.error.as_mut_slice(),
        );

        self.weight_gradient
            .add_outer_product(&self.error, &self.last_input)?;
        self.bias_gradient.add_elementwise(&self.error)?;

        self.weights
            .multiply_transpose(&self.error, &mut self.input_gradient, self.backend)?;
        Ok(&self.input_gradient)
    }

    /// Step the parameters by the mean accumulated gradient and reset the
    /// accumulators. This is the only place the accumulators are cleared.
    ///
    /// The step adds `learning_rate / batch_size` times the accumulators;
    /// the sign is positive because the output error is seeded as
    /// `expected - predicted`, so the accumulators already point downhill.
    pub fn apply_gradients(&mut self, learning_rate: f32, batch_size: usize) -> Result<()> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer {}: batch size must be > 0",
                self.name
            )));
        }
        let step = learning_rate / batch_size as f32;
        self.weights
            .add_elementwise_weighted(&self.weight_gradient, step)?;
        self.biases
            .add_elementwise_weighted(&self.bias_gradient, step)?;
        self.weight_gradient.clear();
        self.bias_gradient.clear();
        Ok(())
    }

    /// Release all owned buffers early. Idempotent.
    pub fn release(&mut self) {
        self.weights.release();
        self.biases.release();
        self.last_input.release();
        self.outputs.release();
        self.derivative.release();
        self.error.release();
        self.input_gradient.release();
        self.weight_gradient.release();
        self.bias_gradient.release();
    }
}
