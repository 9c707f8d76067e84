//! A feed-forward network as an ordered chain of layers.
//!
//! The forward pass is the identity on the input followed by each layer in
//! order. The backward pass seeds the output error as
//! `expected - predicted` (predicted being the cached output of the last
//! forward pass) and chains gradients through the layers in reverse.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activation::Activation;
use crate::backend::Backend;
use crate::layer::{Init, Layer};
use crate::vector::Vector;
use crate::{Error, Result};

/// An ordered stack of fully connected layers.
#[derive(Debug)]
pub struct Network {
    name: String,
    layers: Vec<Layer>,
    output_error: Vector,
}

impl Network {
    /// Assemble a network from pre-built layers, validating that each
    /// layer's output size matches the next layer's input size.
    pub fn from_layers(name: &str, layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "network {name} needs at least one layer"
            )));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(Error::DimensionMismatch(format!(
                    "network {name}: layer {} outputs {} values but layer {} expects {}",
                    pair[0].name(),
                    pair[0].output_size(),
                    pair[1].name(),
                    pair[1].input_size()
                )));
            }
        }
        let output_size = layers[layers.len() - 1].output_size();
        Ok(Self {
            name: name.to_owned(),
            layers,
            output_error: Vector::zeroed(&format!("{name}.output_error"), output_size)?,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Length the input vectors must have.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    /// Length of the network's output.
    #[inline]
    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    /// The output of the most recent forward pass.
    #[inline]
    pub fn output(&self) -> &Vector {
        self.layers[self.layers.len() - 1].output()
    }

    /// Run the input through every layer in order and return the final
    /// activation.
    pub fn forward(&mut self, input: &Vector) -> Result<&Vector> {
        if input.len() != self.input_size() {
            return Err(Error::DimensionMismatch(format!(
                "network {}: input {}[len={}] does not match input size {}",
                self.name,
                input.name(),
                input.len(),
                self.input_size()
            )));
        }
        self.layers[0].forward(input)?;
        for i in 1..self.layers.len() {
            // Disjoint borrows of the producing and consuming layer.
            let (upstream, downstream) = self.layers.split_at_mut(i);
            downstream[0].forward(upstream[i - 1].output())?;
        }
        Ok(self.output())
    }

    /// Backpropagate from the cached forward output against `expected`.
    ///
    /// Seeds the output error as `expected - predicted` and chains each
    /// layer's backward pass in reverse. Gradients accumulate in the
    /// layers; call [`Network::apply_gradients`] to flush them.
    pub fn backward(&mut self, expected: &Vector) -> Result<()> {
        if expected.len() != self.output_size() {
            return Err(Error::DimensionMismatch(format!(
                "network {}: expected {}[len={}] does not match output size {}",
                self.name,
                expected.name(),
                expected.len(),
                self.output_size()
            )));
        }

        let last = self.layers.len() - 1;
        Vector::subtract_into(
            expected,
            self.layers[last].output(),
            &mut self.output_error,
        )?;

        self.layers[last].backward(&self.output_error)?;
        for i in (0..last).rev() {
            let (upstream, downstream) = self.layers.split_at_mut(i + 1);
            upstream[i].backward(downstream[0].input_gradient())?;
        }
        Ok(())
    }

    /// Flush every layer's gradient accumulators with a mean-gradient step.
    pub fn apply_gradients(&mut self, learning_rate: f32, batch_size: usize) -> Result<()> {
        for layer in &mut self.layers {
            layer.apply_gradients(learning_rate, batch_size)?;
        }
        Ok(())
    }

    /// Release all layer buffers early. Idempotent.
    pub fn release(&mut self) {
        for layer in &mut self.layers {
            layer.release();
        }
        self.output_error.release();
    }
}

/// Fluent construction of a [`Network`] with seeded random initialization.
///
/// The backend and init scheme are plain configuration values captured at
/// build time; nothing about execution is global state.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    name: String,
    backend: Backend,
    init: Init,
    seed: u64,
    input_size: Option<usize>,
    layers: Vec<(usize, Activation)>,
}

impl NetworkBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            backend: Backend::default(),
            init: Init::default(),
            seed: 0,
            input_size: None,
            layers: Vec::new(),
        }
    }

    /// Select the matrix-vector execution path for every layer.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    /// Seed for reproducible weight initialization.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Length of the network's input vectors.
    pub fn input(mut self, size: usize) -> Self {
        self.input_size = Some(size);
        self
    }

    /// Append a fully connected layer of `size` outputs.
    pub fn layer(mut self, size: usize, activation: Activation) -> Self {
        self.layers.push((size, activation));
        self
    }

    pub fn build(self) -> Result<Network> {
        let input_size = self.input_size.ok_or_else(|| {
            Error::InvalidConfig(format!("network {}: input size not set", self.name))
        })?;
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "network {}: no layers specified",
                self.name
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut layers = Vec::with_capacity(self.layers.len());
        let mut fan_in = input_size;
        for (i, (size, activation)) in self.layers.iter().enumerate() {
            layers.push(Layer::random(
                &format!("{}.layer{i}", self.name),
                fan_in,
                *size,
                *activation,
                self.backend,
                self.init,
                &mut rng,
            )?);
            fan_in = *size;
        }
        Network::from_layers(&self.name, layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed_net(sizes: &[usize]) -> Network {
        let mut layers = Vec::new();
        for (i, pair) in sizes.windows(2).enumerate() {
            layers.push(
                Layer::new(
                    &format!("l{i}"),
                    pair[0],
                    pair[1],
                    Activation::Sigmoid,
                    Backend::Vectorized,
                )
                .unwrap(),
            );
        }
        Network::from_layers("net", layers).unwrap()
    }

    #[test]
    fn zero_weight_sigmoid_network_outputs_half() {
        let mut net = zeroed_net(&[4, 2]);
        let input = Vector::from_slice("x", &[0.0, 0.0, 0.0, 0.0]).unwrap();
        let out = net.forward(&input).unwrap();
        assert_eq!(out.as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn forward_threads_through_all_layers() {
        let mut net = zeroed_net(&[4, 6, 2]);
        let input = Vector::from_slice("x", &[1.0, -1.0, 0.5, 0.25]).unwrap();
        let out = net.forward(&input).unwrap();
        assert_eq!(out.len(), 2);
        // Zero weights: hidden = sigmoid(0) = 0.5, output = sigmoid(0) = 0.5.
        assert_eq!(out.as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn mismatched_layer_chain_is_rejected() {
        let a = Layer::new("a", 4, 6, Activation::Sigmoid, Backend::Vectorized).unwrap();
        let b = Layer::new("b", 4, 2, Activation::Sigmoid, Backend::Vectorized).unwrap();
        assert!(matches!(
            Network::from_layers("bad", vec![a, b]),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn builder_is_reproducible() {
        let build = || {
            NetworkBuilder::new("net")
                .seed(42)
                .input(4)
                .layer(6, Activation::Tanh)
                .layer(2, Activation::Sigmoid)
                .build()
                .unwrap()
        };
        let a = build();
        let b = build();
        for (la, lb) in a.layers().iter().zip(b.layers()) {
            assert_eq!(la.weights().as_slice(), lb.weights().as_slice());
        }
    }

    #[test]
    fn builder_requires_input_and_layers() {
        assert!(matches!(
            NetworkBuilder::new("n").layer(2, Activation::Sigmoid).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            NetworkBuilder::new("n").input(4).build(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn backward_accumulates_in_every_layer() {
        let mut net = NetworkBuilder::new("net")
            .seed(3)
            .input(4)
            .layer(6, Activation::Sigmoid)
            .layer(2, Activation::Sigmoid)
            .build()
            .unwrap();

        let input = Vector::from_slice("x", &[0.2, -0.1, 0.4, 0.8]).unwrap();
        let expected = Vector::from_slice("e", &[1.0, 0.0]).unwrap();
        net.forward(&input).unwrap();
        net.backward(&expected).unwrap();

        for layer in net.layers() {
            assert!(
                layer.weight_gradient().as_slice().iter().any(|&g| g != 0.0),
                "layer {} accumulated nothing",
                layer.name()
            );
        }
    }

    #[test]
    fn backward_requires_matching_expected_length() {
        let mut net = zeroed_net(&[4, 2]);
        let input = Vector::from_slice("x", &[0.0; 4]).unwrap();
        net.forward(&input).unwrap();
        let bad = Vector::from_slice("e", &[0.0; 4]).unwrap();
        assert!(matches!(
            net.backward(&bad),
            Err(Error::DimensionMismatch(_))
        ));
    }
}
