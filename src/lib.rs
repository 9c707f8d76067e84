//! `ffnet` is a from-scratch compute engine for feed-forward neural
//! networks: aligned single-precision buffers, lane-width elementwise and
//! matrix-vector kernels with an optional BLAS-style fast path, a strided
//! tensor view engine, and a Layer/Network/Trainer stack for forward
//! inference and mini-batch backpropagation.
//!
//! # Example
//!
//! ```
//! use ffnet::{Activation, Backend, Dataset, NetworkBuilder, TrainConfig, Trainer};
//!
//! # fn main() -> ffnet::Result<()> {
//! let mut network = NetworkBuilder::new("xor")
//!     .backend(Backend::Vectorized)
//!     .seed(11)
//!     .input(2)
//!     .layer(8, Activation::Tanh)
//!     .layer(2, Activation::Sigmoid)
//!     .build()?;
//!
//! let data = Dataset::from_rows(&[
//!     (vec![0.0, 0.0], vec![0.0, 1.0]),
//!     (vec![0.0, 1.0], vec![1.0, 0.0]),
//!     (vec![1.0, 0.0], vec![1.0, 0.0]),
//!     (vec![1.0, 1.0], vec![0.0, 1.0]),
//! ])?;
//!
//! let trainer = Trainer::new(TrainConfig {
//!     epochs: 200,
//!     learning_rate: 0.8,
//!     mini_batch_size: 4,
//! })?;
//! let report = trainer.train(&mut network, &data)?;
//! assert!(report.final_mse() < report.epochs[0].mse);
//! # Ok(())
//! # }
//! ```
//!
//! # Design notes
//!
//! - All numeric storage lives in 16-byte-aligned, move-only buffers that
//!   free exactly once ([`buffer::AlignedBuffer`]).
//! - Kernels process 4 lanes per step with a scalar remainder loop; vector
//!   lengths are required to be even and matrix linear lengths divisible
//!   by 4.
//! - The matrix-vector product runs on either the crate's own vectorized
//!   loop or a delegated BLAS-style routine; [`Backend`] is a plain
//!   configuration value, never global state, and the two paths agree
//!   within floating-point tolerance.
//! - Shape and length checks happen eagerly and return [`Error`] before
//!   any mutation.

pub mod activation;
pub mod backend;
pub mod buffer;
pub mod data;
pub mod error;
pub mod layer;
pub mod loss;
pub mod matrix;
pub mod metrics;
pub mod model_io;
pub mod network;
pub mod parallel;
pub mod tensor;
pub mod trainer;
pub mod vector;

pub use activation::Activation;
pub use backend::Backend;
pub use buffer::AlignedBuffer;
pub use data::{Dataset, TrainingData};
pub use error::{Error, Result};
pub use layer::{Init, Layer};
pub use matrix::Matrix;
pub use model_io::{MemoryWeights, WeightSource};
pub use network::{Network, NetworkBuilder};
pub use tensor::Tensor;
pub use trainer::{EpochReport, TrainConfig, TrainReport, Trainer};
pub use vector::Vector;
