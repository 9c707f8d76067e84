//! Activation functions.
//!
//! A closed set of activations as a plain tagged enum. Derivatives are
//! computed from the cached post-activation output, which is exact for
//! sigmoid and tanh and correct almost everywhere for ReLU.

use crate::vector::LANES;

/// Elementwise nonlinearity applied after the affine step of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Sigmoid,
    Tanh,
    ReLU,
    /// Pass-through, for linear output layers.
    Identity,
}

impl Activation {
    /// Apply to a single pre-activation value.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::ReLU => x.max(0.0),
            Activation::Identity => x,
        }
    }

    /// Derivative expressed in terms of the activation's own output `a`.
    ///
    /// ReLU uses `a > 0`, which assigns derivative 0 at the kink.
    #[inline]
    pub fn derivative_from_output(self, a: f32) -> f32 {
        match self {
            Activation::Sigmoid => a * (1.0 - a),
            Activation::Tanh => 1.0 - a * a,
            Activation::ReLU => {
                if a > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Identity => 1.0,
        }
    }

    /// Apply in place over a slice, lane-chunked with a scalar tail.
    pub fn apply_slice(self, values: &mut [f32]) {
        if self == Activation::Identity {
            return;
        }
        let mut chunks = values.chunks_exact_mut(LANES);
        for c in &mut chunks {
            c[0] = self.apply(c[0]);
            c[1] = self.apply(c[1]);
            c[2] = self.apply(c[2]);
            c[3] = self.apply(c[3]);
        }
        for v in chunks.into_remainder() {
            *v = self.apply(*v);
        }
    }

    /// Write `derivative_from_output` of each element of `outputs` into
    /// `derivatives`. Slices must have equal length; callers validate.
    pub(crate) fn derivative_slice(self, outputs: &[f32], derivatives: &mut [f32]) {
        debug_assert_eq!(outputs.len(), derivatives.len());
        for (d, &a) in derivatives.iter_mut().zip(outputs) {
            *d = self.derivative_from_output(a);
        }
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::ReLU => "relu",
            Activation::Identity => "identity",
        };
        f.write_str(name)
    }
}
