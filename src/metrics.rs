//! Classification evaluation helpers.
//!
//! These are read-only conveniences for judging a trained network; the
//! training loop itself never consults them.

use crate::network::Network;
use crate::vector::Vector;
use crate::{Error, Result};

/// Index of the largest value. Ties resolve to the first occurrence.
pub fn argmax(values: &[f32]) -> Result<usize> {
    if values.is_empty() {
        return Err(Error::InvalidData("argmax over zero values".to_owned()));
    }
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    Ok(best)
}

/// Fraction of samples whose predicted argmax matches the expected argmax.
///
/// `samples` yields `(input, expected)` row pairs sized for the network.
pub fn accuracy<'a, I>(network: &mut Network, samples: I) -> Result<f32>
where
    I: IntoIterator<Item = (&'a [f32], &'a [f32])>,
{
    let mut input = Vector::zeroed("accuracy.input", network.input_size())?;
    let mut total = 0usize;
    let mut correct = 0usize;
    for (x, expected) in samples {
        input.load(x)?;
        let predicted = network.forward(&input)?;
        if argmax(predicted.as_slice())? == argmax(expected)? {
            correct += 1;
        }
        total += 1;
    }
    if total == 0 {
        return Err(Error::InvalidData("accuracy over zero samples".to_owned()));
    }
    Ok(correct as f32 / total as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::backend::Backend;
    use crate::layer::Layer;

    #[test]
    fn argmax_picks_the_largest() {
        assert_eq!(argmax(&[0.1, 0.9, 0.3]).unwrap(), 1);
        assert_eq!(argmax(&[2.0]).unwrap(), 0);
        // First occurrence wins ties.
        assert_eq!(argmax(&[0.5, 0.5]).unwrap(), 0);
        assert!(argmax(&[]).is_err());
    }

    #[test]
    fn accuracy_counts_matching_argmax() {
        // Identity-activation layer with a fixed weight matrix that swaps
        // the two inputs, so the prediction is the input reversed.
        let mut layer =
            Layer::new("l", 2, 2, Activation::Identity, Backend::Vectorized).unwrap();
        layer.weights_mut().load(&[0.0, 1.0, 1.0, 0.0]).unwrap();
        let mut net = Network::from_layers("net", vec![layer]).unwrap();

        let samples: Vec<([f32; 2], [f32; 2])> = vec![
            ([1.0, 0.0], [0.0, 1.0]), // swapped: correct
            ([0.0, 1.0], [1.0, 0.0]), // swapped: correct
            ([1.0, 0.0], [1.0, 0.0]), // not swapped: wrong
            ([0.0, 1.0], [0.0, 1.0]), // not swapped: wrong
        ];
        let acc = accuracy(
            &mut net,
            samples.iter().map(|(x, e)| (&x[..], &e[..])),
        )
        .unwrap();
        assert!((acc - 0.5).abs() < 1e-6);
    }
}
