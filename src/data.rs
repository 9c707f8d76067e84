//! Training-data collaborator interface and an in-memory implementation.
//!
//! The trainer only sees [`TrainingData`]; where samples come from (CSV,
//! HTTP, generated) is a caller concern. [`Dataset`] is the contiguous
//! row-major implementation used by the tests and demos.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{Error, Result};

/// Indexed access to `(input, expected)` sample pairs of fixed widths.
pub trait TrainingData {
    /// Number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of every input row.
    fn input_length(&self) -> usize;

    /// Width of every expected-output row.
    fn output_length(&self) -> usize;

    /// The `idx`-th `(input, expected)` pair.
    fn sample(&self, idx: usize) -> Result<(&[f32], &[f32])>;
}

/// Contiguous row-major in-memory dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    input_length: usize,
    output_length: usize,
    // Sample order; shuffling permutes this, not the rows themselves.
    order: Vec<usize>,
    inputs: Vec<f32>,
    outputs: Vec<f32>,
}

impl Dataset {
    /// Build from per-sample row pairs. Every input row must have the same
    /// length, likewise every output row.
    pub fn from_rows(rows: &[(Vec<f32>, Vec<f32>)]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidData("dataset has no samples".to_owned()));
        }
        let input_length = rows[0].0.len();
        let output_length = rows[0].1.len();
        if input_length == 0 || output_length == 0 {
            return Err(Error::InvalidData(
                "dataset rows must be non-empty".to_owned(),
            ));
        }
        let mut inputs = Vec::with_capacity(rows.len() * input_length);
        let mut outputs = Vec::with_capacity(rows.len() * output_length);
        for (i, (x, y)) in rows.iter().enumerate() {
            if x.len() != input_length || y.len() != output_length {
                return Err(Error::InvalidData(format!(
                    "sample {i} has shape ({}, {}), expected ({input_length}, {output_length})",
                    x.len(),
                    y.len()
                )));
            }
            inputs.extend_from_slice(x);
            outputs.extend_from_slice(y);
        }
        Ok(Self {
            input_length,
            output_length,
            order: (0..rows.len()).collect(),
            inputs,
            outputs,
        })
    }

    /// Build from flat row-major buffers of `count` samples each.
    pub fn from_flat(
        count: usize,
        input_length: usize,
        output_length: usize,
        inputs: Vec<f32>,
        outputs: Vec<f32>,
    ) -> Result<Self> {
        if count == 0 || input_length == 0 || output_length == 0 {
            return Err(Error::InvalidData(
                "dataset dimensions must be > 0".to_owned(),
            ));
        }
        if inputs.len() != count * input_length {
            return Err(Error::InvalidData(format!(
                "inputs: {} values for {count} samples of width {input_length}",
                inputs.len()
            )));
        }
        if outputs.len() != count * output_length {
            return Err(Error::InvalidData(format!(
                "outputs: {} values for {count} samples of width {output_length}",
                outputs.len()
            )));
        }
        Ok(Self {
            input_length,
            output_length,
            order: (0..count).collect(),
            inputs,
            outputs,
        })
    }

    /// Reorder the sample permutation with a seeded generator.
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.order.shuffle(&mut rng);
    }
}

impl TrainingData for Dataset {
    fn len(&self) -> usize {
        self.order.len()
    }

    fn input_length(&self) -> usize {
        self.input_length
    }

    fn output_length(&self) -> usize {
        self.output_length
    }

    fn sample(&self, idx: usize) -> Result<(&[f32], &[f32])> {
        let row = *self.order.get(idx).ok_or_else(|| {
            Error::IndexOutOfRange(format!("dataset: sample {idx} >= {}", self.order.len()))
        })?;
        let x = &self.inputs[row * self.input_length..(row + 1) * self.input_length];
        let y = &self.outputs[row * self.output_length..(row + 1) * self.output_length];
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_rows() -> Vec<(Vec<f32>, Vec<f32>)> {
        vec![
            (vec![0.0, 0.0], vec![0.0, 1.0]),
            (vec![0.0, 1.0], vec![1.0, 0.0]),
            (vec![1.0, 0.0], vec![1.0, 0.0]),
            (vec![1.0, 1.0], vec![0.0, 1.0]),
        ]
    }

    #[test]
    fn from_rows_round_trips_samples() {
        let data = Dataset::from_rows(&xor_rows()).unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data.input_length(), 2);
        assert_eq!(data.output_length(), 2);
        let (x, y) = data.sample(1).unwrap();
        assert_eq!(x, &[0.0, 1.0]);
        assert_eq!(y, &[1.0, 0.0]);
        assert!(data.sample(4).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![
            (vec![0.0, 0.0], vec![1.0]),
            (vec![0.0], vec![1.0]),
        ];
        assert!(matches!(
            Dataset::from_rows(&rows),
            Err(Error::InvalidData(_))
        ));
        assert!(Dataset::from_rows(&[]).is_err());
    }

    #[test]
    fn from_flat_validates_lengths() {
        assert!(Dataset::from_flat(2, 2, 2, vec![0.0; 4], vec![0.0; 4]).is_ok());
        assert!(Dataset::from_flat(2, 2, 2, vec![0.0; 3], vec![0.0; 4]).is_err());
        assert!(Dataset::from_flat(0, 2, 2, vec![], vec![]).is_err());
    }

    #[test]
    fn shuffle_permutes_without_losing_samples() {
        let mut data = Dataset::from_rows(&xor_rows()).unwrap();
        data.shuffle(99);
        let mut seen: Vec<Vec<f32>> = (0..data.len())
            .map(|i| data.sample(i).unwrap().0.to_vec())
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut want: Vec<Vec<f32>> = xor_rows().into_iter().map(|(x, _)| x).collect();
        want.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, want);
    }

    #[test]
    fn shuffle_is_seed_deterministic() {
        let mut a = Dataset::from_rows(&xor_rows()).unwrap();
        let mut b = Dataset::from_rows(&xor_rows()).unwrap();
        a.shuffle(7);
        b.shuffle(7);
        for i in 0..a.len() {
            assert_eq!(a.sample(i).unwrap().0, b.sample(i).unwrap().0);
        }
    }
}
