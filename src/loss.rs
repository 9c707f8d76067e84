//! Loss reporting helpers.

use crate::{Error, Result};

/// Mean squared error between a prediction and its target.
pub fn mse(predicted: &[f32], expected: &[f32]) -> Result<f32> {
    if predicted.len() != expected.len() {
        return Err(Error::DimensionMismatch(format!(
            "mse: predicted has {} values, expected has {}",
            predicted.len(),
            expected.len()
        )));
    }
    if predicted.is_empty() {
        return Err(Error::InvalidData("mse over zero values".to_owned()));
    }
    let sum: f32 = predicted
        .iter()
        .zip(expected)
        .map(|(p, e)| (p - e) * (p - e))
        .sum();
    Ok(sum / predicted.len() as f32)
}

/// Sum of squared errors, the per-sample quantity the trainer accumulates.
pub fn squared_error(predicted: &[f32], expected: &[f32]) -> Result<f32> {
    if predicted.len() != expected.len() {
        return Err(Error::DimensionMismatch(format!(
            "squared_error: predicted has {} values, expected has {}",
            predicted.len(),
            expected.len()
        )));
    }
    Ok(predicted
        .iter()
        .zip(expected)
        .map(|(p, e)| (p - e) * (p - e))
        .sum())
}
