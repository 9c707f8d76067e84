//! Model persistence and external weight loading.
//!
//! The persisted JSON format mirrors the in-memory structure: a network
//! record with named layer records, each carrying its weight matrix and
//! bias vector as flat arrays with declared shapes. Loading re-validates
//! everything: declared shapes against array lengths, layer chaining, and
//! finiteness of every value.
//!
//! The execution backend is deliberately not part of the format; it is
//! runtime configuration supplied again at load time.

use std::collections::HashMap;

use crate::matrix::Matrix;
use crate::vector::Vector;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use crate::activation::Activation;
#[cfg(feature = "serde")]
use crate::backend::Backend;
#[cfg(feature = "serde")]
use crate::layer::Layer;
#[cfg(feature = "serde")]
use crate::network::Network;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// External supplier of named weight blocks: flat data plus declared shape.
///
/// Where the blocks come from (a parsed weight file, a download, another
/// framework's export) is the implementor's concern; the loaders below only
/// validate and copy.
pub trait WeightSource {
    /// Look up a block by name. `KeyNotFound` if absent.
    fn entry(&self, name: &str) -> Result<(&[f32], &[usize])>;
}

/// In-memory [`WeightSource`] keyed by block name.
#[derive(Debug, Default, Clone)]
pub struct MemoryWeights {
    entries: HashMap<String, (Vec<f32>, Vec<usize>)>,
}

impl MemoryWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, data: Vec<f32>, shape: Vec<usize>) {
        self.entries.insert(name.to_owned(), (data, shape));
    }
}

impl WeightSource for MemoryWeights {
    fn entry(&self, name: &str) -> Result<(&[f32], &[usize])> {
        self.entries
            .get(name)
            .map(|(d, s)| (d.as_slice(), s.as_slice()))
            .ok_or_else(|| Error::KeyNotFound(format!("no weight block named {name}")))
    }
}

/// Copy the named block into `matrix` after checking the declared shape.
pub fn load_matrix<S: WeightSource>(source: &S, name: &str, matrix: &mut Matrix) -> Result<()> {
    let (data, shape) = source.entry(name)?;
    if shape != [matrix.output_count(), matrix.input_count()] {
        return Err(Error::DimensionMismatch(format!(
            "block {name} declares shape {shape:?}, matrix {} is {}x{}",
            matrix.name(),
            matrix.output_count(),
            matrix.input_count()
        )));
    }
    check_finite(name, data)?;
    matrix.load(data)
}

/// Copy the named block into `vector` after checking the declared shape.
pub fn load_vector<S: WeightSource>(source: &S, name: &str, vector: &mut Vector) -> Result<()> {
    let (data, shape) = source.entry(name)?;
    if shape != [vector.len()] {
        return Err(Error::DimensionMismatch(format!(
            "block {name} declares shape {shape:?}, vector {} has length {}",
            vector.name(),
            vector.len()
        )));
    }
    check_finite(name, data)?;
    vector.load(data)
}

fn check_finite(name: &str, data: &[f32]) -> Result<()> {
    if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidData(format!(
            "block {name} has a non-finite value at index {idx}"
        )));
    }
    Ok(())
}

#[cfg(feature = "serde")]
#[derive(Debug, Serialize, Deserialize)]
struct VectorRecord {
    name: String,
    length: usize,
    array: Vec<f32>,
}

#[cfg(feature = "serde")]
#[derive(Debug, Serialize, Deserialize)]
struct MatrixRecord {
    name: String,
    output_count: usize,
    input_count: usize,
    array: Vec<f32>,
}

#[cfg(feature = "serde")]
#[derive(Debug, Serialize, Deserialize)]
struct LayerRecord {
    name: String,
    input_size: usize,
    output_size: usize,
    activation: String,
    weights: MatrixRecord,
    biases: VectorRecord,
}

#[cfg(feature = "serde")]
#[derive(Debug, Serialize, Deserialize)]
struct NetworkRecord {
    name: String,
    layers: Vec<LayerRecord>,
}

/// Serialize a network's parameters to a JSON string.
#[cfg(feature = "serde")]
pub fn to_json(network: &Network) -> Result<String> {
    let record = NetworkRecord {
        name: network.name().to_owned(),
        layers: network
            .layers()
            .iter()
            .map(|layer| LayerRecord {
                name: layer.name().to_owned(),
                input_size: layer.input_size(),
                output_size: layer.output_size(),
                activation: layer.activation().to_string(),
                weights: MatrixRecord {
                    name: layer.weights().name().to_owned(),
                    output_count: layer.weights().output_count(),
                    input_count: layer.weights().input_count(),
                    array: layer.weights().as_slice().to_vec(),
                },
                biases: VectorRecord {
                    name: layer.biases().name().to_owned(),
                    length: layer.biases().len(),
                    array: layer.biases().as_slice().to_vec(),
                },
            })
            .collect(),
    };
    serde_json::to_string_pretty(&record)
        .map_err(|e| Error::InvalidData(format!("serialization failed: {e}")))
}

/// Rebuild a network from a JSON string produced by [`to_json`].
///
/// `backend` is supplied by the caller; it is execution configuration, not
/// model data. Every declared shape, the layer chain, and the finiteness of
/// every parameter are re-validated.
#[cfg(feature = "serde")]
pub fn from_json(json: &str, backend: Backend) -> Result<Network> {
    let record: NetworkRecord = serde_json::from_str(json)
        .map_err(|e| Error::InvalidData(format!("malformed model JSON: {e}")))?;

    let mut layers = Vec::with_capacity(record.layers.len());
    for lr in &record.layers {
        let activation = parse_activation(&lr.activation)?;

        if lr.weights.output_count != lr.output_size || lr.weights.input_count != lr.input_size {
            return Err(Error::DimensionMismatch(format!(
                "layer {}: weights declare {}x{}, layer declares {}x{}",
                lr.name, lr.weights.output_count, lr.weights.input_count,
                lr.output_size, lr.input_size
            )));
        }
        if lr.weights.array.len() != lr.weights.output_count * lr.weights.input_count {
            return Err(Error::DimensionMismatch(format!(
                "layer {}: weight array has {} values for a {}x{} matrix",
                lr.name,
                lr.weights.array.len(),
                lr.weights.output_count,
                lr.weights.input_count
            )));
        }
        if lr.biases.length != lr.output_size || lr.biases.array.len() != lr.biases.length {
            return Err(Error::DimensionMismatch(format!(
                "layer {}: bias record declares length {} with {} values, layer outputs {}",
                lr.name,
                lr.biases.length,
                lr.biases.array.len(),
                lr.output_size
            )));
        }
        check_finite(&lr.weights.name, &lr.weights.array)?;
        check_finite(&lr.biases.name, &lr.biases.array)?;

        let mut layer = Layer::new(&lr.name, lr.input_size, lr.output_size, activation, backend)?;
        layer.weights_mut().load(&lr.weights.array)?;
        layer.biases_mut().load(&lr.biases.array)?;
        layers.push(layer);
    }
    Network::from_layers(&record.name, layers)
}

/// Write a network to a JSON file.
#[cfg(feature = "serde")]
pub fn save_file(network: &Network, path: &std::path::Path) -> Result<()> {
    let json = to_json(network)?;
    std::fs::write(path, json)
        .map_err(|e| Error::InvalidData(format!("cannot write {}: {e}", path.display())))
}

/// Read a network from a JSON file.
#[cfg(feature = "serde")]
pub fn load_file(path: &std::path::Path, backend: Backend) -> Result<Network> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidData(format!("cannot read {}: {e}", path.display())))?;
    from_json(&json, backend)
}

#[cfg(feature = "serde")]
fn parse_activation(name: &str) -> Result<Activation> {
    match name {
        "sigmoid" => Ok(Activation::Sigmoid),
        "tanh" => Ok(Activation::Tanh),
        "relu" => Ok(Activation::ReLU),
        "identity" => Ok(Activation::Identity),
        other => Err(Error::InvalidData(format!(
            "unknown activation {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "serde")]
    fn sample_network() -> Network {
        crate::network::NetworkBuilder::new("net")
            .seed(21)
            .input(4)
            .layer(6, Activation::Tanh)
            .layer(2, Activation::Sigmoid)
            .build()
            .unwrap()
    }

    #[test]
    fn weight_source_loads_by_name() {
        let mut source = MemoryWeights::new();
        source.insert("w", vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        source.insert("b", vec![0.5, -0.5], vec![2]);

        let mut m = Matrix::zeroed("m", 2, 2).unwrap();
        let mut v = Vector::zeroed("v", 2).unwrap();
        load_matrix(&source, "w", &mut m).unwrap();
        load_vector(&source, "b", &mut v).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.as_slice(), &[0.5, -0.5]);

        assert!(matches!(
            load_matrix(&source, "missing", &mut m),
            Err(Error::KeyNotFound(_))
        ));
    }

    #[test]
    fn weight_source_rejects_shape_disagreement() {
        let mut source = MemoryWeights::new();
        source.insert("w", vec![1.0, 2.0, 3.0, 4.0], vec![4]);
        let mut m = Matrix::zeroed("m", 2, 2).unwrap();
        assert!(matches!(
            load_matrix(&source, "w", &mut m),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn weight_source_rejects_non_finite() {
        let mut source = MemoryWeights::new();
        source.insert("b", vec![1.0, f32::NAN], vec![2]);
        let mut v = Vector::zeroed("v", 2).unwrap();
        assert!(matches!(
            load_vector(&source, "b", &mut v),
            Err(Error::InvalidData(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_everything() {
        let net = sample_network();
        let json = to_json(&net).unwrap();
        let restored = from_json(&json, Backend::Vectorized).unwrap();

        assert_eq!(restored.name(), net.name());
        assert_eq!(restored.layers().len(), net.layers().len());
        for (a, b) in restored.layers().iter().zip(net.layers()) {
            assert_eq!(a.activation(), b.activation());
            assert_eq!(a.weights().as_slice(), b.weights().as_slice());
            assert_eq!(a.biases().as_slice(), b.biases().as_slice());
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_json_is_invalid_data() {
        assert!(matches!(
            from_json("{not json", Backend::Vectorized),
            Err(Error::InvalidData(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn inconsistent_shapes_are_rejected() {
        let net = sample_network();
        let json = to_json(&net).unwrap();
        // Truncating a weight array breaks the declared shape.
        let broken = json.replacen("\"output_count\": 6", "\"output_count\": 4", 1);
        assert!(from_json(&broken, Backend::Vectorized).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn unknown_activation_is_rejected() {
        let net = sample_network();
        let json = to_json(&net).unwrap().replacen("tanh", "softplus", 1);
        assert!(matches!(
            from_json(&json, Backend::Vectorized),
            Err(Error::InvalidData(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn non_finite_parameters_are_rejected() {
        // serde_json cannot represent NaN, so inject a null to prove the
        // parse fails rather than coercing.
        let net = sample_network();
        let json = to_json(&net).unwrap();
        let idx = json.find("\"array\": [").unwrap() + "\"array\": [".len();
        let mut broken = json.clone();
        broken.insert_str(idx, "null,");
        assert!(from_json(&broken, Backend::Vectorized).is_err());
    }
}
