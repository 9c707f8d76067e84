//! Save a trained model to JSON, reload it, and verify the predictions.
//!
//! Run with: `cargo run --example save_load`

use ffnet::{model_io, Activation, Backend, Dataset, NetworkBuilder, TrainConfig, Trainer, Vector};

fn main() -> ffnet::Result<()> {
    let data = Dataset::from_rows(&[
        (vec![0.0, 0.0], vec![0.0, 1.0]),
        (vec![0.0, 1.0], vec![1.0, 0.0]),
        (vec![1.0, 0.0], vec![1.0, 0.0]),
        (vec![1.0, 1.0], vec![0.0, 1.0]),
    ])?;

    let mut network = NetworkBuilder::new("xor")
        .seed(11)
        .input(2)
        .layer(8, Activation::Tanh)
        .layer(2, Activation::Sigmoid)
        .build()?;

    let trainer = Trainer::new(TrainConfig {
        epochs: 400,
        learning_rate: 0.8,
        mini_batch_size: 4,
    })?;
    let report = trainer.train(&mut network, &data)?;
    println!("trained to mse {:.6}", report.final_mse());

    let mut path = std::env::temp_dir();
    path.push("ffnet-xor-model.json");
    model_io::save_file(&network, &path)?;
    println!("saved to {}", path.display());

    let mut restored = model_io::load_file(&path, Backend::Vectorized)?;
    std::fs::remove_file(&path).ok();

    let probe = Vector::from_slice("probe", &[1.0, 0.0])?;
    let original = network.forward(&probe)?.as_slice().to_vec();
    let reloaded = restored.forward(&probe)?.as_slice().to_vec();
    println!("original  {original:?}");
    println!("restored  {reloaded:?}");
    assert_eq!(original, reloaded);
    println!("round trip ok");
    Ok(())
}
