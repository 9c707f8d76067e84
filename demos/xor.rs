//! Train a small network on XOR and print the per-epoch loss curve.
//!
//! Run with: `cargo run --example xor`

use ffnet::{Activation, Backend, Dataset, NetworkBuilder, TrainConfig, Trainer, Vector};

fn main() -> ffnet::Result<()> {
    let data = Dataset::from_rows(&[
        (vec![0.0, 0.0], vec![0.0, 1.0]),
        (vec![0.0, 1.0], vec![1.0, 0.0]),
        (vec![1.0, 0.0], vec![1.0, 0.0]),
        (vec![1.0, 1.0], vec![0.0, 1.0]),
    ])?;

    let mut network = NetworkBuilder::new("xor")
        .backend(Backend::Vectorized)
        .seed(11)
        .input(2)
        .layer(8, Activation::Tanh)
        .layer(2, Activation::Sigmoid)
        .build()?;

    let trainer = Trainer::new(TrainConfig {
        epochs: 600,
        learning_rate: 0.8,
        mini_batch_size: 4,
    })?;
    let report = trainer.train(&mut network, &data)?;

    for epoch in report.epochs.iter().step_by(100) {
        println!("epoch {:>4}  mse {:.6}", epoch.epoch, epoch.mse);
    }
    println!("final mse {:.6}", report.final_mse());

    let mut probe = Vector::zeroed("probe", 2)?;
    for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
        probe.load(&[a, b])?;
        let out = network.forward(&probe)?;
        println!(
            "{a} xor {b} -> [{:.3}, {:.3}]",
            out.get(0)?,
            out.get(1)?
        );
    }
    Ok(())
}
