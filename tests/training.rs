use ffnet::{
    Activation, Backend, Dataset, NetworkBuilder, TrainConfig, Trainer, Vector,
};

fn xor_data() -> Dataset {
    Dataset::from_rows(&[
        (vec![0.0, 0.0], vec![0.0, 1.0]),
        (vec![0.0, 1.0], vec![1.0, 0.0]),
        (vec![1.0, 0.0], vec![1.0, 0.0]),
        (vec![1.0, 1.0], vec![0.0, 1.0]),
    ])
    .unwrap()
}

fn xor_network(backend: Backend) -> ffnet::Network {
    NetworkBuilder::new("xor")
        .backend(backend)
        .seed(11)
        .input(2)
        .layer(8, Activation::Tanh)
        .layer(2, Activation::Sigmoid)
        .build()
        .unwrap()
}

#[test]
fn xor_converges_on_the_vectorized_backend() {
    let mut net = xor_network(Backend::Vectorized);
    let trainer = Trainer::new(TrainConfig {
        epochs: 600,
        learning_rate: 0.8,
        mini_batch_size: 4,
    })
    .unwrap();
    let report = trainer.train(&mut net, &xor_data()).unwrap();
    assert!(report.final_mse() < 0.02, "mse {}", report.final_mse());

    // Every sample classifies correctly after training.
    let data = xor_data();
    let acc = ffnet::metrics::accuracy(
        &mut net,
        (0..4).map(|i| {
            let (x, e) = ffnet::data::TrainingData::sample(&data, i).unwrap();
            (x, e)
        }),
    )
    .unwrap();
    assert_eq!(acc, 1.0);
}

#[test]
fn xor_converges_on_the_blas_backend() {
    let mut net = xor_network(Backend::Blas);
    let trainer = Trainer::new(TrainConfig {
        epochs: 600,
        learning_rate: 0.8,
        mini_batch_size: 4,
    })
    .unwrap();
    let report = trainer.train(&mut net, &xor_data()).unwrap();
    assert!(report.final_mse() < 0.02, "mse {}", report.final_mse());
}

#[test]
fn backends_agree_after_identical_training() {
    // Same seed, same data, same schedule on both execution paths. The
    // trajectories may diverge in the last bits, so compare with tolerance.
    let trainer = Trainer::new(TrainConfig {
        epochs: 50,
        learning_rate: 0.5,
        mini_batch_size: 2,
    })
    .unwrap();

    let mut a = xor_network(Backend::Vectorized);
    let mut b = xor_network(Backend::Blas);
    trainer.train(&mut a, &xor_data()).unwrap();
    trainer.train(&mut b, &xor_data()).unwrap();

    let probe = Vector::from_slice("probe", &[1.0, 0.0]).unwrap();
    let out_a = a.forward(&probe).unwrap().as_slice().to_vec();
    let out_b = b.forward(&probe).unwrap().as_slice().to_vec();
    for (x, y) in out_a.iter().zip(&out_b) {
        assert!((x - y).abs() < 1e-3, "{x} vs {y}");
    }
}

#[test]
fn gradient_accumulators_are_empty_after_every_epoch() {
    // Dataset length 3 with batch size 2 forces a trailing partial flush.
    let data = Dataset::from_rows(&[
        (vec![0.0, 0.0], vec![0.0, 1.0]),
        (vec![0.0, 1.0], vec![1.0, 0.0]),
        (vec![1.0, 0.0], vec![1.0, 0.0]),
    ])
    .unwrap();
    let mut net = xor_network(Backend::Vectorized);
    let trainer = Trainer::new(TrainConfig {
        epochs: 3,
        learning_rate: 0.1,
        mini_batch_size: 2,
    })
    .unwrap();
    trainer.train(&mut net, &data).unwrap();

    for layer in net.layers() {
        assert!(layer.weight_gradient().as_slice().iter().all(|&g| g == 0.0));
        assert!(layer.bias_gradient().as_slice().iter().all(|&g| g == 0.0));
    }
}

#[test]
fn training_changes_parameters_only_at_flush_boundaries() {
    let mut net = xor_network(Backend::Vectorized);

    // Manual forward/backward without a flush leaves the weights untouched.
    let before: Vec<f32> = net.layers()[0].weights().as_slice().to_vec();
    let input = Vector::from_slice("x", &[0.0, 1.0]).unwrap();
    let expected = Vector::from_slice("e", &[1.0, 0.0]).unwrap();
    net.forward(&input).unwrap();
    net.backward(&expected).unwrap();
    assert_eq!(net.layers()[0].weights().as_slice(), &before[..]);

    // A flush moves them.
    net.apply_gradients(0.5, 1).unwrap();
    assert_ne!(net.layers()[0].weights().as_slice(), &before[..]);
}

#[test]
fn shuffled_dataset_still_converges() {
    let mut data = xor_data();
    data.shuffle(17);
    let mut net = xor_network(Backend::Vectorized);
    let trainer = Trainer::new(TrainConfig {
        epochs: 600,
        learning_rate: 0.8,
        mini_batch_size: 2,
    })
    .unwrap();
    let report = trainer.train(&mut net, &data).unwrap();
    assert!(report.final_mse() < 0.05, "mse {}", report.final_mse());
}
