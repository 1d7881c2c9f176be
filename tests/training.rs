use magnetite_nn::{
    Activation, InMemorySampleSource, Net, NetParameters, Rate, Sample, StopReason, Trainer,
    TrainingParameters,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn xor_samples() -> Vec<Sample> {
    vec![
        Sample::from_values(&[0.0, 0.0], &[1.0, 0.0]).unwrap(),
        Sample::from_values(&[0.0, 1.0], &[0.0, 1.0]).unwrap(),
        Sample::from_values(&[1.0, 0.0], &[0.0, 1.0]).unwrap(),
        Sample::from_values(&[1.0, 1.0], &[1.0, 0.0]).unwrap(),
    ]
}

fn held_out_error(net: &Net, samples: &[Sample]) -> f64 {
    let total: f64 = samples
        .iter()
        .map(|sample| {
            let output = net.forward(sample.source()).unwrap();
            sample.target().sub(&output).unwrap().sum_of_squares() / 2.0
        })
        .sum();
    total / samples.len() as f64
}

#[test]
fn xor_end_to_end() {
    let samples = xor_samples();
    let source = InMemorySampleSource::new(samples.clone(), samples.clone());

    let net_parameters =
        NetParameters::uniform(vec![2, 4, 2], Activation::Logistic { scale: 1.0 }).unwrap();
    let training_parameters =
        TrainingParameters::new(Rate::constant(1.0).unwrap(), 5000, 1, 0.01).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let net = net_parameters.create_net_with_rng(&mut rng).unwrap();
    let trainer = Trainer::new(net_parameters, training_parameters, source).with_name("xor-test");
    let result = trainer.learn_net(net).unwrap();

    assert!(
        matches!(
            result.stop_reason,
            StopReason::MinError | StopReason::MaxEpoch
        ),
        "unexpected stop reason: {:?}",
        result.stop_reason
    );
    assert!(result.epoch_count >= 1);
    assert_eq!(result.testing_errors.len(), result.epoch_count + 1);
    assert_eq!(result.testing_accuracies.len(), result.epoch_count + 1);
    assert!(!result.training_errors.is_empty());

    // The snapshot is the best net the run ever saw on the held-out set.
    let best_error = held_out_error(&result.best_net, &samples);
    for &recorded in &result.testing_errors {
        assert!(
            best_error <= recorded + 1e-9,
            "best net error {best_error} exceeds a recorded error {recorded}"
        );
    }

    if result.stop_reason == StopReason::MinError {
        assert!(result.testing_errors.last().unwrap() < &0.01);
    }
}

#[test]
fn training_beats_the_initial_net() {
    let samples = xor_samples();
    let source = InMemorySampleSource::new(samples.clone(), samples.clone());

    let net_parameters =
        NetParameters::uniform(vec![2, 4, 2], Activation::Tanh { scale: 1.0 }).unwrap();
    let training_parameters =
        TrainingParameters::new(Rate::constant(0.2).unwrap(), 200, 2, 1e-6).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let net = net_parameters.create_net_with_rng(&mut rng).unwrap();
    let initial_error = held_out_error(&net, &samples);

    let trainer = Trainer::new(net_parameters, training_parameters, source);
    let result = trainer.learn_net(net).unwrap();

    let trained_error = held_out_error(&result.best_net, &samples);
    assert!(
        trained_error < initial_error,
        "training did not improve the held-out error: {initial_error} -> {trained_error}"
    );
}

#[test]
fn net_json_round_trip() {
    let parameters =
        NetParameters::uniform(vec![3, 5, 2], Activation::Atan { scale: 0.5 }).unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    let net = parameters.create_net_with_rng(&mut rng).unwrap();

    let dir = std::env::temp_dir().join("magnetite-nn-tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("net.json");
    net.save_json(path.to_str().unwrap()).unwrap();

    let restored = Net::load_json(path.to_str().unwrap()).unwrap();
    assert_eq!(restored, net);
    assert_eq!(restored.layer_sizes(), vec![3, 5, 2]);
}
