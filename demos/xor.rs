use magnetite_nn::{
    Activation, InMemorySampleSource, NetParameters, Rate, Sample, Trainer, TrainingParameters,
};

fn main() -> magnetite_nn::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Two inputs, two one-hot outputs: [1, 0] for "false", [0, 1] for "true".
    let samples = vec![
        Sample::from_values(&[0.0, 0.0], &[1.0, 0.0])?,
        Sample::from_values(&[0.0, 1.0], &[0.0, 1.0])?,
        Sample::from_values(&[1.0, 0.0], &[0.0, 1.0])?,
        Sample::from_values(&[1.0, 1.0], &[1.0, 0.0])?,
    ];
    let source = InMemorySampleSource::new(samples.clone(), samples);

    let net_parameters =
        NetParameters::uniform(vec![2, 4, 2], Activation::Logistic { scale: 1.0 })?;
    let training_parameters = TrainingParameters::new(Rate::constant(1.0)?, 5000, 1, 0.01)?;

    let trainer = Trainer::new(net_parameters, training_parameters, source).with_name("xor");
    let result = trainer.learn()?;
    println!("{result}");

    for (input, label) in [
        ([0.0, 0.0], "false"),
        ([0.0, 1.0], "true"),
        ([1.0, 0.0], "true"),
        ([1.0, 1.0], "false"),
    ] {
        let output = result
            .best_net
            .forward(&magnetite_nn::Matrix::row(input.to_vec())?)?;
        println!(
            "{input:?} (expected {label}) -> [{:.3}, {:.3}]",
            output.get(0, 0),
            output.get(0, 1)
        );
    }
    Ok(())
}
