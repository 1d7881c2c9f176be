use std::sync::Arc;

use magnetite_nn::{
    Activation, ExperimentParameters, Experimenter, InMemorySampleSource, NetParameters, Rate,
    Sample, TrainingParameters,
};

fn main() -> magnetite_nn::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let samples = vec![
        Sample::from_values(&[0.0, 0.0], &[1.0, 0.0])?,
        Sample::from_values(&[0.0, 1.0], &[0.0, 1.0])?,
        Sample::from_values(&[1.0, 0.0], &[0.0, 1.0])?,
        Sample::from_values(&[1.0, 1.0], &[1.0, 0.0])?,
    ];
    let source = Arc::new(InMemorySampleSource::new(samples.clone(), samples));

    // The same architecture under three learning-rate schedules.
    let net_parameters =
        NetParameters::uniform(vec![2, 4, 2], Activation::Logistic { scale: 1.0 })?;
    let rates = [
        Rate::constant(1.0)?,
        Rate::linear(2.0)?,
        Rate::exponent(1.5, 0.001)?,
    ];
    let parameters = rates
        .into_iter()
        .map(|rate| {
            Ok(ExperimentParameters::new(
                net_parameters.clone(),
                TrainingParameters::new(rate, 2000, 1, 0.01)?,
            ))
        })
        .collect::<magnetite_nn::Result<Vec<_>>>()?;

    let pool = Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .map_err(|e| magnetite_nn::Error::InvalidConfig(e.to_string()))?,
    );
    let result = Experimenter::new(parameters, source).with_pool(pool).run();

    println!("sweep finished in {:.1?}", result.duration);
    for (parameters, outcome) in &result.experiences {
        let rate = parameters.training_parameters().rate();
        match outcome {
            Ok(outcome) => println!(
                "rate {rate}: stopped after {} epoch(s) because {} (best error {:.4})",
                outcome.epoch_count,
                outcome.stop_reason,
                outcome.min_testing_error()
            ),
            Err(error) => println!("rate {rate}: failed: {error}"),
        }
    }
    Ok(())
}
