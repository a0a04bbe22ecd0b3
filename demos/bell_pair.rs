//! Prepares a Bell pair, prints the circuit, the final amplitudes and the
//! sampled counts.
//!
//! Run with `RUST_LOG=qmdd=debug cargo run --example bell_pair` to see the
//! engine's per-shot logging.

use qmdd::{CircuitBuilder, QmddError, SimulationConfig, Simulator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), QmddError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
    println!("{}", circuit);

    let config = SimulationConfig::new(2)
        .with_shots(1024)
        .with_seed(2024)
        .with_statevector(true)
        .with_probabilities(true);
    let mut simulator = Simulator::new(config)?;
    let result = simulator.run(&circuit)?;
    println!("{}", result);

    let counts = result.counts();
    tracing::info!(?counts, "Bell pair sampled");
    Ok(())
}
