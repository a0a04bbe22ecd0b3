//! Samples a GHZ state over many qubits. The dense state vector would hold
//! 2^n amplitudes; the decision diagram needs about 2n nodes.

use qmdd::{CircuitBuilder, QmddError, SimulationConfig, Simulator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const QUBITS: usize = 48;
const SHOTS: usize = 2000;

fn main() -> Result<(), QmddError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut builder = CircuitBuilder::new(QUBITS).h(0);
    for q in 1..QUBITS {
        builder = builder.cx(q - 1, q);
    }
    let circuit = builder.build();

    let mut simulator = Simulator::new(SimulationConfig::new(QUBITS).with_shots(SHOTS).with_seed(7))?;
    let result = simulator.run(&circuit)?;

    println!("GHZ state over {} qubits, {} shots", QUBITS, SHOTS);
    for (bits, count) in result.counts() {
        println!("  {}: {}", bits, count);
    }
    println!("{}", result.statistics());
    Ok(())
}
