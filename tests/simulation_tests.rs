// tests/simulation_tests.rs

use qmdd::{
    Circuit, CircuitBuilder, Condition, Instruction, QmddError, SimulationConfig, SimulationPhase, Simulator,
};
use std::f64::consts::PI;

const TEST_TOLERANCE: f64 = 1e-9;

fn simulator(num_qubits: usize, shots: usize, seed: u64) -> Result<Simulator, QmddError> {
    Simulator::new(SimulationConfig::new(num_qubits).with_shots(shots).with_seed(seed))
}

#[test]
fn test_empty_circuit_measures_ground_state() -> Result<(), QmddError> {
    let mut sim = simulator(2, 3, 0)?;
    let result = sim.run(&Circuit::new(2))?;
    assert_eq!(result.shots().len(), 3);
    assert!(result.shots().iter().all(|s| s.bits == "00" && s.outcome == 0));
    Ok(())
}

#[test]
fn test_bit_flip() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(3).x(1).build();
    let mut sim = simulator(3, 5, 11)?;
    let result = sim.run(&circuit)?;
    assert_eq!(result.counts().get("010"), Some(&5));
    assert_eq!(result.statistics().gate_count, 1);
    Ok(())
}

#[test]
fn test_bell_pair_only_correlated_outcomes() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
    let mut sim = simulator(2, 1000, 2024)?;
    let result = sim.run(&circuit)?;

    let counts = result.counts();
    let both_zero = counts.get("00").copied().unwrap_or(0);
    let both_one = counts.get("11").copied().unwrap_or(0);
    assert_eq!(both_zero + both_one, 1000, "uncorrelated outcome in {:?}", counts);
    assert!(both_zero > 400 && both_one > 400, "skewed Bell counts {:?}", counts);
    Ok(())
}

#[test]
fn test_bell_pair_with_explicit_measurement() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
    let mut sim = simulator(2, 200, 5)?;
    let result = sim.run(&circuit)?;
    assert!(result.shots().iter().all(|s| s.bits == "00" || s.bits == "11"));
    // Every shot replays both gates.
    assert_eq!(result.statistics().gate_count, 400);
    Ok(())
}

#[test]
fn test_sampling_distribution_band() -> Result<(), QmddError> {
    // ry(2π/3)|0> = cos(π/3)|0> + sin(π/3)|1>: P(1) = 0.75.
    let circuit = CircuitBuilder::new(1).rotation("ry", vec![2.0 * PI / 3.0], 0).build();
    let mut sim = simulator(1, 10_000, 42)?;
    let result = sim.run(&circuit)?;
    let frequency = result.frequency("1");
    assert!((0.73..=0.77).contains(&frequency), "P(1) sampled as {}", frequency);
    Ok(())
}

#[test]
fn test_sampling_distribution_band_with_mid_circuit_measurement() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(1)
        .rotation("ry", vec![2.0 * PI / 3.0], 0)
        .measure(vec![0])
        .build();
    let mut sim = simulator(1, 10_000, 43)?;
    let frequency = sim.run(&circuit)?.frequency("1");
    assert!((0.73..=0.77).contains(&frequency), "P(1) sampled as {}", frequency);
    Ok(())
}

#[test]
fn test_same_seed_same_outcomes() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(3)
        .h(0)
        .h(1)
        .rotation("rx", vec![0.3], 2)
        .cx(1, 2)
        .measure_all()
        .build();
    let first = simulator(3, 64, 99)?.run(&circuit)?;
    let second = simulator(3, 64, 99)?.run(&circuit)?;
    assert_eq!(first.shots(), second.shots());
    Ok(())
}

#[test]
fn test_repeated_runs_give_identical_amplitudes() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(3)
        .h(0)
        .rotation("rx", vec![0.3], 1)
        .cx(0, 2)
        .build();
    let run = || -> Result<_, QmddError> {
        let config = SimulationConfig::new(3).with_seed(5).with_statevector(true);
        Simulator::new(config)?.run(&circuit)
    };
    let first = run()?;
    let second = run()?;
    assert!(first.shots()[0].amplitudes.is_some());
    assert_eq!(first.shots()[0].amplitudes, second.shots()[0].amplitudes);
    Ok(())
}

#[test]
fn test_repeated_condition_bits_are_rejected() -> Result<(), QmddError> {
    let instructions = [
        Instruction::single("x", 0),
        Instruction::measure(vec![0]),
        Instruction::single("x", 1).with_condition(Condition::new(vec![0; 70], 0)),
    ];
    let mut sim = simulator(2, 1, 0)?;
    let err = sim.run_instructions(&instructions).unwrap_err();
    assert!(matches!(err, QmddError::MalformedInstruction { position: 2, .. }), "got {:?}", err);
    assert_eq!(sim.phase(), SimulationPhase::Failed);
    Ok(())
}

#[test]
fn test_teleportation_with_classical_conditions() -> Result<(), QmddError> {
    let theta = 1.1;
    let circuit = CircuitBuilder::new(3)
        .rotation("ry", vec![theta], 0)
        .h(1)
        .cx(1, 2)
        .cx(0, 1)
        .h(0)
        .measure(vec![0, 1])
        .add(Instruction::single("x", 2).with_condition(Condition::new(vec![1], 1)))
        .add(Instruction::single("z", 2).with_condition(Condition::new(vec![0], 1)))
        .build();

    let config = SimulationConfig::new(3).with_shots(16).with_seed(8).with_probabilities(true);
    let mut sim = Simulator::new(config)?;
    let result = sim.run(&circuit)?;

    let expected_one = (theta / 2.0).sin().powi(2);
    for shot in result.shots() {
        let probabilities = shot.probabilities.as_ref().ok_or(QmddError::InvalidConfiguration {
            message: "missing probability snapshot".to_string(),
        })?;
        let q2_one: f64 = probabilities.iter().enumerate().filter(|(i, _)| i & 0b100 != 0).map(|(_, p)| p).sum();
        assert!(
            (q2_one - expected_one).abs() < TEST_TOLERANCE,
            "teleported P(1) = {}, expected {}",
            q2_one,
            expected_one
        );
        // q2 is never measured, so its classical bit stays 0.
        assert_eq!(shot.bits.chars().next(), Some('0'));
    }
    Ok(())
}

#[test]
fn test_invalid_qubit_reports_position_and_keeps_statistics() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).x(5).h(1).build();
    let mut sim = simulator(2, 1, 0)?;
    let err = sim.run(&circuit).unwrap_err();

    assert_eq!(err, QmddError::InvalidQubitIndex { position: 2, qubit: 5, num_qubits: 2 });
    assert_eq!(sim.phase(), SimulationPhase::Failed);
    assert_eq!(sim.statistics().gate_count, 2);
    assert!(sim.statistics().max_active_nodes > 0);
    Ok(())
}

#[test]
fn test_unknown_gate_and_bad_arity() -> Result<(), QmddError> {
    let mut sim = simulator(1, 1, 0)?;

    let unknown = CircuitBuilder::new(1).h(0).gate("warp", 0).build();
    let err = sim.run(&unknown).unwrap_err();
    assert_eq!(err, QmddError::UnknownGate { position: 1, gate: "warp".to_string() });

    let missing_angle = CircuitBuilder::new(1).gate("rx", 0).build();
    let err = sim.run(&missing_angle).unwrap_err();
    assert!(matches!(err, QmddError::MalformedInstruction { position: 0, .. }));
    Ok(())
}

#[test]
fn test_ghz_stays_compact() -> Result<(), QmddError> {
    let n = 24;
    let mut builder = CircuitBuilder::new(n).h(0);
    for q in 1..n {
        builder = builder.cx(q - 1, q);
    }
    let mut sim = simulator(n, 50, 17)?;
    let result = sim.run(&builder.build())?;

    let zeros = "0".repeat(n);
    let ones = "1".repeat(n);
    assert!(result.shots().iter().all(|s| s.bits == zeros || s.bits == ones));
    assert!(
        result.statistics().max_active_nodes <= 2 * n,
        "peak nodes {}",
        result.statistics().max_active_nodes
    );
    assert!(result.statistics().max_norm_drift < 1e-9);
    Ok(())
}

#[test]
fn test_statevector_snapshot_is_normalized() -> Result<(), QmddError> {
    let circuit = CircuitBuilder::new(3)
        .h(0)
        .rotation("u3", vec![0.4, 1.2, -0.7], 1)
        .add(Instruction::controlled("crz", vec![0], 2).with_params(vec![0.9]))
        .add(Instruction::new("swap", vec![1, 2]))
        .build();
    let config = SimulationConfig::new(3).with_seed(1).with_statevector(true);
    let result = Simulator::new(config)?.run(&circuit)?;
    let amplitudes = result.shots()[0].amplitudes.as_ref().ok_or(QmddError::InvalidConfiguration {
        message: "missing statevector".to_string(),
    })?;
    qmdd::check_normalization(amplitudes, Some(TEST_TOLERANCE))?;
    Ok(())
}
