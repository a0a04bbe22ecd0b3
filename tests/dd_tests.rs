// tests/dd_tests.rs

use proptest::prelude::*;
use qmdd::dd::{Edge, Matrix2};
use qmdd::{Gate, Package, QmddError};

const EPS: f64 = 1e-13;
const TEST_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Step {
    gate: Gate,
    target: usize,
    control: Option<usize>,
}

fn matrix(gate: Gate) -> Result<Matrix2, QmddError> {
    gate.matrix().ok_or(QmddError::InvalidConfiguration {
        message: format!("{} has no matrix", gate),
    })
}

/// Applies one step, keeping exactly one registered root.
fn apply_step(dd: &mut Package, state: Edge, step: &Step, n: usize) -> Result<Edge, QmddError> {
    let controls: Vec<usize> = step.control.into_iter().collect();
    let gate = dd.gate_diagram(&matrix(step.gate)?, step.target, &controls, n);
    let next = dd.apply(gate, state);
    let next = dd.normalize(next);
    dd.inc_ref(next);
    dd.dec_ref(state);
    dd.collect_unreferenced();
    Ok(next)
}

fn evolve(dd: &mut Package, steps: &[Step], n: usize) -> Result<Edge, QmddError> {
    let mut state = dd.basis_state(n);
    dd.inc_ref(state);
    for step in steps {
        state = apply_step(dd, state, step, n)?;
    }
    Ok(state)
}

fn ghz_steps(n: usize) -> Vec<Step> {
    let mut steps = vec![Step { gate: Gate::H, target: 0, control: None }];
    steps.extend((1..n).map(|q| Step { gate: Gate::X, target: q, control: Some(q - 1) }));
    steps
}

#[test]
fn test_ghz_node_count_is_linear() -> Result<(), QmddError> {
    let n = 12;
    let mut dd = Package::new(EPS)?;
    let state = evolve(&mut dd, &ghz_steps(n), n)?;
    // Root plus an all-zero and an all-one chain below it.
    assert_eq!(dd.active_nodes(), 2 * n - 1);
    assert!((dd.probability(state, 0) - 0.5).abs() < TEST_TOLERANCE);
    assert!((dd.probability(state, (1 << n) - 1) - 0.5).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn test_equal_states_share_their_root() -> Result<(), QmddError> {
    let n = 3;
    let mut dd = Package::new(EPS)?;
    let forward = [
        Step { gate: Gate::H, target: 0, control: None },
        Step { gate: Gate::H, target: 2, control: None },
    ];
    let backward = [forward[1], forward[0]];
    let a = evolve(&mut dd, &forward, n)?;
    let b = evolve(&mut dd, &backward, n)?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn test_garbage_collection_returns_to_baseline() -> Result<(), QmddError> {
    let n = 6;
    let mut dd = Package::new(EPS)?;
    let baseline = dd.active_nodes();
    let steps = ghz_steps(n);

    let state = evolve(&mut dd, &steps, n)?;
    assert!(dd.active_nodes() > baseline);
    let handles = dd.complex_count();
    dd.dec_ref(state);
    assert_eq!(dd.active_nodes(), baseline);

    // Recomputing the same diagram reuses every stored complex value.
    let again = evolve(&mut dd, &steps, n)?;
    assert_eq!(dd.complex_count(), handles);
    dd.dec_ref(again);
    assert_eq!(dd.active_nodes(), baseline);
    Ok(())
}

#[test]
fn test_collapse_renormalizes() -> Result<(), QmddError> {
    let n = 2;
    let mut dd = Package::new(EPS)?;
    let state = evolve(&mut dd, &ghz_steps(n), n)?;
    let collapsed = dd.collapse(state, 1, true, n);
    assert!((dd.norm_sqr(collapsed) - 1.0).abs() < TEST_TOLERANCE);
    assert!((dd.probability(collapsed, 0b11) - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

fn step_strategy(n: usize) -> impl Strategy<Value = Step> {
    (0usize..8, 0..n, 0..n, -3.2f64..3.2).prop_map(move |(kind, target, control, angle)| {
        let gate = match kind {
            0 => Gate::H,
            1 => Gate::X,
            2 => Gate::T,
            3 => Gate::S,
            4 => Gate::Ry(angle),
            5 => Gate::Rz(angle),
            6 => Gate::U3(angle, angle / 2.0, -angle),
            _ => Gate::Sx,
        };
        let control = (control != target).then_some(control);
        Step { gate, target, control }
    })
}

fn to_case(err: QmddError) -> TestCaseError {
    TestCaseError::fail(err.to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn probability_is_conserved(steps in prop::collection::vec(step_strategy(4), 1..30)) {
        let n = 4;
        let mut dd = Package::new(EPS).map_err(to_case)?;
        let state = evolve(&mut dd, &steps, n).map_err(to_case)?;
        let total: f64 = dd.probabilities(state, n).map_err(to_case)?.iter().sum();
        prop_assert!((total - 1.0).abs() < TEST_TOLERANCE, "total probability {}", total);
        for qubit in 0..n {
            let p1 = dd.probability_of_one(state, qubit);
            prop_assert!((0.0..=1.0).contains(&p1));
        }
    }

    #[test]
    fn gates_followed_by_inverses_restore_the_input(steps in prop::collection::vec(step_strategy(4), 1..20)) {
        let n = 4;
        let mut dd = Package::new(EPS).map_err(to_case)?;
        let mut undo: Vec<Step> = Vec::new();
        for step in steps.iter().rev() {
            let inverse = step.gate.inverse().ok_or_else(|| TestCaseError::fail("no inverse"))?;
            undo.push(Step { gate: inverse, ..*step });
        }
        let all: Vec<Step> = steps.iter().chain(undo.iter()).copied().collect();
        let state = evolve(&mut dd, &all, n).map_err(to_case)?;
        prop_assert!((dd.probability(state, 0) - 1.0).abs() < TEST_TOLERANCE);
        // Back to a basis chain: one node per level.
        prop_assert_eq!(dd.active_nodes(), n);
    }
}
