use rationality::mdp::gridworld::GridWorldMdp;
use rationality::value_iter::{backward_value_iter, forward_value_iter, shortest_path};
use rationality::{Error, Mdp};

const NI: f64 = f64::NEG_INFINITY;

fn grid(rows: usize, cols: usize, overrides: &[((usize, usize), f64)], default: f64) -> GridWorldMdp {
    GridWorldMdp::new(rows, cols, overrides.iter().copied().collect(), default).unwrap()
}

fn assert_values_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        if e == NI {
            assert_eq!(a, NI, "state {i}: expected unreachable, got {a}");
        } else {
            assert!((a - e).abs() < tol, "state {i}: {a} vs {e}");
        }
    }
}

#[test]
fn backward_zero_iterations_returns_the_initial_vector() {
    let g = grid(3, 1, &[((0, 0), -1.0), ((1, 0), 3.0)], 0.0);
    for goal in 0..3 {
        let v = backward_value_iter(&g, goal, 1.0, Some(0)).unwrap();
        let mut expected = vec![NI; 3];
        expected[goal] = 0.0;
        assert_values_close(&v, &expected, 1e-12);
    }
}

#[test]
fn backward_spreads_reachability_without_rewards() {
    let g = grid(3, 1, &[], 0.0);

    let v = backward_value_iter(&g, 0, 1.0, Some(1)).unwrap();
    assert_values_close(&v, &[0.0, 0.0, NI], 1e-12);
    let v = backward_value_iter(&g, 1, 1.0, Some(1)).unwrap();
    assert_values_close(&v, &[0.0, 0.0, 0.0], 1e-12);
    let v = backward_value_iter(&g, 2, 1.0, Some(1)).unwrap();
    assert_values_close(&v, &[NI, 0.0, 0.0], 1e-12);

    for goal in 0..3 {
        let v = backward_value_iter(&g, goal, 1.0, Some(2)).unwrap();
        assert_values_close(&v, &[0.0, 0.0, 0.0], 1e-12);
    }

    // With zero rewards the middle state accumulates path multiplicity.
    let v = backward_value_iter(&g, 0, 1.0, Some(3)).unwrap();
    assert_values_close(&v, &[0.0, 2.0f64.ln(), 0.0], 1e-12);
    let v = backward_value_iter(&g, 1, 1.0, Some(3)).unwrap();
    assert_values_close(&v, &[0.0, 0.0, 0.0], 1e-12);
    let v = backward_value_iter(&g, 2, 1.0, Some(3)).unwrap();
    assert_values_close(&v, &[0.0, 2.0f64.ln(), 0.0], 1e-12);
}

#[test]
fn backward_iterates_the_corridor_ladder() {
    let g = grid(3, 1, &[((2, 0), -10.0)], -1.0);

    let v = backward_value_iter(&g, 0, 1.0, Some(0)).unwrap();
    assert_values_close(&v, &[0.0, NI, NI], 1e-12);
    let v = backward_value_iter(&g, 0, 1.0, Some(1)).unwrap();
    assert_values_close(&v, &[0.0, -1.0, NI], 1e-12);
    let v = backward_value_iter(&g, 0, 1.0, Some(2)).unwrap();
    assert_values_close(&v, &[0.0, -1.0, -11.0], 1e-12);
    let v = backward_value_iter(&g, 0, 1.0, Some(3)).unwrap();
    let middle = ((-1.0f64).exp() + (-12.0f64).exp()).ln();
    assert_values_close(&v, &[0.0, middle, -11.0], 1e-12);
}

#[test]
fn forward_and_backward_values_agree() {
    let g = grid(3, 3, &[((2, 0), -30.0), ((1, 1), -40.0)], -10.0);
    let backward = backward_value_iter(&g, 0, 1.0, None).unwrap();
    for s in 0..g.num_states() {
        let forward = forward_value_iter(&g, s, 1.0, None).unwrap();
        assert!(
            (forward[0] - backward[s]).abs() < 1e-6,
            "state {s}: forward {} vs backward {}",
            forward[0],
            backward[s]
        );
    }
}

#[test]
fn shortest_path_on_a_corridor() {
    let g = grid(3, 1, &[((2, 0), -9.0)], -1.0);
    assert_values_close(&shortest_path(&g, 0).unwrap(), &[0.0, -1.0, -10.0], 1e-12);
    assert_values_close(&shortest_path(&g, 1).unwrap(), &[-1.0, 0.0, -9.0], 1e-12);
    assert_values_close(&shortest_path(&g, 2).unwrap(), &[-2.0, -1.0, 0.0], 1e-12);
}

#[test]
fn shortest_path_routes_around_expensive_cells() {
    let g = grid(3, 3, &[((2, 0), -3.0), ((1, 1), -4.0)], -1.0);
    let dest = g.coor_to_state(2, 2).unwrap();
    let expected = [
        -3.0, -2.0, -2.0, //
        -2.0, -4.0, -1.0, //
        -4.0, -1.0, 0.0,
    ];
    assert_values_close(&shortest_path(&g, dest).unwrap(), &expected, 1e-12);
}

#[test]
fn shortest_path_rejects_positive_rewards() {
    let g = grid(3, 1, &[((1, 0), 3.0)], -1.0);
    assert!(matches!(
        shortest_path(&g, 0),
        Err(Error::PositiveReward { state: 1, .. })
    ));
}

#[test]
fn low_beta_values_approach_the_shortest_path() {
    let g = grid(3, 3, &[((2, 0), -3.0), ((1, 1), -4.0)], -1.0);
    let dest = g.coor_to_state(2, 2).unwrap();
    let exact = shortest_path(&g, dest).unwrap();

    let beta = 0.02;
    let soft = backward_value_iter(&g, dest, beta, None).unwrap();
    for s in 0..g.num_states() {
        let rescaled = beta * soft[s];
        assert!(
            (rescaled - exact[s]).abs() < 0.05,
            "state {s}: {rescaled} vs {}",
            exact[s]
        );
    }
}

#[test]
fn high_beta_values_stay_finite() {
    let g = grid(3, 3, &[], -1.0);
    let v = backward_value_iter(&g, 0, 15.0, Some(50)).unwrap();
    for (s, &value) in v.iter().enumerate() {
        assert!(value.is_finite(), "state {s} overflowed: {value}");
    }
}

#[test]
fn backward_rejects_bad_arguments() {
    let g = grid(3, 1, &[], -1.0);
    assert!(matches!(
        backward_value_iter(&g, 3, 1.0, None),
        Err(Error::StateOutOfBounds { state: 3, .. })
    ));
    assert!(matches!(
        backward_value_iter(&g, 0, 0.0, None),
        Err(Error::InvalidBeta { .. })
    ));
    assert!(matches!(
        backward_value_iter(&g, 0, f64::NAN, None),
        Err(Error::InvalidBeta { .. })
    ));
}
