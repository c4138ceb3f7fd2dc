//! Property tests over randomly placed waypoint sets.

use proptest::prelude::*;
use u_waypath::distance::compute_cost_matrix;
use u_waypath::sa::AnnealingConfig;
use u_waypath::{Algorithm, OptimizeConfig, Optimizer, RouteKind, Waypoint};

/// Distinct integer grid points, so no two waypoints are duplicates.
fn waypoint_sets() -> impl Strategy<Value = Vec<Waypoint>> {
    prop::collection::hash_set((-50i32..50, -50i32..50, 0i32..20), 2..9).prop_map(|points| {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_unstable();
        points
            .into_iter()
            .enumerate()
            .map(|(id, (x, y, z))| Waypoint::new(id, x as f64, y as f64, z as f64))
            .collect()
    })
}

fn route_kinds() -> impl Strategy<Value = RouteKind> {
    prop_oneof![Just(RouteKind::Open), Just(RouteKind::Closed)]
}

fn config(kind: RouteKind, seed: u64) -> OptimizeConfig {
    OptimizeConfig::default()
        .with_route_kind(kind)
        .with_annealing(AnnealingConfig::default().with_max_iterations(2_000))
        .with_seed(seed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_route_is_a_permutation_with_consistent_cost(
        wps in waypoint_sets(),
        kind in route_kinds(),
        seed in any::<u64>(),
    ) {
        let n = wps.len();
        let matrix = compute_cost_matrix(&wps, None).unwrap();
        let optimizer = Optimizer::new();
        for algorithm in Algorithm::ALL {
            let result = optimizer.optimize(&wps, algorithm, &config(kind, seed)).unwrap();
            prop_assert!(result.route.validate(n).is_ok());
            prop_assert_eq!(result.route.kind(), kind);
            let recomputed = result.route.cost(&matrix);
            prop_assert!((result.total_cost - recomputed).abs() < 1e-9);
        }
    }

    #[test]
    fn exact_is_never_beaten(wps in waypoint_sets(), kind in route_kinds()) {
        let optimizer = Optimizer::new();
        let cfg = config(kind, 1);
        let exact = optimizer.optimize(&wps, Algorithm::Exact, &cfg).unwrap();
        prop_assert!(exact.proven_optimal);
        // Integer scaling rounds each arc by at most half a unit.
        let slack = wps.len() as f64 * 0.01;
        for algorithm in [
            Algorithm::NearestNeighbor,
            Algorithm::SimulatedAnnealingSeededByNearestNeighbor,
        ] {
            let other = optimizer.optimize(&wps, algorithm, &cfg).unwrap();
            prop_assert!(exact.total_cost <= other.total_cost + slack);
        }
    }

    #[test]
    fn annealing_is_reproducible(wps in waypoint_sets(), seed in any::<u64>()) {
        let optimizer = Optimizer::new();
        let cfg = config(RouteKind::Closed, seed);
        let a = optimizer.optimize(&wps, Algorithm::SimulatedAnnealing, &cfg).unwrap();
        let b = optimizer.optimize(&wps, Algorithm::SimulatedAnnealing, &cfg).unwrap();
        prop_assert_eq!(a.route, b.route);
        prop_assert_eq!(a.convergence, b.convergence);
        prop_assert_eq!(a.seed, Some(seed));
    }

    #[test]
    fn convergence_never_increases(wps in waypoint_sets(), seed in any::<u64>()) {
        let result = Optimizer::new()
            .optimize(&wps, Algorithm::SimulatedAnnealing, &config(RouteKind::Closed, seed))
            .unwrap();
        for pair in result.convergence.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn seeded_annealing_never_worse_than_its_seed(
        wps in waypoint_sets(),
        kind in route_kinds(),
    ) {
        let optimizer = Optimizer::new();
        let cfg = config(kind, 9);
        let nn = optimizer.optimize(&wps, Algorithm::NearestNeighbor, &cfg).unwrap();
        let sa = optimizer
            .optimize(&wps, Algorithm::SimulatedAnnealingSeededByNearestNeighbor, &cfg)
            .unwrap();
        prop_assert!(sa.total_cost <= nn.total_cost + 1e-9);
    }
}
