//! Facility location over a candidate × colony distance table.
//!
//! Both algorithms are deterministic: ties go to the lowest candidate index
//! and the local search accepts the first improving swap it meets.

use serde::{Deserialize, Serialize};
use sim_core::{CelestialBody, Colony};
use sim_orbit::distance_au;
use tracing::debug;

/// Default pass limit of the p-median local search.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Distances in AU from every candidate site to every colony, row-major by candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    candidates: usize,
    colonies: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    pub fn build(colonies: &[Colony], candidates: &[CelestialBody]) -> Self {
        let mut data = Vec::with_capacity(candidates.len() * colonies.len());
        for site in candidates {
            for colony in colonies {
                data.push(distance_au(&site.orbit, &colony.body.orbit));
            }
        }
        Self {
            candidates: candidates.len(),
            colonies: colonies.len(),
            data,
        }
    }

    pub fn candidates(&self) -> usize {
        self.candidates
    }

    pub fn colonies(&self) -> usize {
        self.colonies
    }

    pub fn get(&self, candidate: usize, colony: usize) -> f64 {
        self.data[candidate * self.colonies + colony]
    }

    /// Distance from `colony` to the closest site in `solution`, infinite when empty.
    pub fn nearest(&self, solution: &[usize], colony: usize) -> f64 {
        solution
            .iter()
            .map(|&s| self.get(s, colony))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Monthly demand of each colony, the weight of the p-median objective.
pub fn demand_weights(colonies: &[Colony]) -> Vec<f64> {
    colonies.iter().map(|c| c.demand.total()).collect()
}

/// Σ over colonies of nearest-site distance × weight.
pub fn solution_cost(matrix: &DistanceMatrix, weights: &[f64], solution: &[usize]) -> f64 {
    (0..matrix.colonies())
        .map(|j| {
            if weights[j] == 0.0 {
                0.0
            } else {
                matrix.nearest(solution, j) * weights[j]
            }
        })
        .sum()
}

/// Greedy maximum coverage.
///
/// Each round picks the unselected candidate covering the most still-uncovered
/// colonies within `max_distance`. Stops after `max_count` picks, once every
/// colony is covered, or when no candidate adds coverage.
pub fn greedy_coverage(matrix: &DistanceMatrix, max_count: usize, max_distance: f64) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::new();
    let mut covered = vec![false; matrix.colonies()];
    for _ in 0..max_count {
        if covered.iter().all(|&c| c) {
            break;
        }
        let mut best: Option<(usize, usize)> = None;
        for cand in 0..matrix.candidates() {
            if selected.contains(&cand) {
                continue;
            }
            let gain = (0..matrix.colonies())
                .filter(|&j| !covered[j] && matrix.get(cand, j) <= max_distance)
                .count();
            if gain > 0 && best.map_or(true, |(_, g)| gain > g) {
                best = Some((cand, gain));
            }
        }
        let Some((cand, gain)) = best else {
            break;
        };
        debug!(candidate = cand, gain, "greedy pick");
        selected.push(cand);
        for (j, c) in covered.iter_mut().enumerate() {
            if matrix.get(cand, j) <= max_distance {
                *c = true;
            }
        }
    }
    selected
}

/// Convenience form of [`greedy_coverage`] building the matrix on the fly.
pub fn greedy(
    colonies: &[Colony],
    candidates: &[CelestialBody],
    max_count: usize,
    max_distance: f64,
) -> Vec<usize> {
    greedy_coverage(&DistanceMatrix::build(colonies, candidates), max_count, max_distance)
}

/// How the p-median search builds its starting solution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Greedy coverage with unbounded distance. Every site covers every
    /// colony, so the seed holds only the first candidate whenever there is
    /// at least one colony.
    #[default]
    Coverage,
    /// Add the site that lowers the weighted cost most until `p` are chosen.
    GreedyMedian,
}

fn greedy_median_seed(matrix: &DistanceMatrix, weights: &[f64], p: usize) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::new();
    while selected.len() < p.min(matrix.candidates()) {
        let mut best: Option<(usize, f64)> = None;
        for cand in 0..matrix.candidates() {
            if selected.contains(&cand) {
                continue;
            }
            selected.push(cand);
            let cost = solution_cost(matrix, weights, &selected);
            selected.pop();
            if best.map_or(true, |(_, c)| cost < c) {
                best = Some((cand, cost));
            }
        }
        match best {
            Some((cand, _)) => selected.push(cand),
            None => break,
        }
    }
    selected
}

/// Outcome of [`p_median`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PMedianResult {
    /// Selected candidate indices.
    pub sites: Vec<usize>,
    pub cost: f64,
    /// Cost of the seed before local search.
    pub initial_cost: f64,
    /// Passes run, including the final pass without improvement.
    pub passes: usize,
    pub swaps: usize,
}

/// p-median by first-improvement swap search.
///
/// Every pass tries, for each position of the solution, every unselected
/// candidate in index order; a strictly cheaper swap is kept at once and the
/// scan goes on from the updated solution. A pass without any accepted swap
/// ends the search.
pub fn p_median_with(
    matrix: &DistanceMatrix,
    weights: &[f64],
    p: usize,
    max_iterations: usize,
    seed: SeedStrategy,
) -> PMedianResult {
    let mut solution = match seed {
        SeedStrategy::Coverage => greedy_coverage(matrix, p, f64::INFINITY),
        SeedStrategy::GreedyMedian => greedy_median_seed(matrix, weights, p),
    };
    let initial_cost = solution_cost(matrix, weights, &solution);
    let mut cost = initial_cost;
    let mut passes = 0;
    let mut swaps = 0;

    for _ in 0..max_iterations {
        passes += 1;
        let mut improved = false;
        for pos in 0..solution.len() {
            for cand in 0..matrix.candidates() {
                if solution.contains(&cand) {
                    continue;
                }
                let previous = solution[pos];
                solution[pos] = cand;
                let trial = solution_cost(matrix, weights, &solution);
                if trial < cost {
                    cost = trial;
                    improved = true;
                    swaps += 1;
                } else {
                    solution[pos] = previous;
                }
            }
        }
        if !improved {
            break;
        }
    }
    debug!(passes, swaps, initial_cost, cost, "p-median finished");
    PMedianResult {
        sites: solution,
        cost,
        initial_cost,
        passes,
        swaps,
    }
}

/// p-median with the coverage seed, weighted by each colony's total monthly demand.
pub fn p_median(
    colonies: &[Colony],
    candidates: &[CelestialBody],
    p: usize,
    max_iterations: usize,
) -> PMedianResult {
    let matrix = DistanceMatrix::build(colonies, candidates);
    p_median_with(
        &matrix,
        &demand_weights(colonies),
        p,
        max_iterations,
        SeedStrategy::Coverage,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Orbit, Resources};

    fn colony_at(id: &str, r: f64, angle: f64, demand: f64) -> Colony {
        let d = Resources::new(demand, 0.0, 0.0, 0.0);
        Colony {
            body: CelestialBody::new(id, id, Orbit::circular(r, angle, 365.0)),
            population: 100,
            demand: d,
            inventory: d,
            satisfaction: 50.0,
        }
    }

    fn site_at(id: &str, r: f64, angle: f64) -> CelestialBody {
        CelestialBody::new(id, id, Orbit::circular(r, angle, 365.0))
    }

    /// Colonies at r = 1, 2, 3, 10 on the same ray; sites at r = 10, 1.5, 2.5.
    fn line() -> (Vec<Colony>, Vec<CelestialBody>) {
        let colonies = vec![
            colony_at("a", 1.0, 0.0, 10.0),
            colony_at("b", 2.0, 0.0, 10.0),
            colony_at("c", 3.0, 0.0, 10.0),
            colony_at("d", 10.0, 0.0, 40.0),
        ];
        let sites = vec![site_at("s0", 10.0, 0.0), site_at("s1", 1.5, 0.0), site_at("s2", 2.5, 0.0)];
        (colonies, sites)
    }

    #[test]
    fn matrix_layout() {
        let (colonies, sites) = line();
        let m = DistanceMatrix::build(&colonies, &sites);
        assert_eq!((m.candidates(), m.colonies()), (3, 4));
        assert!((m.get(1, 2) - 1.5).abs() < 1e-9);
        assert!((m.nearest(&[0, 2], 0) - 1.5).abs() < 1e-9);
        assert_eq!(m.nearest(&[], 0), f64::INFINITY);
    }

    #[test]
    fn greedy_picks_widest_coverage_first() {
        let (colonies, sites) = line();
        // Within 0.6 AU: s1 covers a and b, s2 covers b and c, s0 covers d.
        // s1 wins the tie with s2 by index; s0 then wins the tie for d over s2 for c.
        let picks = greedy(&colonies, &sites, 3, 0.6);
        assert_eq!(picks, vec![1, 0, 2]);
        assert_eq!(greedy(&colonies, &sites, 1, 0.6), vec![1]);
    }

    #[test]
    fn greedy_stops_without_gain() {
        let (colonies, sites) = line();
        // Only s0 sits within 0.1 AU of anything.
        assert_eq!(greedy(&colonies, &sites, 3, 0.1), vec![0]);
        assert_eq!(greedy(&colonies, &sites, 3, f64::INFINITY), vec![0]);
        assert!(greedy(&[], &sites, 3, f64::INFINITY).is_empty());
    }

    #[test]
    fn p_median_swaps_seed_toward_demand() {
        let (colonies, sites) = line();
        let r = p_median(&colonies, &sites, 2, DEFAULT_MAX_ITERATIONS);
        // Coverage seed is [s0] alone; one position can only move, and d's weight keeps s0.
        assert_eq!(r.sites, vec![0]);
        assert!(r.cost <= r.initial_cost);

        let near: Vec<Colony> = colonies.into_iter().take(3).collect();
        let r = p_median(&near, &sites, 1, DEFAULT_MAX_ITERATIONS);
        assert_eq!(r.sites.len(), 1);
        assert!(r.sites[0] == 1 || r.sites[0] == 2);
        assert!(r.cost < r.initial_cost);
        assert!(r.swaps >= 1);
    }

    #[test]
    fn greedy_median_seed_fills_p() {
        let (colonies, sites) = line();
        let m = DistanceMatrix::build(&colonies, &sites);
        let w = demand_weights(&colonies);
        let r = p_median_with(&m, &w, 2, DEFAULT_MAX_ITERATIONS, SeedStrategy::GreedyMedian);
        assert_eq!(r.sites.len(), 2);
        assert!(r.sites.contains(&0));
        let all = p_median_with(&m, &w, 10, DEFAULT_MAX_ITERATIONS, SeedStrategy::GreedyMedian);
        assert_eq!(all.sites.len(), 3);
    }

    fn layout() -> impl Strategy<Value = (Vec<Colony>, Vec<CelestialBody>)> {
        let colonies = proptest::collection::vec((0.5f64..10.0, 0.0f64..360.0, 1.0f64..500.0), 1..12);
        let sites = proptest::collection::vec((0.5f64..10.0, 0.0f64..360.0), 1..10);
        (colonies, sites).prop_map(|(cs, ss)| {
            let colonies = cs
                .into_iter()
                .enumerate()
                .map(|(i, (r, a, d))| colony_at(&format!("c{i}"), r, a, d))
                .collect();
            let sites = ss
                .into_iter()
                .enumerate()
                .map(|(i, (r, a))| site_at(&format!("s{i}"), r, a))
                .collect();
            (colonies, sites)
        })
    }

    proptest! {
        #[test]
        fn greedy_respects_max_count((colonies, sites) in layout(), k in 0usize..6, dist in 0.1f64..8.0) {
            let picks = greedy(&colonies, &sites, k, dist);
            prop_assert!(picks.len() <= k);
            let all = greedy(&colonies, &sites, sites.len(), f64::INFINITY);
            let m = DistanceMatrix::build(&colonies, &sites);
            for j in 0..colonies.len() {
                prop_assert!(m.nearest(&all, j).is_finite());
            }
        }

        #[test]
        fn p_median_never_worse_than_seed((colonies, sites) in layout(), p in 1usize..5) {
            let m = DistanceMatrix::build(&colonies, &sites);
            let w = demand_weights(&colonies);
            for seed in [SeedStrategy::Coverage, SeedStrategy::GreedyMedian] {
                let r = p_median_with(&m, &w, p, DEFAULT_MAX_ITERATIONS, seed);
                prop_assert!(r.cost <= r.initial_cost);
                prop_assert!(r.sites.len() <= p);
                let again = p_median_with(&m, &w, p, DEFAULT_MAX_ITERATIONS, seed);
                prop_assert_eq!(r, again);
            }
        }
    }
}
