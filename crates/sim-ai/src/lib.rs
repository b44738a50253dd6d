#![deny(warnings)]

//! Depot placement: facility-location optimization and configuration scoring.

pub mod evaluator;
pub mod optimizer;

pub use evaluator::{evaluate, PlacementEvaluation};
pub use optimizer::{
    greedy, greedy_coverage, p_median, p_median_with, DistanceMatrix, PMedianResult,
    SeedStrategy, DEFAULT_MAX_ITERATIONS,
};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{CelestialBody, Colony, Depot, DepotType};
use tracing::info;

/// Knobs of [`recommend_placement`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Upper bound on depots recommended regardless of budget.
    pub max_depots_cap: usize,
    pub max_iterations: usize,
    pub seed: SeedStrategy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_depots_cap: 5,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: SeedStrategy::Coverage,
        }
    }
}

/// Sites picked for new depots and the evaluation of building them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub sites: Vec<CelestialBody>,
    /// One depot of the requested type per site, ready to build.
    pub depots: Vec<Depot>,
    pub evaluation: PlacementEvaluation,
}

/// Number of depots of `depot_type` the budget pays for.
pub fn affordable_depots(budget: Decimal, depot_type: DepotType) -> usize {
    let cost = depot_type.spec().construction_cost;
    budget
        .checked_div(cost)
        .and_then(|n| n.floor().to_usize())
        .unwrap_or(0)
}

/// Recommend depot sites for `colonies` among `candidate_sites` with the default config.
pub fn generate_recommended_placement(
    colonies: &[Colony],
    candidate_sites: &[CelestialBody],
    budget: Decimal,
    depot_type: DepotType,
) -> Recommendation {
    recommend_placement(
        colonies,
        candidate_sites,
        budget,
        depot_type,
        &PlacementConfig::default(),
    )
}

/// Run p-median for as many depots as the budget affords, capped by the config.
pub fn recommend_placement(
    colonies: &[Colony],
    candidate_sites: &[CelestialBody],
    budget: Decimal,
    depot_type: DepotType,
    config: &PlacementConfig,
) -> Recommendation {
    let p = affordable_depots(budget, depot_type).min(config.max_depots_cap);
    let matrix = DistanceMatrix::build(colonies, candidate_sites);
    let weights = optimizer::demand_weights(colonies);
    let result = p_median_with(&matrix, &weights, p, config.max_iterations, config.seed);

    let sites: Vec<CelestialBody> = result
        .sites
        .iter()
        .map(|&i| candidate_sites[i].clone())
        .collect();
    let depots: Vec<Depot> = sites
        .iter()
        .map(|s| Depot::new(s.clone(), depot_type))
        .collect();
    let evaluation = evaluate(colonies, &depots);
    info!(
        p,
        chosen = sites.len(),
        total_cost = %evaluation.total_cost,
        coverage = evaluation.coverage_rate,
        "placement recommended"
    );
    Recommendation {
        sites,
        depots,
        evaluation,
    }
}
