//! Cost and coverage figures for a depot configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{Colony, Depot};
use sim_orbit::distance_au;

/// Scales AU × demand into credits so transport competes with construction costs.
pub const TRANSPORT_COST_SCALE: f64 = 10.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementEvaluation {
    pub total_cost: Decimal,
    pub construction_cost: Decimal,
    pub annual_maintenance_cost: Decimal,
    pub annual_transport_cost: Decimal,
    /// Percentage of colonies with at least one depot, one decimal.
    pub coverage_rate: f64,
    /// Mean nearest-depot distance over covered colonies, AU, two decimals.
    pub avg_distance: f64,
    /// Largest nearest-depot distance over covered colonies, AU, two decimals.
    pub max_distance: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}

/// Evaluate `depots` as suppliers for `colonies`.
///
/// Colonies without any depot count against coverage only; they add nothing
/// to transport cost or the distance figures.
pub fn evaluate(colonies: &[Colony], depots: &[Depot]) -> PlacementEvaluation {
    let construction_cost: Decimal = depots.iter().map(|d| d.construction_cost).sum();
    let annual_maintenance_cost: Decimal = depots
        .iter()
        .map(|d| d.maintenance_cost * Decimal::from(12))
        .sum();

    let mut covered = 0usize;
    let mut distance_sum = 0.0;
    let mut max_distance: f64 = 0.0;
    let mut transport = 0.0;
    for colony in colonies {
        let nearest = depots
            .iter()
            .map(|d| distance_au(&colony.body.orbit, &d.body.orbit))
            .fold(f64::INFINITY, f64::min);
        if !nearest.is_finite() {
            continue;
        }
        covered += 1;
        distance_sum += nearest;
        max_distance = max_distance.max(nearest);
        transport += nearest * colony.demand.total() * MONTHS_PER_YEAR * TRANSPORT_COST_SCALE;
    }

    let annual_transport_cost = Decimal::from(transport.round() as i64);
    let coverage_rate = if colonies.is_empty() {
        0.0
    } else {
        100.0 * covered as f64 / colonies.len() as f64
    };
    let avg_distance = if covered == 0 {
        0.0
    } else {
        distance_sum / covered as f64
    };

    PlacementEvaluation {
        total_cost: construction_cost + annual_maintenance_cost + annual_transport_cost,
        construction_cost,
        annual_maintenance_cost,
        annual_transport_cost,
        coverage_rate: round_to(coverage_rate, 1),
        avg_distance: round_to(avg_distance, 2),
        max_distance: round_to(max_distance, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{CelestialBody, DepotType, Orbit, Resources};

    fn colony(id: &str, r: f64, demand: f64) -> Colony {
        let d = Resources::new(demand, 0.0, 0.0, 0.0);
        Colony {
            body: CelestialBody::new(id, id, Orbit::circular(r, 0.0, 365.0)),
            population: 100,
            demand: d,
            inventory: d,
            satisfaction: 50.0,
        }
    }

    fn depot(id: &str, r: f64, t: DepotType) -> Depot {
        Depot::new(CelestialBody::new(id, id, Orbit::circular(r, 0.0, 365.0)), t)
    }

    #[test]
    fn single_depot_figures() {
        let e = evaluate(&[colony("a", 1.0, 100.0)], &[depot("s", 2.0, DepotType::Standard)]);
        assert_eq!(e.construction_cost, Decimal::new(5000, 0));
        assert_eq!(e.annual_maintenance_cost, Decimal::new(2400, 0));
        assert_eq!(e.annual_transport_cost, Decimal::new(12_000, 0));
        assert_eq!(e.total_cost, Decimal::new(19_400, 0));
        assert_eq!(e.coverage_rate, 100.0);
        assert_eq!(e.avg_distance, 1.0);
        assert_eq!(e.max_distance, 1.0);
    }

    #[test]
    fn nearest_depot_is_used() {
        let colonies = [colony("a", 1.0, 10.0), colony("b", 4.0, 10.0)];
        let depots = [depot("s", 1.5, DepotType::Small), depot("t", 5.0, DepotType::Large)];
        let e = evaluate(&colonies, &depots);
        assert_eq!(e.avg_distance, 0.75);
        assert_eq!(e.max_distance, 1.0);
        // (0.5 + 1.0) * 10 * 12 * 10
        assert_eq!(e.annual_transport_cost, Decimal::new(1800, 0));
        assert_eq!(e.construction_cost, Decimal::new(12_000, 0));
    }

    #[test]
    fn no_depots_means_no_coverage() {
        let e = evaluate(&[colony("a", 1.0, 10.0)], &[]);
        assert_eq!(e.coverage_rate, 0.0);
        assert_eq!(e.total_cost, Decimal::ZERO);
        assert_eq!(e.avg_distance, 0.0);
        assert_eq!(e.max_distance, 0.0);
    }
}
