#![deny(warnings)]

//! Economic models: consumption, finances, satisfaction and scoring.
//!
//! This module provides the per-turn formulas used by the runtime:
//! - Inventory consumption clamped at zero
//! - Income from population and satisfaction, expenses from depots and routes
//! - Satisfaction smoothed toward a two-month stock target
//! - Composite score over delivery rate, cost efficiency and satisfaction

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sim_core::{Colony, Depot, Resources, Route, RouteStatus, Score};

/// Months of demand a colony is expected to keep in stock.
pub const STOCK_TARGET_MONTHS: f64 = 2.0;
/// Fraction of the gap to the target closed each turn.
pub const SATISFACTION_SMOOTHING: f64 = 0.3;
/// Budget that earns full cost efficiency.
pub const REFERENCE_BUDGET: f64 = 10_000.0;
/// Share of total demand a colony must hold to count as served.
pub const SERVED_THRESHOLD: f64 = 0.5;

pub const DELIVERY_WEIGHT: f64 = 0.4;
pub const EFFICIENCY_WEIGHT: f64 = 0.3;
pub const SATISFACTION_WEIGHT: f64 = 0.3;

/// Round to `decimals` places, halves away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}

/// Whole credits from a floating amount.
pub fn credits(value: f64) -> Decimal {
    Decimal::from(value.round() as i64)
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Inventory left after one month of `demand`. Deficits are lost, never carried.
pub fn consume(inventory: &Resources, demand: &Resources) -> Resources {
    inventory.zip_with(demand, |stock, used| (stock - used).max(0.0))
}

/// Monthly tax income of one colony before rounding.
pub fn colony_income(colony: &Colony, income_multiplier: f64) -> f64 {
    (colony.population as f64 / 100.0) * (colony.satisfaction / 100.0) * income_multiplier
}

/// Total income for a turn, rounded to whole credits.
pub fn turn_income(colonies: &[Colony], income_multiplier: f64) -> Decimal {
    credits(
        colonies
            .iter()
            .map(|c| colony_income(c, income_multiplier))
            .sum(),
    )
}

/// Depot upkeep plus the cost of every route still in transit, rounded to whole credits.
///
/// Routes are charged on every turn they remain in transit.
pub fn turn_expenses(depots: &[Depot], routes: &[Route], maintenance_multiplier: f64) -> Decimal {
    let upkeep: f64 = depots
        .iter()
        .map(|d| to_f64(d.maintenance_cost) * maintenance_multiplier)
        .sum();
    let shipping: f64 = routes
        .iter()
        .filter(|r| r.status == RouteStatus::InTransit)
        .map(|r| to_f64(r.cost))
        .sum();
    credits(upkeep + shipping)
}

/// Stock relative to the two-month target. A category nobody consumes counts as fully stocked.
pub fn supply_ratio(inventory: f64, demand: f64) -> f64 {
    if demand <= 0.0 {
        return 1.0;
    }
    inventory / (STOCK_TARGET_MONTHS * demand)
}

/// Satisfaction a colony would converge to with its current stock, in [0, 100].
pub fn target_satisfaction(colony: &Colony) -> f64 {
    let ratios: Vec<f64> = colony
        .inventory
        .iter()
        .zip(colony.demand.iter())
        .map(|((_, stock), (_, demand))| supply_ratio(stock, demand))
        .collect();
    let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
    (avg * 100.0).min(100.0)
}

/// Move `current` toward `target` by the smoothing factor, clamped to [0, 100].
pub fn smooth_satisfaction(current: f64, target: f64, decay_multiplier: f64) -> f64 {
    (current + (target - current) * SATISFACTION_SMOOTHING * decay_multiplier).clamp(0.0, 100.0)
}

/// Satisfaction after this turn's update.
pub fn next_satisfaction(colony: &Colony, decay_multiplier: f64) -> f64 {
    smooth_satisfaction(
        colony.satisfaction,
        target_satisfaction(colony),
        decay_multiplier,
    )
}

/// Percentage of demand covered by stock on hand; 100 when nothing is demanded.
pub fn delivery_rate(colonies: &[Colony]) -> f64 {
    let mut delivered = 0.0;
    let mut demanded = 0.0;
    for c in colonies {
        for ((_, stock), (_, demand)) in c.inventory.iter().zip(c.demand.iter()) {
            delivered += stock.min(demand);
            demanded += demand;
        }
    }
    if demanded == 0.0 {
        return 100.0;
    }
    100.0 * delivered / demanded
}

/// Linear in budget up to [`REFERENCE_BUDGET`]; zero for any non-positive budget.
pub fn cost_efficiency(budget: Decimal) -> f64 {
    if budget <= Decimal::ZERO {
        return 0.0;
    }
    (100.0 * to_f64(budget) / REFERENCE_BUDGET).min(100.0)
}

/// Mean colony satisfaction, zero without colonies.
pub fn customer_satisfaction(colonies: &[Colony]) -> f64 {
    if colonies.is_empty() {
        return 0.0;
    }
    colonies.iter().map(|c| c.satisfaction).sum::<f64>() / colonies.len() as f64
}

/// Score for the current colonies and budget, each field rounded to one decimal.
pub fn compute_score(colonies: &[Colony], budget: Decimal) -> Score {
    let delivery = delivery_rate(colonies);
    let efficiency = cost_efficiency(budget);
    let satisfaction = customer_satisfaction(colonies);
    let total = DELIVERY_WEIGHT * delivery
        + EFFICIENCY_WEIGHT * efficiency
        + SATISFACTION_WEIGHT * satisfaction;
    Score {
        delivery_rate: round_to(delivery, 1),
        cost_efficiency: round_to(efficiency, 1),
        avg_delivery_time: 0.0,
        customer_satisfaction: round_to(satisfaction, 1),
        total_score: round_to(total, 1),
    }
}

/// A colony is served while it holds at least half a month of total demand.
pub fn is_served(colony: &Colony) -> bool {
    colony.inventory.total() >= SERVED_THRESHOLD * colony.demand.total()
}

pub fn colonies_served(colonies: &[Colony]) -> usize {
    colonies.iter().filter(|c| is_served(c)).count()
}
