//! Automatic resupply from the nearest depot.

use crate::actions::add_route;
use sim_core::{Colony, Depot, GameState, Resources};
use sim_econ::STOCK_TARGET_MONTHS;
use sim_orbit::distance_au;
use tracing::{debug, warn};

/// Colonies holding less than this many months of any category get a shipment.
pub const RESUPPLY_THRESHOLD_MONTHS: f64 = 1.5;

pub fn needs_resupply(colony: &Colony) -> bool {
    colony
        .inventory
        .iter()
        .zip(colony.demand.iter())
        .any(|((_, stock), (_, demand))| stock < RESUPPLY_THRESHOLD_MONTHS * demand)
}

/// Cargo topping every category up to two months of demand.
pub fn resupply_cargo(colony: &Colony) -> Resources {
    colony
        .demand
        .scale(STOCK_TARGET_MONTHS)
        .zip_with(&colony.inventory, |target, stock| (target - stock).max(0.0))
}

/// Closest depot by current distance; the first one wins ties.
pub fn nearest_depot<'a>(depots: &'a [Depot], colony: &Colony) -> Option<&'a Depot> {
    let mut best: Option<(&Depot, f64)> = None;
    for depot in depots {
        let d = distance_au(&depot.body.orbit, &colony.body.orbit);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((depot, d));
        }
    }
    best.map(|(depot, _)| depot)
}

/// Ship to every under-stocked colony from its nearest depot.
///
/// A colony whose route cannot be created is skipped; the others are still served.
pub fn auto_supply(state: &GameState) -> GameState {
    let mut next = state.clone();
    if state.depots.is_empty() {
        return next;
    }
    let mut shipped = 0usize;
    for colony in state.colonies.iter().filter(|c| needs_resupply(c)) {
        let Some(depot) = nearest_depot(&state.depots, colony) else {
            continue;
        };
        let cargo = resupply_cargo(colony);
        match add_route(&mut next, depot.id(), colony.id(), cargo) {
            Ok(()) => shipped += 1,
            Err(err) => warn!(colony = %colony.id(), %err, "auto-supply skipped colony"),
        }
    }
    debug!(turn = state.turn, shipped, "auto-supply done");
    next
}
