//! Player commands. Each returns a new state or an error leaving the input untouched.

use sim_ai::Recommendation;
use sim_core::{BodyId, Depot, GameError, GameState, Resources, Route, RouteStatus};
use tracing::{debug, info};

/// Build `depot`, paying its construction cost from the budget.
pub fn build_depot(state: &GameState, depot: Depot) -> Result<GameState, GameError> {
    if state.budget < depot.construction_cost {
        return Err(GameError::InsufficientBudget {
            required: depot.construction_cost,
            available: state.budget,
        });
    }
    if state.depot(depot.id()).is_some() {
        return Err(GameError::DuplicateDepot(depot.id().clone()));
    }
    let mut next = state.clone();
    next.budget -= depot.construction_cost;
    info!(
        site = %depot.id(),
        depot_type = ?depot.depot_type,
        cost = %depot.construction_cost,
        budget = %next.budget,
        "depot built"
    );
    next.depots.push(depot);
    Ok(next)
}

/// Build every depot of a recommendation in order, stopping at the first failure.
pub fn apply_recommendation(
    state: &GameState,
    recommendation: &Recommendation,
) -> Result<GameState, GameError> {
    recommendation
        .depots
        .iter()
        .try_fold(state.clone(), |s, d| build_depot(&s, d.clone()))
}

/// Ship `cargo` from a depot to a colony.
pub fn create_route(
    state: &GameState,
    depot_id: &BodyId,
    colony_id: &BodyId,
    cargo: Resources,
) -> Result<GameState, GameError> {
    let mut next = state.clone();
    add_route(&mut next, depot_id, colony_id, cargo)?;
    Ok(next)
}

/// Append an in-transit route to `state`. On error `state` is unchanged.
pub(crate) fn add_route(
    state: &mut GameState,
    depot_id: &BodyId,
    colony_id: &BodyId,
    cargo: Resources,
) -> Result<(), GameError> {
    let depot = state
        .depot(depot_id)
        .ok_or_else(|| GameError::DepotNotFound(depot_id.clone()))?;
    let colony = state
        .colony(colony_id)
        .ok_or_else(|| GameError::ColonyNotFound(colony_id.clone()))?;
    let leg = sim_orbit::leg(&depot.body, &colony.body);
    let duration = leg.travel_time_months.ceil() as u32;

    let id = state.allocate_route_id();
    debug!(
        route = %id,
        from = %depot_id,
        to = %colony_id,
        distance_au = leg.distance_au,
        duration,
        cost = %leg.cost,
        "route created"
    );
    state.routes.push(Route {
        id,
        from: depot_id.clone(),
        to: colony_id.clone(),
        cargo,
        cost: leg.cost,
        duration,
        status: RouteStatus::InTransit,
    });
    Ok(())
}
