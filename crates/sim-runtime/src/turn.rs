//! Monthly turn transition.
//!
//! Steps run in a fixed order, each one reading what the previous step wrote:
//! calendar, orbits, consumption, deliveries, finances, satisfaction, score,
//! history and finally the game-over check.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    GameOverReason, GameState, HistoryEntry, Route, RouteStatus, Score, DAYS_PER_TURN, MAX_TURNS,
};
use sim_econ::{colonies_served, compute_score, consume, next_satisfaction, turn_expenses, turn_income};
use sim_orbit::advance_orbit;
use tracing::{debug, info};

/// Budget below which the company is bankrupt.
pub const BANKRUPTCY_THRESHOLD: i64 = -5_000;
/// Colonies below this satisfaction count as lost.
pub const LOST_SATISFACTION: f64 = 20.0;
/// Turns during which colonies cannot be lost.
pub const GRACE_TURNS: u32 = 12;
pub const VICTORY_MIN_TURN: u32 = 60;
pub const VICTORY_MIN_SCORE: f64 = 95.0;
pub const VICTORY_MIN_SATISFACTION: f64 = 90.0;
pub const VICTORY_MIN_BUDGET: i64 = 5_000;

/// What happened during one call to [`advance_turn_with_report`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u32,
    /// Routes completed this turn, in `Delivered` status.
    pub delivered: Vec<Route>,
    pub income: Decimal,
    pub expenses: Decimal,
    pub score: Score,
    pub game_over: Option<GameOverReason>,
}

/// Advance the game by one month.
pub fn advance_turn(state: &GameState) -> GameState {
    advance_turn_with_report(state).0
}

/// Advance the game by one month and describe the transition.
pub fn advance_turn_with_report(state: &GameState) -> (GameState, TurnReport) {
    let mut next = state.clone();

    next.turn += 1;
    next.calendar.advance();
    for colony in &mut next.colonies {
        advance_orbit(&mut colony.body.orbit, DAYS_PER_TURN);
    }
    for depot in &mut next.depots {
        advance_orbit(&mut depot.body.orbit, DAYS_PER_TURN);
    }
    for colony in &mut next.colonies {
        colony.inventory = consume(&colony.inventory, &colony.demand);
    }
    let delivered = process_routes(&mut next);
    settle_finances(&mut next);
    let decay = next.settings.satisfaction_decay_multiplier;
    for colony in &mut next.colonies {
        colony.satisfaction = next_satisfaction(colony, decay);
    }
    next.score = compute_score(&next.colonies, next.budget);
    let entry = HistoryEntry {
        turn: next.turn,
        budget: next.budget,
        total_score: next.score.total_score,
        delivery_rate: next.score.delivery_rate,
        customer_satisfaction: next.score.customer_satisfaction,
        colonies_served: colonies_served(&next.colonies),
    };
    next.push_history(entry);

    if next.game_over.is_none() {
        if let Some(reason) = check_game_over(&next) {
            info!(turn = next.turn, %reason, budget = %next.budget, "game over");
            next.game_over = Some(reason);
        }
    }

    let report = TurnReport {
        turn: next.turn,
        delivered,
        income: next.income,
        expenses: next.expenses,
        score: next.score.clone(),
        game_over: next.game_over,
    };
    (next, report)
}

/// Count down in-transit routes and unload the ones that arrive.
///
/// Cargo for a colony that no longer exists is dropped.
fn process_routes(state: &mut GameState) -> Vec<Route> {
    let mut delivered = Vec::new();
    for mut route in std::mem::take(&mut state.routes) {
        if route.status != RouteStatus::InTransit {
            state.routes.push(route);
            continue;
        }
        route.duration = route.duration.saturating_sub(1);
        if route.duration > 0 {
            state.routes.push(route);
            continue;
        }
        match state.colony_mut(&route.to) {
            Some(colony) => colony.inventory += route.cargo,
            None => debug!(route = %route.id, to = %route.to, "destination missing, cargo dropped"),
        }
        route.status = RouteStatus::Delivered;
        debug!(route = %route.id, to = %route.to, "route delivered");
        delivered.push(route);
    }
    delivered
}

fn settle_finances(state: &mut GameState) {
    let income = turn_income(&state.colonies, state.settings.income_multiplier);
    let expenses = turn_expenses(
        &state.depots,
        &state.routes,
        state.settings.maintenance_multiplier,
    );
    state.income = income;
    state.expenses = expenses;
    state.budget += income - expenses;
    debug!(turn = state.turn, %income, %expenses, budget = %state.budget, "finances settled");
}

/// First matching end condition, checked in priority order.
pub fn check_game_over(state: &GameState) -> Option<GameOverReason> {
    if state.budget < Decimal::from(BANKRUPTCY_THRESHOLD) {
        Some(GameOverReason::Bankruptcy)
    } else if state.turn >= MAX_TURNS {
        Some(GameOverReason::MaxTurns)
    } else if state.turn > GRACE_TURNS
        && state
            .colonies
            .iter()
            .all(|c| c.satisfaction < LOST_SATISFACTION)
    {
        Some(GameOverReason::AllColoniesLost)
    } else if state.turn >= VICTORY_MIN_TURN
        && state.score.total_score >= VICTORY_MIN_SCORE
        && state.score.customer_satisfaction >= VICTORY_MIN_SATISFACTION
        && state.budget > Decimal::from(VICTORY_MIN_BUDGET)
    {
        Some(GameOverReason::Victory)
    } else {
        None
    }
}
