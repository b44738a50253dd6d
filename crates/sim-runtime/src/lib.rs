#![deny(warnings)]

//! Turn engine for the solar logistics simulation.
//!
//! Every transition takes a `&GameState` and returns a new snapshot; the input
//! is never modified. A turn advances the calendar and orbits, consumes
//! colony stock, delivers routes, settles finances and re-scores the game.
//!
//! Example:
//!   let s0 = initialize_game(Difficulty::Normal);
//!   let (s12, reports) = run_turns(&s0, 12, true);

mod actions;
mod supply;
mod turn;

pub use actions::{apply_recommendation, build_depot, create_route};
pub use supply::{auto_supply, nearest_depot, needs_resupply, resupply_cargo, RESUPPLY_THRESHOLD_MONTHS};
pub use turn::{
    advance_turn, advance_turn_with_report, check_game_over, TurnReport, BANKRUPTCY_THRESHOLD,
    GRACE_TURNS, LOST_SATISFACTION, VICTORY_MIN_BUDGET, VICTORY_MIN_SATISFACTION,
    VICTORY_MIN_SCORE, VICTORY_MIN_TURN,
};

use sim_core::catalog::{self, ColonySeed};
use sim_core::{validate_state, Difficulty, DifficultySettings, GameState, ValidationError};
use tracing::info;

/// Start a game on the built-in catalog with the preset settings of `difficulty`.
pub fn initialize_game(difficulty: Difficulty) -> GameState {
    let settings = difficulty.settings();
    let mut state = GameState::new(difficulty, settings);
    let multiplier = state.settings.demand_multiplier;
    state.colonies = catalog::colony_seeds()
        .iter()
        .map(|s| s.instantiate(multiplier))
        .collect();
    state.score = sim_econ::compute_score(&state.colonies, state.budget);
    info!(%difficulty, colonies = state.colonies.len(), budget = %state.budget, "game initialized");
    state
}

/// Start a game from custom settings and colony seeds, e.g. a scenario file.
pub fn initialize_game_with(
    difficulty: Difficulty,
    settings: DifficultySettings,
    seeds: &[ColonySeed],
) -> Result<GameState, ValidationError> {
    let mut state = GameState::new(difficulty, settings);
    let multiplier = state.settings.demand_multiplier;
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(ValidationError::NonFinite);
    }
    state.colonies = seeds.iter().map(|s| s.instantiate(multiplier)).collect();
    validate_state(&state)?;
    state.score = sim_econ::compute_score(&state.colonies, state.budget);
    info!(%difficulty, colonies = state.colonies.len(), budget = %state.budget, "custom game initialized");
    Ok(state)
}

/// Advance up to `turns` turns, optionally resupplying after each one.
///
/// Stops early once the game is over. Returns the final state and one report
/// per turn actually played.
pub fn run_turns(state: &GameState, turns: usize, auto_supply: bool) -> (GameState, Vec<TurnReport>) {
    let mut current = state.clone();
    let mut reports = Vec::with_capacity(turns);
    for _ in 0..turns {
        if current.is_game_over() {
            break;
        }
        let (next, report) = advance_turn_with_report(&current);
        current = if auto_supply && !next.is_game_over() {
            supply::auto_supply(&next)
        } else {
            next
        };
        reports.push(report);
    }
    (current, reports)
}
