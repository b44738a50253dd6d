#![deny(warnings)]

//! Headless CLI: start or load a game, optionally place depots, play turns, save.

mod scenario;

use anyhow::{Context, Result};
use persistence::{FileStore, Format, SaveManager, SaveSlot};
use scenario::Scenario;
use sim_core::{DepotType, Difficulty, GameState};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_SAVE_DIR: &str = "./saves";

#[derive(Debug)]
struct Args {
    difficulty: Option<Difficulty>,
    turns: Option<usize>,
    scenario: Option<PathBuf>,
    optimize: bool,
    depot_type: Option<DepotType>,
    auto_supply: bool,
    save_dir: Option<PathBuf>,
    save: Option<SaveSlot>,
    load: Option<SaveSlot>,
    format: Format,
    list: bool,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        difficulty: None,
        turns: None,
        scenario: None,
        optimize: false,
        depot_type: None,
        auto_supply: true,
        save_dir: None,
        save: None,
        load: None,
        format: Format::Json,
        list: false,
        json: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = || it.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--difficulty" => args.difficulty = Some(value()?.parse()?),
            "--turns" => args.turns = Some(value()?.parse().context("--turns")?),
            "--scenario" => args.scenario = Some(PathBuf::from(value()?)),
            "--optimize" => args.optimize = true,
            "--depot-type" => args.depot_type = Some(value()?.parse()?),
            "--no-auto-supply" => args.auto_supply = false,
            "--save-dir" => args.save_dir = Some(PathBuf::from(value()?)),
            "--save" => args.save = Some(value()?.parse()?),
            "--load" => args.load = Some(value()?.parse()?),
            "--format" => args.format = value()?.parse()?,
            "--list" => args.list = true,
            "--json" => args.json = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn print_state(state: &GameState) {
    let date = state
        .calendar
        .date()
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default();
    println!(
        "Turn {} ({}) | budget: {} | income: {} | expenses: {} | depots: {} | routes: {}",
        state.turn,
        date,
        state.budget,
        state.income,
        state.expenses,
        state.depots.len(),
        state.routes.len()
    );
    println!(
        "KPI | score: {:.1} | delivery: {:.1}% | efficiency: {:.1}% | satisfaction: {:.1}% | served: {}/{}",
        state.score.total_score,
        state.score.delivery_rate,
        state.score.cost_efficiency,
        state.score.customer_satisfaction,
        served(state),
        state.colonies.len()
    );
    if let Some(reason) = state.game_over {
        println!("Game over: {reason}");
    }
}

fn served(state: &GameState) -> usize {
    state.history.back().map_or(0, |h| h.colonies_served)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args()?;
    info!(
        git_sha = env!("GIT_SHA"),
        build_date = env!("BUILD_DATE"),
        ?args,
        "starting CLI"
    );

    let save_dir = args
        .save_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR));
    let autosave = args.save_dir.is_some() || args.save.is_some() || args.load.is_some();
    let mut saves = SaveManager::new(FileStore::new(save_dir), args.format);
    if args.list {
        for slot in saves.list()? {
            println!(
                "{:<9} | turn {:>3} | {}-{:02} | {} | budget: {} | score: {:.1} | saved {}",
                slot.slot.to_string(),
                slot.turn,
                slot.year,
                slot.month,
                slot.difficulty,
                slot.budget,
                slot.total_score,
                slot.saved_at.to_rfc3339()
            );
        }
        return Ok(());
    }

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let difficulty = args
        .difficulty
        .or(scenario.difficulty)
        .unwrap_or_default();

    let mut state = match args.load {
        Some(slot) => saves
            .load(slot)
            .with_context(|| format!("loading slot {slot}"))?,
        None => scenario.start(difficulty)?,
    };

    if args.optimize {
        let depot_type = args
            .depot_type
            .or(scenario.depot_type)
            .unwrap_or(DepotType::Standard);
        let rec = sim_ai::recommend_placement(
            &state.colonies,
            &scenario.sites(),
            state.budget,
            depot_type,
            &scenario.placement,
        );
        for site in &rec.sites {
            println!("Recommended depot: {} ({})", site.name, site.id);
        }
        println!(
            "Placement | construction: {} | maintenance/yr: {} | transport/yr: {} | coverage: {:.1}% | avg distance: {:.2} AU",
            rec.evaluation.construction_cost,
            rec.evaluation.annual_maintenance_cost,
            rec.evaluation.annual_transport_cost,
            rec.evaluation.coverage_rate,
            rec.evaluation.avg_distance
        );
        state = sim_runtime::apply_recommendation(&state, &rec)?;
    }

    let turns = args.turns.or(scenario.turns).unwrap_or(12);
    let auto_supply = args.auto_supply && scenario.auto_supply.unwrap_or(true);
    let (state, reports) = sim_runtime::run_turns(&state, turns, auto_supply);
    let delivered: usize = reports.iter().map(|r| r.delivered.len()).sum();
    info!(played = reports.len(), delivered, "turns played");

    let state = if autosave {
        saves.save(SaveSlot::Auto, &state)?
    } else {
        state
    };
    if let Some(slot) = args.save {
        saves.save(slot, &state)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    print_state(&state);
    Ok(())
}
