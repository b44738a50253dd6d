//! YAML scenario files.
//!
//! Example:
//!   difficulty: hard
//!   settings:
//!     initial_budget: 8000
//!   depot_type: standard
//!   prebuilt:
//!     - site: luna-orbit
//!       depot_type: small
//!   placement:
//!     seed: greedy_median

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use sim_ai::PlacementConfig;
use sim_core::catalog::{self, ColonySeed};
use sim_core::{CelestialBody, Depot, DepotType, Difficulty, DifficultySettings, GameState};
use std::path::Path;

/// Partial override of the difficulty preset.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsOverride {
    pub initial_budget: Option<i64>,
    pub demand_multiplier: Option<f64>,
    pub income_multiplier: Option<f64>,
    pub maintenance_multiplier: Option<f64>,
    pub satisfaction_decay_multiplier: Option<f64>,
}

impl SettingsOverride {
    pub fn apply(&self, mut base: DifficultySettings) -> DifficultySettings {
        if let Some(b) = self.initial_budget {
            base.initial_budget = Decimal::from(b);
        }
        if let Some(m) = self.demand_multiplier {
            base.demand_multiplier = m;
        }
        if let Some(m) = self.income_multiplier {
            base.income_multiplier = m;
        }
        if let Some(m) = self.maintenance_multiplier {
            base.maintenance_multiplier = m;
        }
        if let Some(m) = self.satisfaction_decay_multiplier {
            base.satisfaction_decay_multiplier = m;
        }
        base
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrebuiltDepot {
    pub site: String,
    pub depot_type: DepotType,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub difficulty: Option<Difficulty>,
    pub settings: SettingsOverride,
    /// Replaces the built-in colony catalog when present.
    pub colonies: Option<Vec<ColonySeed>>,
    /// Replaces the built-in candidate sites when present.
    pub candidate_sites: Option<Vec<CelestialBody>>,
    pub depot_type: Option<DepotType>,
    pub prebuilt: Vec<PrebuiltDepot>,
    pub placement: PlacementConfig,
    pub turns: Option<usize>,
    pub auto_supply: Option<bool>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing scenario YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_yaml(&text)
    }

    pub fn sites(&self) -> Vec<CelestialBody> {
        self.candidate_sites
            .clone()
            .unwrap_or_else(catalog::candidate_sites)
    }

    /// Fresh game for this scenario with prebuilt depots paid for.
    pub fn start(&self, difficulty: Difficulty) -> Result<GameState> {
        let settings = self.settings.apply(difficulty.settings());
        let seeds = self.colonies.clone().unwrap_or_else(catalog::colony_seeds);
        let mut state = sim_runtime::initialize_game_with(difficulty, settings, &seeds)
            .context("scenario failed validation")?;

        let sites = self.sites();
        for pre in &self.prebuilt {
            let Some(site) = sites.iter().find(|s| s.id.0 == pre.site) else {
                bail!("prebuilt depot on unknown site {}", pre.site);
            };
            state = sim_runtime::build_depot(&state, Depot::new(site.clone(), pre.depot_type))
                .with_context(|| format!("building prebuilt depot on {}", pre.site))?;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ai::SeedStrategy;

    #[test]
    fn parses_overrides_and_prebuilt() {
        let sc = Scenario::from_yaml(
            "difficulty: hard\n\
             settings:\n  initial_budget: 8000\n  income_multiplier: 1.5\n\
             depot_type: standard\n\
             prebuilt:\n  - site: luna-orbit\n    depot_type: small\n\
             placement:\n  seed: greedy_median\n",
        )
        .unwrap();
        assert_eq!(sc.difficulty, Some(Difficulty::Hard));
        assert_eq!(sc.placement.seed, SeedStrategy::GreedyMedian);
        assert_eq!(sc.placement.max_depots_cap, 5);

        let state = sc.start(Difficulty::Hard).unwrap();
        assert_eq!(state.settings.income_multiplier, 1.5);
        assert_eq!(state.settings.demand_multiplier, 1.25);
        assert_eq!(state.budget, Decimal::from(8000 - 3000));
        assert_eq!(state.depots.len(), 1);
    }

    #[test]
    fn empty_scenario_is_the_catalog_game() {
        let sc = Scenario::from_yaml("{}").unwrap();
        let state = sc.start(Difficulty::Normal).unwrap();
        assert_eq!(state, sim_runtime::initialize_game(Difficulty::Normal));
    }

    #[test]
    fn unknown_site_and_fields_are_rejected() {
        let sc = Scenario::from_yaml("prebuilt:\n  - site: pluto\n    depot_type: large\n").unwrap();
        assert!(sc.start(Difficulty::Easy).is_err());
        assert!(Scenario::from_yaml("budget: 5").is_err());
    }
}
