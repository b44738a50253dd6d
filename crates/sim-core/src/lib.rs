#![deny(warnings)]

//! Core domain models and invariants for the solar logistics simulation.
//!
//! This crate defines the serializable types shared by every other crate:
//! orbiting bodies, colonies, depots, supply routes and the aggregate
//! [`GameState`], together with difficulty presets and validation helpers
//! that guard the basic invariants of a scenario.

pub mod catalog;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

/// Simulated days covered by a single turn.
pub const DAYS_PER_TURN: f64 = 30.0;
/// Number of turns kept in [`GameState::history`].
pub const HISTORY_LIMIT: usize = 120;
/// Turn at which the game ends regardless of score.
pub const MAX_TURNS: u32 = 120;

/// Unique identifier of a celestial body or site, e.g. "moon", "ceres".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub String);

impl BodyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a supply route, allocated from [`GameState::next_route_id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteId(pub u64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route-{}", self.0)
    }
}

/// Resource categories consumed by colonies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    LifeSupport,
    Fuel,
    Materials,
    Equipment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::LifeSupport,
        ResourceKind::Fuel,
        ResourceKind::Materials,
        ResourceKind::Equipment,
    ];
}

/// Per-category quantities, used for demand, inventory and cargo alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub life_support: f64,
    pub fuel: f64,
    pub materials: f64,
    pub equipment: f64,
}

impl Resources {
    pub const ZERO: Resources = Resources {
        life_support: 0.0,
        fuel: 0.0,
        materials: 0.0,
        equipment: 0.0,
    };

    pub fn new(life_support: f64, fuel: f64, materials: f64, equipment: f64) -> Self {
        Self {
            life_support,
            fuel,
            materials,
            equipment,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::LifeSupport => self.life_support,
            ResourceKind::Fuel => self.fuel,
            ResourceKind::Materials => self.materials,
            ResourceKind::Equipment => self.equipment,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::LifeSupport => &mut self.life_support,
            ResourceKind::Fuel => &mut self.fuel,
            ResourceKind::Materials => &mut self.materials,
            ResourceKind::Equipment => &mut self.equipment,
        }
    }

    /// Sum over all four categories.
    pub fn total(&self) -> f64 {
        self.life_support + self.fuel + self.materials + self.equipment
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        ResourceKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(
            f(self.life_support),
            f(self.fuel),
            f(self.materials),
            f(self.equipment),
        )
    }

    /// Combine two bundles category by category.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self::new(
            f(self.life_support, other.life_support),
            f(self.fuel, other.fuel),
            f(self.materials, other.materials),
            f(self.equipment, other.equipment),
        )
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        self.zip_with(&rhs, |a, b| a + b)
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

/// Orbital elements of a body. Angles are in degrees, radius in AU.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Orbital radius (semi-major axis) in AU.
    pub radius_au: f64,
    /// Mean anomaly in degrees, kept in [0, 360).
    pub angle_deg: f64,
    /// Orbital period in days (> 0).
    pub period_days: f64,
    /// Eccentricity in [0, 1); absent means a perfect circle.
    #[serde(default)]
    pub eccentricity: Option<f64>,
    /// Longitude of perihelion in degrees.
    #[serde(default)]
    pub longitude_of_perihelion_deg: Option<f64>,
    /// Inclination to the reference plane in degrees.
    #[serde(default)]
    pub inclination_deg: Option<f64>,
}

impl Orbit {
    pub fn circular(radius_au: f64, angle_deg: f64, period_days: f64) -> Self {
        Self {
            radius_au,
            angle_deg,
            period_days,
            eccentricity: None,
            longitude_of_perihelion_deg: None,
            inclination_deg: None,
        }
    }

    pub fn with_elements(
        mut self,
        eccentricity: f64,
        longitude_of_perihelion_deg: f64,
        inclination_deg: f64,
    ) -> Self {
        self.eccentricity = Some(eccentricity);
        self.longitude_of_perihelion_deg = Some(longitude_of_perihelion_deg);
        self.inclination_deg = Some(inclination_deg);
        self
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity.unwrap_or(0.0)
    }

    pub fn longitude_of_perihelion(&self) -> f64 {
        self.longitude_of_perihelion_deg.unwrap_or(0.0)
    }

    pub fn inclination(&self) -> f64 {
        self.inclination_deg.unwrap_or(0.0)
    }

    pub fn is_circular(&self) -> bool {
        self.eccentricity() <= 0.0
    }
}

/// A named body on an orbit. Colonies and depots embed one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub id: BodyId,
    pub name: String,
    pub orbit: Orbit,
}

impl CelestialBody {
    pub fn new(id: impl Into<String>, name: impl Into<String>, orbit: Orbit) -> Self {
        Self {
            id: BodyId::new(id),
            name: name.into(),
            orbit,
        }
    }
}

/// Discriminant for the body variants found in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    Plain,
    Colony,
    Depot,
}

/// A settlement consuming resources every month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Colony {
    pub body: CelestialBody,
    pub population: u64,
    /// Monthly consumption per category.
    pub demand: Resources,
    /// Current stock per category, never negative.
    pub inventory: Resources,
    /// Resupply adequacy in [0, 100].
    pub satisfaction: f64,
}

impl Colony {
    pub fn id(&self) -> &BodyId {
        &self.body.id
    }
}

/// Depot sizes available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepotType {
    Small,
    Standard,
    Large,
    Specialized,
}

/// Fixed cost and capacity figures for a [`DepotType`].
#[derive(Clone, Debug, PartialEq)]
pub struct DepotTypeSpec {
    pub construction_cost: Decimal,
    pub maintenance_cost: Decimal,
    pub capacity: f64,
    pub special_ability: Option<&'static str>,
}

impl DepotType {
    pub const ALL: [DepotType; 4] = [
        DepotType::Small,
        DepotType::Standard,
        DepotType::Large,
        DepotType::Specialized,
    ];

    pub fn spec(self) -> DepotTypeSpec {
        let (construction, maintenance, capacity, special_ability) = match self {
            DepotType::Small => (3000, 100, 500.0, None),
            DepotType::Standard => (5000, 200, 1000.0, None),
            DepotType::Large => (9000, 350, 2000.0, None),
            DepotType::Specialized => (7000, 300, 800.0, Some("cryogenic_storage")),
        };
        DepotTypeSpec {
            construction_cost: Decimal::new(construction, 0),
            maintenance_cost: Decimal::new(maintenance, 0),
            capacity,
            special_ability,
        }
    }
}

impl FromStr for DepotType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(DepotType::Small),
            "standard" => Ok(DepotType::Standard),
            "large" => Ok(DepotType::Large),
            "specialized" => Ok(DepotType::Specialized),
            other => Err(ValidationError::UnknownDepotType(other.to_string())),
        }
    }
}

/// A supply depot built on a site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub body: CelestialBody,
    pub depot_type: DepotType,
    pub construction_cost: Decimal,
    /// Recurring cost per turn.
    pub maintenance_cost: Decimal,
    pub capacity: f64,
    /// Bookkeeping only; shipments do not draw from it.
    pub stock: Resources,
    pub special_ability: Option<String>,
}

impl Depot {
    /// Materialize a depot of `depot_type` on `site` using the type's fixed figures.
    pub fn new(site: CelestialBody, depot_type: DepotType) -> Self {
        let spec = depot_type.spec();
        Self {
            body: site,
            depot_type,
            construction_cost: spec.construction_cost,
            maintenance_cost: spec.maintenance_cost,
            capacity: spec.capacity,
            stock: Resources::ZERO,
            special_ability: spec.special_ability.map(str::to_string),
        }
    }

    pub fn id(&self) -> &BodyId {
        &self.body.id
    }
}

/// Borrowed view over any body in a game, tagged by kind.
#[derive(Clone, Copy, Debug)]
pub enum BodyRef<'a> {
    Colony(&'a Colony),
    Depot(&'a Depot),
    Plain(&'a CelestialBody),
}

impl<'a> BodyRef<'a> {
    pub fn kind(&self) -> BodyKind {
        match self {
            BodyRef::Colony(_) => BodyKind::Colony,
            BodyRef::Depot(_) => BodyKind::Depot,
            BodyRef::Plain(_) => BodyKind::Plain,
        }
    }

    pub fn body(&self) -> &'a CelestialBody {
        match self {
            BodyRef::Colony(c) => &c.body,
            BodyRef::Depot(d) => &d.body,
            BodyRef::Plain(b) => b,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    InTransit,
    Delivered,
}

/// A shipment from a depot to a colony.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Origin depot.
    pub from: BodyId,
    /// Destination colony.
    pub to: BodyId,
    pub cargo: Resources,
    /// Credits charged every turn while in transit.
    pub cost: Decimal,
    /// Months remaining.
    pub duration: u32,
    pub status: RouteStatus,
}

/// In-game calendar. One turn is one month of [`DAYS_PER_TURN`] days.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub year: i32,
    /// Month in 1..=12.
    pub month: u32,
    /// Days elapsed since the game started.
    pub epoch_days: f64,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            year: 2050,
            month: 1,
            epoch_days: 0.0,
        }
    }
}

impl Calendar {
    /// Move forward one month, rolling over into the next year after December.
    pub fn advance(&mut self) {
        self.month += 1;
        if self.month > 12 {
            self.month = 1;
            self.year += 1;
        }
        self.epoch_days += DAYS_PER_TURN;
    }

    /// First day of the current month.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

/// Difficulty presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Economic multipliers applied for a difficulty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    pub initial_budget: Decimal,
    pub demand_multiplier: f64,
    pub income_multiplier: f64,
    pub maintenance_multiplier: f64,
    pub satisfaction_decay_multiplier: f64,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn settings(self) -> DifficultySettings {
        let (budget, demand, income, maintenance, decay) = match self {
            Difficulty::Easy => (20_000, 0.8, 1.2, 0.8, 0.8),
            Difficulty::Normal => (10_000, 1.0, 1.0, 1.0, 1.0),
            Difficulty::Hard => (6_000, 1.25, 0.85, 1.2, 1.2),
        };
        DifficultySettings {
            initial_budget: Decimal::new(budget, 0),
            demand_multiplier: demand,
            income_multiplier: income,
            maintenance_multiplier: maintenance,
            satisfaction_decay_multiplier: decay,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ValidationError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Score snapshot recomputed every turn. Percentages in [0, 100].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub delivery_rate: f64,
    pub cost_efficiency: f64,
    /// Placeholder, always zero.
    pub avg_delivery_time: f64,
    pub customer_satisfaction: f64,
    pub total_score: f64,
}

/// One row of the per-turn history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn: u32,
    pub budget: Decimal,
    pub total_score: f64,
    pub delivery_rate: f64,
    pub customer_satisfaction: f64,
    pub colonies_served: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Bankruptcy,
    MaxTurns,
    AllColoniesLost,
    Victory,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameOverReason::Bankruptcy => "bankruptcy",
            GameOverReason::MaxTurns => "max_turns",
            GameOverReason::AllColoniesLost => "all_colonies_lost",
            GameOverReason::Victory => "victory",
        };
        f.write_str(s)
    }
}

/// Aggregate root of a running game.
///
/// Snapshots are values: transitions in `sim-runtime` take a reference and
/// return a fresh state, so a snapshot handed to a renderer or a save slot is
/// never modified afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: u32,
    pub calendar: Calendar,
    pub budget: Decimal,
    /// Income settled during the last turn.
    pub income: Decimal,
    /// Expenses settled during the last turn.
    pub expenses: Decimal,
    pub colonies: Vec<Colony>,
    pub depots: Vec<Depot>,
    pub routes: Vec<Route>,
    pub score: Score,
    /// `Some` once the game has ended; never overwritten afterwards.
    pub game_over: Option<GameOverReason>,
    /// Last [`HISTORY_LIMIT`] turns, oldest first.
    pub history: VecDeque<HistoryEntry>,
    pub difficulty: Difficulty,
    pub settings: DifficultySettings,
    pub next_route_id: u64,
    /// Stamped by the persistence layer when the snapshot is saved.
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl GameState {
    /// An empty game at turn zero for the given settings.
    pub fn new(difficulty: Difficulty, settings: DifficultySettings) -> Self {
        Self {
            turn: 0,
            calendar: Calendar::default(),
            budget: settings.initial_budget,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            colonies: Vec::new(),
            depots: Vec::new(),
            routes: Vec::new(),
            score: Score::default(),
            game_over: None,
            history: VecDeque::new(),
            difficulty,
            settings,
            next_route_id: 1,
            last_saved_at: None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn colony(&self, id: &BodyId) -> Option<&Colony> {
        self.colonies.iter().find(|c| c.id() == id)
    }

    pub fn colony_mut(&mut self, id: &BodyId) -> Option<&mut Colony> {
        self.colonies.iter_mut().find(|c| c.id() == id)
    }

    pub fn depot(&self, id: &BodyId) -> Option<&Depot> {
        self.depots.iter().find(|d| d.id() == id)
    }

    /// All colonies followed by all depots.
    pub fn bodies(&self) -> impl Iterator<Item = BodyRef<'_>> {
        self.colonies
            .iter()
            .map(BodyRef::Colony)
            .chain(self.depots.iter().map(BodyRef::Depot))
    }

    /// First body with the given id; colonies shadow depots built on the same site.
    pub fn find_body(&self, id: &BodyId) -> Option<BodyRef<'_>> {
        self.bodies().find(|b| &b.body().id == id)
    }

    pub fn in_transit(&self) -> impl Iterator<Item = &Route> {
        self.routes
            .iter()
            .filter(|r| r.status == RouteStatus::InTransit)
    }

    pub fn allocate_route_id(&mut self) -> RouteId {
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        id
    }

    /// Append a history row, dropping the oldest beyond [`HISTORY_LIMIT`].
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}

/// Rejected player actions. The state they were applied to is left untouched.
#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("insufficient budget: need {required}, have {available}")]
    InsufficientBudget {
        required: Decimal,
        available: Decimal,
    },
    #[error("a depot already exists at site {0}")]
    DuplicateDepot(BodyId),
    #[error("depot not found: {0}")]
    DepotNotFound(BodyId),
    #[error("colony not found: {0}")]
    ColonyNotFound(BodyId),
}

/// Validation errors for scenario and snapshot invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("non-finite numeric value encountered")]
    NonFinite,
    #[error("orbit of {0} must have positive radius and period")]
    NonPositiveOrbit(BodyId),
    #[error("eccentricity of {0} must be within [0,1)")]
    InvalidEccentricity(BodyId),
    #[error("negative quantity for {0}")]
    NegativeQuantity(BodyId),
    #[error("satisfaction of {0} must be within [0,100]")]
    SatisfactionOutOfRange(BodyId),
    #[error("duplicate id: {0}")]
    DuplicateId(BodyId),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
    #[error("unknown depot type: {0}")]
    UnknownDepotType(String),
}

/// Validate a body's orbital elements.
pub fn validate_body(body: &CelestialBody) -> Result<(), ValidationError> {
    let o = &body.orbit;
    let values = [
        o.radius_au,
        o.angle_deg,
        o.period_days,
        o.eccentricity(),
        o.longitude_of_perihelion(),
        o.inclination(),
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::NonFinite);
    }
    if o.radius_au <= 0.0 || o.period_days <= 0.0 {
        return Err(ValidationError::NonPositiveOrbit(body.id.clone()));
    }
    if !(0.0..1.0).contains(&o.eccentricity()) {
        return Err(ValidationError::InvalidEccentricity(body.id.clone()));
    }
    Ok(())
}

fn validate_resources(id: &BodyId, r: &Resources) -> Result<(), ValidationError> {
    for (_, v) in r.iter() {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite);
        }
        if v < 0.0 {
            return Err(ValidationError::NegativeQuantity(id.clone()));
        }
    }
    Ok(())
}

/// Validate a colony, including its orbit.
pub fn validate_colony(colony: &Colony) -> Result<(), ValidationError> {
    validate_body(&colony.body)?;
    validate_resources(colony.id(), &colony.demand)?;
    validate_resources(colony.id(), &colony.inventory)?;
    if !(0.0..=100.0).contains(&colony.satisfaction) {
        return Err(ValidationError::SatisfactionOutOfRange(colony.id().clone()));
    }
    Ok(())
}

/// Validate a whole state: every body, unique colony ids and one depot per site.
pub fn validate_state(state: &GameState) -> Result<(), ValidationError> {
    let mut colony_ids: BTreeSet<&BodyId> = BTreeSet::new();
    for c in &state.colonies {
        validate_colony(c)?;
        if !colony_ids.insert(c.id()) {
            return Err(ValidationError::DuplicateId(c.id().clone()));
        }
    }
    let mut sites: BTreeSet<&BodyId> = BTreeSet::new();
    for d in &state.depots {
        validate_body(&d.body)?;
        if !sites.insert(d.id()) {
            return Err(ValidationError::DuplicateId(d.id().clone()));
        }
    }
    for r in &state.routes {
        validate_resources(&r.to, &r.cargo)?;
    }
    Ok(())
}
