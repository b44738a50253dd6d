//! Static seed data: colonies present at game start and the candidate depot sites.
//!
//! Positions use a heliocentric approximation; moons share their parent's
//! orbit with a small angular offset.

use crate::{CelestialBody, Colony, Orbit, Resources};
use serde::{Deserialize, Serialize};

/// Starting satisfaction of every seeded colony.
pub const INITIAL_SATISFACTION: f64 = 75.0;
/// Months of demand a colony holds at game start.
pub const INITIAL_STOCK_MONTHS: f64 = 2.0;

/// Unscaled description of a colony, as found in the catalog or a scenario file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColonySeed {
    pub body: CelestialBody,
    pub population: u64,
    pub demand: Resources,
}

impl ColonySeed {
    /// Build a live colony with demand scaled by `demand_multiplier`.
    pub fn instantiate(&self, demand_multiplier: f64) -> Colony {
        let demand = self.demand.scale(demand_multiplier);
        Colony {
            body: self.body.clone(),
            population: self.population,
            demand,
            inventory: demand.scale(INITIAL_STOCK_MONTHS),
            satisfaction: INITIAL_SATISFACTION,
        }
    }
}

fn seed(
    id: &str,
    name: &str,
    orbit: Orbit,
    population: u64,
    demand: [f64; 4],
) -> ColonySeed {
    let [life_support, fuel, materials, equipment] = demand;
    ColonySeed {
        body: CelestialBody::new(id, name, orbit),
        population,
        demand: Resources::new(life_support, fuel, materials, equipment),
    }
}

pub fn colony_seeds() -> Vec<ColonySeed> {
    vec![
        seed(
            "moon",
            "Moon",
            Orbit::circular(1.00257, 0.0, 365.25),
            5_000,
            [100.0, 50.0, 80.0, 40.0],
        ),
        seed(
            "mars",
            "Mars Base",
            Orbit::circular(1.524, 45.0, 687.0).with_elements(0.0934, 336.04, 1.85),
            12_000,
            [200.0, 120.0, 150.0, 80.0],
        ),
        seed(
            "phobos",
            "Phobos Outpost",
            Orbit::circular(1.5241, 50.0, 687.0),
            1_500,
            [40.0, 60.0, 30.0, 20.0],
        ),
        seed(
            "ceres",
            "Ceres Mining",
            Orbit::circular(2.77, 120.0, 1682.0).with_elements(0.0758, 73.6, 10.6),
            3_000,
            [80.0, 70.0, 90.0, 40.0],
        ),
        seed(
            "vesta",
            "Vesta Station",
            Orbit::circular(2.36, 200.0, 1325.0).with_elements(0.089, 151.2, 7.1),
            1_200,
            [30.0, 40.0, 60.0, 20.0],
        ),
        seed(
            "europa",
            "Europa Research",
            Orbit::circular(5.203, 90.0, 4333.0),
            4_000,
            [120.0, 90.0, 60.0, 50.0],
        ),
        seed(
            "ganymede",
            "Ganymede City",
            Orbit::circular(5.204, 92.0, 4333.0),
            6_000,
            [150.0, 100.0, 90.0, 60.0],
        ),
        seed(
            "callisto",
            "Callisto Depot Town",
            Orbit::circular(5.205, 95.0, 4333.0),
            2_500,
            [60.0, 50.0, 50.0, 30.0],
        ),
        seed(
            "titan",
            "Titan Refinery",
            Orbit::circular(9.537, 300.0, 10759.0).with_elements(0.0565, 92.4, 2.49),
            3_500,
            [90.0, 150.0, 70.0, 50.0],
        ),
        seed(
            "enceladus",
            "Enceladus Camp",
            Orbit::circular(9.538, 302.0, 10759.0),
            800,
            [20.0, 30.0, 20.0, 10.0],
        ),
    ]
}

/// Sites on which the player or the optimizer may place depots.
pub fn candidate_sites() -> Vec<CelestialBody> {
    vec![
        CelestialBody::new("earth-orbit", "Earth Orbit", Orbit::circular(1.0, 0.0, 365.25)),
        CelestialBody::new("luna-orbit", "Lunar Orbit", Orbit::circular(1.00257, 2.0, 365.25)),
        CelestialBody::new("mars-orbit", "Mars Orbit", Orbit::circular(1.524, 47.0, 687.0)),
        CelestialBody::new("ceres-station", "Ceres Station", Orbit::circular(2.77, 118.0, 1682.0)),
        CelestialBody::new("jupiter-orbit", "Jupiter Orbit", Orbit::circular(5.2, 88.0, 4333.0)),
        CelestialBody::new("ganymede-station", "Ganymede Station", Orbit::circular(5.204, 93.0, 4333.0)),
        CelestialBody::new("saturn-orbit", "Saturn Orbit", Orbit::circular(9.54, 298.0, 10759.0)),
        CelestialBody::new("titan-station", "Titan Station", Orbit::circular(9.537, 301.0, 10759.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validate_body, validate_colony, BodyId};

    #[test]
    fn catalog_is_valid() {
        for s in colony_seeds() {
            validate_colony(&s.instantiate(1.0)).unwrap();
        }
        for site in candidate_sites() {
            validate_body(&site).unwrap();
        }
    }

    #[test]
    fn instantiate_scales_demand_and_stock() {
        let moon = colony_seeds()
            .into_iter()
            .find(|s| s.body.id == BodyId::new("moon"))
            .unwrap();
        let c = moon.instantiate(1.25);
        assert_eq!(c.demand.life_support, 125.0);
        assert_eq!(c.inventory.life_support, 250.0);
        assert_eq!(c.satisfaction, INITIAL_SATISFACTION);
    }
}
