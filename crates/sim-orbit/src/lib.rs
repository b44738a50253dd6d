#![deny(warnings)]

//! Orbital geometry: body positions, distances, travel time and transport cost.
//!
//! Two models are supported:
//! - Circular: planar law of cosines on orbital radius and mean anomaly
//! - Elliptical: Kepler's equation solved by Newton iteration, used as soon
//!   as either body has a non-zero eccentricity
//!
//! All functions are pure and deterministic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{CelestialBody, Orbit};
use tracing::debug;

/// Kilometers in one astronomical unit.
pub const KM_PER_AU: f64 = 149_597_870.7;
/// Constant cruise speed of freighters.
pub const TRANSIT_SPEED_KMH: f64 = 20_000.0;
/// Shortest possible trip, so that co-located bodies still take time.
pub const MIN_TRAVEL_MONTHS: f64 = 0.1;
/// Fixed part of every shipment's cost.
pub const BASE_TRANSPORT_COST: f64 = 50.0;
pub const COST_PER_AU: f64 = 100.0;
pub const KEPLER_TOLERANCE: f64 = 1e-6;
pub const KEPLER_MAX_ITERATIONS: u32 = 20;

/// Result of solving Kepler's equation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly in radians.
    pub eccentric_anomaly: f64,
    /// Newton steps taken.
    pub iterations: u32,
    pub converged: bool,
}

/// Solve `M = E - e·sin(E)` for `E` with Newton iteration, starting at `E₀ = M`.
///
/// Stops when a step is smaller than [`KEPLER_TOLERANCE`] or after
/// [`KEPLER_MAX_ITERATIONS`] steps.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let mut e_anom = mean_anomaly;
    for i in 1..=KEPLER_MAX_ITERATIONS {
        let f = e_anom - eccentricity * e_anom.sin() - mean_anomaly;
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        let delta = f / f_prime;
        e_anom -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            return KeplerSolution {
                eccentric_anomaly: e_anom,
                iterations: i,
                converged: true,
            };
        }
    }
    debug!(mean_anomaly, eccentricity, "kepler solver hit iteration cap");
    KeplerSolution {
        eccentric_anomaly: e_anom,
        iterations: KEPLER_MAX_ITERATIONS,
        converged: false,
    }
}

/// Heliocentric position in AU. `z` is the out-of-plane offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Current position of a body on its orbit.
///
/// Circular orbits sit at their mean anomaly in the reference plane.
/// Elliptical orbits go through eccentric and true anomaly; the in-plane
/// angle is `ν + ω` and the inclination lifts the body by `sin(i)·r·sin(ν)`.
pub fn position(orbit: &Orbit) -> Position {
    let a = orbit.radius_au;
    if orbit.is_circular() {
        let theta = orbit.angle_deg.to_radians();
        return Position {
            x: a * theta.cos(),
            y: a * theta.sin(),
            z: 0.0,
        };
    }
    let e = orbit.eccentricity();
    let mean_anomaly = orbit.angle_deg.to_radians();
    let big_e = solve_kepler(mean_anomaly, e).eccentric_anomaly;
    let nu = 2.0
        * ((1.0 + e).sqrt() * (big_e / 2.0).sin()).atan2((1.0 - e).sqrt() * (big_e / 2.0).cos());
    let r = a * (1.0 - e * big_e.cos());
    let theta = nu + orbit.longitude_of_perihelion().to_radians();
    Position {
        x: r * theta.cos(),
        y: r * theta.sin(),
        z: orbit.inclination().to_radians().sin() * r * nu.sin(),
    }
}

/// Planar distance between two circular orbits by the law of cosines.
pub fn circular_distance_au(a: &Orbit, b: &Orbit) -> f64 {
    let (r1, r2) = (a.radius_au, b.radius_au);
    let dtheta = (a.angle_deg - b.angle_deg).to_radians();
    // Rounding can push the radicand slightly below zero for coincident bodies.
    (r1 * r1 + r2 * r2 - 2.0 * r1 * r2 * dtheta.cos()).max(0.0).sqrt()
}

/// Distance in AU, choosing the circular model when both orbits are circles.
pub fn distance_au(a: &Orbit, b: &Orbit) -> f64 {
    if a.is_circular() && b.is_circular() {
        circular_distance_au(a, b)
    } else {
        position(a).distance(&position(b))
    }
}

/// Months needed to cover `distance_km` at [`TRANSIT_SPEED_KMH`], at least [`MIN_TRAVEL_MONTHS`].
pub fn travel_time_months(distance_km: f64) -> f64 {
    (distance_km / TRANSIT_SPEED_KMH / 24.0 / 30.0).max(MIN_TRAVEL_MONTHS)
}

/// Whole-credit cost of a shipment over `distance_au`.
///
/// Example:
/// let c = transport_cost(5.2);
/// assert_eq!(c, Decimal::new(570, 0));
pub fn transport_cost(distance_au: f64) -> Decimal {
    let raw = BASE_TRANSPORT_COST + distance_au * COST_PER_AU;
    Decimal::from(raw.round() as i64)
}

/// Everything a route needs to know about a trip between two bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub distance_au: f64,
    pub distance_km: f64,
    pub travel_time_months: f64,
    pub cost: Decimal,
}

/// Distance, travel time and cost between two bodies at their current positions.
pub fn leg(from: &CelestialBody, to: &CelestialBody) -> Leg {
    let distance_au = distance_au(&from.orbit, &to.orbit);
    let distance_km = distance_au * KM_PER_AU;
    Leg {
        distance_au,
        distance_km,
        travel_time_months: travel_time_months(distance_km),
        cost: transport_cost(distance_au),
    }
}

/// Mean anomaly after `days` have elapsed, normalized to [0, 360).
pub fn advance_angle(angle_deg: f64, period_days: f64, days: f64) -> f64 {
    let next = (angle_deg + (360.0 / period_days) * days).rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative inputs.
    if next >= 360.0 {
        0.0
    } else {
        next
    }
}

/// Advance a body's orbit in place by `days`.
pub fn advance_orbit(orbit: &mut Orbit, days: f64) {
    orbit.angle_deg = advance_angle(orbit.angle_deg, orbit.period_days, days);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn circle(r: f64, angle: f64) -> Orbit {
        Orbit::circular(r, angle, 365.25)
    }

    fn angular_gap(a: f64, b: f64) -> f64 {
        let d = (a - b).abs();
        d.min(360.0 - d)
    }

    #[test]
    fn opposite_sides_add_radii() {
        let d = circular_distance_au(&circle(1.0, 0.0), &circle(1.5, 180.0));
        assert!((d - 2.5).abs() < 1e-12);
    }

    #[test]
    fn same_position_is_zero_and_takes_min_time() {
        let a = CelestialBody::new("a", "A", circle(1.0, 30.0));
        let l = leg(&a, &a);
        assert_eq!(l.distance_au, 0.0);
        assert_eq!(l.travel_time_months, MIN_TRAVEL_MONTHS);
        assert_eq!(l.cost, Decimal::new(50, 0));
    }

    #[test]
    fn earth_to_jupiter_figures() {
        let earth = CelestialBody::new("earth", "Earth", circle(1.0, 0.0));
        let jupiter = CelestialBody::new("jupiter", "Jupiter", Orbit::circular(5.2, 0.0, 4333.0));
        let l = leg(&earth, &jupiter);
        assert!((l.distance_au - 4.2).abs() < 1e-9);
        assert_eq!(l.cost, Decimal::new(470, 0));
        let expected_months = 4.2 * KM_PER_AU / TRANSIT_SPEED_KMH / 24.0 / 30.0;
        assert!((l.travel_time_months - expected_months).abs() < 1e-9);
    }

    #[test]
    fn elliptical_at_perihelion_is_closer() {
        let orbit = Orbit::circular(2.0, 0.0, 1000.0).with_elements(0.2, 0.0, 0.0);
        let p = position(&orbit);
        assert!((p.x - 1.6).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        let aphelion = Orbit {
            angle_deg: 180.0,
            ..orbit
        };
        let q = position(&aphelion);
        assert!((q.x + 2.4).abs() < 1e-6);
    }

    #[test]
    fn inclination_lifts_out_of_plane() {
        let orbit = Orbit::circular(1.0, 90.0, 365.0).with_elements(0.01, 0.0, 30.0);
        assert!(position(&orbit).z > 0.0);
    }

    #[test]
    fn advance_wraps() {
        assert_eq!(advance_angle(350.0, 360.0, 20.0), 10.0);
        let mut o = circle(1.0, 0.0);
        advance_orbit(&mut o, 365.25);
        assert!(angular_gap(o.angle_deg, 0.0) < 1e-9);
    }

    proptest! {
        #[test]
        fn advanced_angle_in_range_and_periodic(angle in 0.0f64..360.0,
                                                period in 1.0f64..20_000.0,
                                                days in 0.0f64..100_000.0) {
            let a = advance_angle(angle, period, days);
            prop_assert!((0.0..360.0).contains(&a));
            let full = advance_angle(angle, period, period);
            prop_assert!(angular_gap(full, angle) < 1e-6);
        }

        #[test]
        fn distance_is_symmetric(r1 in 0.3f64..30.0, r2 in 0.3f64..30.0,
                                 t1 in 0.0f64..360.0, t2 in 0.0f64..360.0,
                                 e1 in 0.0f64..0.3, w in 0.0f64..360.0, inc in 0.0f64..20.0) {
            let a = circle(r1, t1);
            let b = circle(r2, t2);
            prop_assert!((distance_au(&a, &b) - distance_au(&b, &a)).abs() < 1e-9);
            let ae = circle(r1, t1).with_elements(e1, w, inc);
            prop_assert!((distance_au(&ae, &b) - distance_au(&b, &ae)).abs() < 1e-9);
        }

        #[test]
        fn kepler_converges(e in 0.0f64..0.3, m_deg in 0.0f64..360.0) {
            let m = m_deg.to_radians();
            let s = solve_kepler(m, e);
            prop_assert!(s.converged);
            prop_assert!(s.iterations <= KEPLER_MAX_ITERATIONS);
            let residual = s.eccentric_anomaly - e * s.eccentric_anomaly.sin() - m;
            prop_assert!(residual.abs() < 1e-6);
        }
    }
}
