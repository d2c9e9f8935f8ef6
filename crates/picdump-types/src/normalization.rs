use std::f64::consts::PI;

use crate::config::SimulationConfig;

/// Speed of light, cm/s.
pub const LIGHT_SPEED: f64 = 2.997_924_58e10;
/// Electron mass, g.
pub const ELECTRON_MASS: f64 = 9.109_383_56e-28;
/// Elementary charge, statC.
pub const ELEMENTARY_CHARGE: f64 = 4.8032e-10;
/// One electron-volt in erg.
pub const EV: f64 = 1.602e-12;

/// Scale factors from simulation units to reporting units.
///
/// Derived once from the configuration and shared by every timestep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizationConstants {
    /// Multiplier for `Ex`, `Ey`, `Ez`.
    pub electric: f32,
    /// Multiplier for `Bx`, `By`, `Bz`.
    pub magnetic: f32,
    /// Energy unit in eV, used for the energy-distribution axes.
    pub energy: f32,
}

impl NormalizationConstants {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_config(config: &SimulationConfig) -> Self {
        let dx = config.real_lx / config.system_l[0];
        let plasma_freq = LIGHT_SPEED / config.velocity_light / dx;
        let density = plasma_freq * plasma_freq * ELECTRON_MASS
            / (4.0 * PI * ELEMENTARY_CHARGE * ELEMENTARY_CHARGE);

        let electric = (4.0 * PI * density * ELEMENTARY_CHARGE * dx * 1.0e4 * 3.0) as f32;
        let magnetic = electric / (LIGHT_SPEED * 1.0e-2) as f32;
        let energy = (4.0 * PI * density * ELEMENTARY_CHARGE * ELEMENTARY_CHARGE * dx * dx / EV) as f32;

        Self {
            electric,
            magnetic,
            energy,
        }
    }

    /// All factors 1, for inspecting raw simulation values.
    #[must_use]
    pub fn unit() -> Self {
        Self {
            electric: 1.0,
            magnetic: 1.0,
            energy: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(a: f64, b: f64) -> f64 {
        ((a - b) / b).abs()
    }

    #[test]
    fn matches_hand_computation() {
        let mut config = SimulationConfig::sample();
        config.real_lx = 2.0e-4;
        config.system_l[0] = 20.0;
        config.velocity_light = 10.0;

        // dx = 1e-5, ω = c / 10 / 1e-5, n = ω² m / (4π e²)
        let dx = 1.0e-5;
        let omega = LIGHT_SPEED / 10.0 / dx;
        let n = omega * omega * ELECTRON_MASS / (4.0 * PI * ELEMENTARY_CHARGE.powi(2));
        let electric = 4.0 * PI * n * ELEMENTARY_CHARGE * dx * 1.0e4 * 3.0;
        let energy = 4.0 * PI * n * ELEMENTARY_CHARGE.powi(2) * dx * dx / EV;

        let k = NormalizationConstants::from_config(&config);
        assert!(rel(f64::from(k.electric), electric) < 1e-6);
        assert!(rel(f64::from(k.magnetic), electric / (LIGHT_SPEED * 1e-2)) < 1e-6);
        assert!(rel(f64::from(k.energy), energy) < 1e-6);
    }

    #[test]
    fn energy_unit_is_independent_of_dx() {
        // n ∝ 1/dx², so n·dx² cancels.
        let mut a = SimulationConfig::sample();
        let mut b = SimulationConfig::sample();
        a.real_lx = 1.0e-4;
        b.real_lx = 3.0e-4;
        let ka = NormalizationConstants::from_config(&a);
        let kb = NormalizationConstants::from_config(&b);
        assert!(rel(f64::from(ka.energy), f64::from(kb.energy)) < 1e-6);
        assert!(ka.electric > kb.electric);
    }
}
