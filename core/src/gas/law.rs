//! Real-gas pressure/volume conversions and ambient pressure.
//!
//! Cylinder contents are converted between pressure and surface volume with
//! a compressibility factor Z fitted to real-gas data, so the same function
//! backs "gas remaining" and "gas required" and the two stay comparable.

use super::GasMix;

// ============================================================================
// Physical Constants
// ============================================================================

/// Standard surface pressure (mbar).
pub const SURFACE_PRESSURE_MBAR: u32 = 1013;

/// Salinity of sea water (g per 10 l).
pub const SEAWATER_SALINITY: u32 = 10300;

/// Salinity of fresh water (g per 10 l).
pub const FRESHWATER_SALINITY: u32 = 10000;

/// Upper bound of the pressure range the virial fit was made for (bar).
const MAX_FIT_PRESSURE_BAR: f64 = 500.0;

/// Virial coefficients of Z − 1 as a cubic in pressure (bar), per gas.
const O2_COEFFICIENTS: [f64; 3] = [-7.18092073703e-04, 2.81852572808e-06, -1.50290620492e-09];
const N2_COEFFICIENTS: [f64; 3] = [-2.19260353292e-04, 2.92844845532e-06, -2.07613482075e-09];
const HE_COEFFICIENTS: [f64; 3] = [4.87320026468e-04, -8.83632921053e-08, 5.33304543646e-11];

fn virial_m1(coefficients: &[f64; 3], x1: f64, x2: f64, x3: f64) -> f64 {
    coefficients[0] * x1 + coefficients[1] * x2 + coefficients[2] * x3
}

/// Compressibility factor Z of a mix at the given pressure (bar).
pub fn compressibility_factor(gas: &GasMix, bar: f64) -> f64 {
    let x1 = bar.clamp(0.0, MAX_FIT_PRESSURE_BAR);
    let x2 = x1 * x1;
    let x3 = x2 * x1;
    let o2 = f64::from(gas.o2());
    let he = f64::from(gas.he());
    let n2 = 1000.0 - o2 - he;

    1.0 + (o2 * virial_m1(&O2_COEFFICIENTS, x1, x2, x3)
        + he * virial_m1(&HE_COEFFICIENTS, x1, x2, x3)
        + n2 * virial_m1(&N2_COEFFICIENTS, x1, x2, x3))
        / 1000.0
}

/// Pressure (bar) of `volume1_ml` of gas at `p1_bar` after isothermal
/// transfer into `volume2_ml`.
pub fn isothermal_pressure(gas: &GasMix, p1_bar: f64, volume1_ml: f64, volume2_ml: f64) -> f64 {
    if volume2_ml <= 0.0 {
        return 0.0;
    }
    let p_ideal = p1_bar * volume1_ml / volume2_ml / compressibility_factor(gas, p1_bar);
    p_ideal * compressibility_factor(gas, p_ideal)
}

/// Surface volume (ml) held by a cylinder of `size_ml` at `mbar`.
pub fn surface_volume_ml(gas: &GasMix, mbar: u32, size_ml: u32) -> f64 {
    let bar = f64::from(mbar) / 1000.0;
    bar * f64::from(size_ml) / compressibility_factor(gas, bar)
}

// ============================================================================
// Ambient pressure
// ============================================================================

/// Surface conditions of a dive: atmospheric pressure and water salinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atmosphere {
    pub surface_mbar: u32,
    pub salinity: u32,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            surface_mbar: SURFACE_PRESSURE_MBAR,
            salinity: SEAWATER_SALINITY,
        }
    }
}

impl Atmosphere {
    /// Build from stored values; zero means "unknown" and takes the default.
    /// Salinities below 500 are stored as an offset over fresh water.
    pub fn new(surface_mbar: u32, salinity: u32) -> Self {
        let surface_mbar = if surface_mbar == 0 {
            SURFACE_PRESSURE_MBAR
        } else {
            surface_mbar
        };
        let salinity = match salinity {
            0 => SEAWATER_SALINITY,
            s if s < 500 => s + FRESHWATER_SALINITY,
            s => s,
        };
        Self {
            surface_mbar,
            salinity,
        }
    }

    /// Pressure increase per mm of water (mbar/mm).
    fn specific_weight(&self) -> f64 {
        f64::from(self.salinity) * 0.981 / 100_000.0
    }

    pub fn depth_to_mbar_f(&self, depth_mm: u32) -> f64 {
        f64::from(self.surface_mbar) + f64::from(depth_mm) * self.specific_weight()
    }

    pub fn depth_to_mbar(&self, depth_mm: u32) -> u32 {
        self.depth_to_mbar_f(depth_mm).round() as u32
    }

    pub fn depth_to_bar(&self, depth_mm: u32) -> f64 {
        self.depth_to_mbar_f(depth_mm) / 1000.0
    }

    /// Altitude (mm) implied by the surface pressure, barometric approximation.
    pub fn altitude_mm(&self) -> i32 {
        ((f64::from(SURFACE_PRESSURE_MBAR) / f64::from(self.surface_mbar)).ln() * 7_800_000.0)
            .round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_near_one_at_surface() {
        for gas in [
            GasMix::AIR,
            GasMix::OXYGEN,
            GasMix::from_permille(210, 350),
        ] {
            let z = compressibility_factor(&gas, 1.0);
            assert!((z - 1.0).abs() < 0.001, "Z at 1 bar should be ~1, got {z}");
        }
    }

    #[test]
    fn test_helium_less_compressible_than_air() {
        let air = compressibility_factor(&GasMix::AIR, 232.0);
        let heliox = compressibility_factor(&GasMix::from_permille(100, 900), 232.0);
        assert!(heliox > air, "heliox Z {heliox} should exceed air Z {air}");
        assert!(heliox > 1.0);
    }

    #[test]
    fn test_z_clamped_above_fit_range() {
        let at_limit = compressibility_factor(&GasMix::AIR, 500.0);
        let beyond = compressibility_factor(&GasMix::AIR, 900.0);
        assert_eq!(at_limit, beyond);
    }

    #[test]
    fn test_isothermal_pressure_round_trip() {
        let gas = GasMix::AIR;
        let size_ml = 12_000;
        let volume = surface_volume_ml(&gas, 200_000, size_ml);
        let bar = isothermal_pressure(&gas, 1.0, volume, f64::from(size_ml));
        assert!(
            (bar - 200.0).abs() < 2.0,
            "filling 12 l with its own surface volume should give ~200 bar, got {bar}"
        );
    }

    #[test]
    fn test_isothermal_pressure_zero_volume() {
        assert_eq!(isothermal_pressure(&GasMix::AIR, 1.0, 1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_depth_to_mbar_seawater() {
        let atm = Atmosphere::default();
        assert_eq!(atm.depth_to_mbar(0), 1013);
        // 10 m of sea water: 10000 * 10300 * 0.981 / 100000 = 1010.43
        assert_eq!(atm.depth_to_mbar(10_000), 2023);
    }

    #[test]
    fn test_atmosphere_defaults_and_offsets() {
        let atm = Atmosphere::new(0, 0);
        assert_eq!(atm, Atmosphere::default());

        let fresh = Atmosphere::new(1013, 5);
        assert_eq!(fresh.salinity, FRESHWATER_SALINITY + 5);
        assert!(fresh.depth_to_mbar(10_000) < atm.depth_to_mbar(10_000));
    }

    #[test]
    fn test_altitude() {
        assert_eq!(Atmosphere::default().altitude_mm(), 0);
        let mountain = Atmosphere::new(820, 0);
        let alt_m = mountain.altitude_mm() / 1000;
        assert!((1500..1800).contains(&alt_m), "altitude {alt_m} m");
    }
}
