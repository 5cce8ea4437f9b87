//! Isobaric counterdiffusion check for gas switches leaving a helium mix.
//!
//! Switching from a helium-rich mix to a nitrogen-rich one at constant
//! depth can load tissues faster than they off-gas. The usual rule of thumb
//! limits the nitrogen increase to a fifth of the helium drop.

use serde::{Deserialize, Serialize};

use crate::gas::{Atmosphere, GasMix};
use crate::reducer::GasChangeEvent;

/// Largest tolerated N2 increase, as a divisor of the helium drop.
const ICD_RATIO: i32 = 5;

/// Fraction changes (permille) across one gas switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counterdiffusion {
    pub delta_he: i32,
    pub delta_n2: i32,
}

impl Counterdiffusion {
    pub fn between(from: &GasMix, to: &GasMix) -> Self {
        let inert_or_o2 = |g: &GasMix| (g.he() + g.o2()) as i32;
        Self {
            delta_he: to.he() as i32 - from.he() as i32,
            delta_n2: inert_or_o2(from) - inert_or_o2(to),
        }
    }

    /// Nitrogen rises by more than a fifth of the helium drop. A helium
    /// increase tightens the limit instead of lifting it.
    pub fn is_violation(&self) -> bool {
        ICD_RATIO * self.delta_n2 > -self.delta_he
    }
}

/// One row of the ICD table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct IcdEntry {
    pub time_s: u32,
    pub ambient_mbar: u32,
    pub from: GasMix,
    pub to: GasMix,
    pub delta_he_permille: i32,
    pub delta_n2_permille: i32,
    pub delta_he_bar: f64,
    pub delta_n2_bar: f64,
    /// Largest N2 increase the rule allows for this helium drop (bar).
    pub max_delta_n2_bar: f64,
    pub violation: bool,
}

impl IcdEntry {
    pub fn new(time_s: u32, ambient_mbar: u32, from: GasMix, to: GasMix) -> Self {
        let d = Counterdiffusion::between(&from, &to);
        let ambient = f64::from(ambient_mbar);
        Self {
            time_s,
            ambient_mbar,
            from,
            to,
            delta_he_permille: d.delta_he,
            delta_n2_permille: d.delta_n2,
            delta_he_bar: ambient * f64::from(d.delta_he) / 1e6,
            delta_n2_bar: ambient * f64::from(d.delta_n2) / 1e6,
            max_delta_n2_bar: ambient * f64::from(-d.delta_he) / (f64::from(ICD_RATIO) * 1e6),
            violation: d.is_violation(),
        }
    }

    pub fn delta_he_percent(&self) -> f64 {
        f64::from(self.delta_he_permille) / 10.0
    }

    pub fn delta_n2_percent(&self) -> f64 {
        f64::from(self.delta_n2_permille) / 10.0
    }

    pub fn max_delta_n2_percent(&self) -> f64 {
        f64::from(-self.delta_he_permille) / (f64::from(ICD_RATIO) * 10.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct IcdTable {
    pub entries: Vec<IcdEntry>,
    /// At least one entry violates the rule.
    pub warning: bool,
}

/// Builds the ICD table from the gas changes of a reduced plan.
pub fn evaluate(changes: &[GasChangeEvent], atmosphere: &Atmosphere) -> IcdTable {
    let entries: Vec<IcdEntry> = changes
        .iter()
        .filter(|c| c.from.has_helium())
        .map(|c| IcdEntry::new(c.time_s, atmosphere.depth_to_mbar(c.depth_mm), c.from, c.to))
        .collect();
    let warning = entries.iter().any(|e| e.violation);
    if warning {
        tracing::warn!(
            entries = entries.len(),
            "isobaric counterdiffusion limit exceeded"
        );
    }
    IcdTable { entries, warning }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX21_35: GasMix = GasMix::from_permille(210, 350);

    #[test]
    fn test_violation_threshold() {
        // He drops 5.0 %, N2 rises 1.2 %: 5 x 12 = 60 > 50
        let d = Counterdiffusion::between(&TX21_35, &GasMix::from_permille(248, 300));
        assert_eq!(d, Counterdiffusion { delta_he: -50, delta_n2: 12 });
        assert!(d.is_violation());

        // N2 rises 0.9 %: 5 x 9 = 45 < 50
        let d = Counterdiffusion::between(&TX21_35, &GasMix::from_permille(251, 300));
        assert_eq!(d.delta_n2, 9);
        assert!(!d.is_violation());
    }

    #[test]
    fn test_exact_ratio_is_not_violation() {
        let d = Counterdiffusion {
            delta_he: -50,
            delta_n2: 10,
        };
        assert!(!d.is_violation());
    }

    #[test]
    fn test_nitrogen_and_helium_rising_violates() {
        // 21/35 to 10/40: He +5.0 %, N2 +6.0 %
        let entry = IcdEntry::new(600, 4000, TX21_35, GasMix::from_permille(100, 400));
        assert_eq!(entry.delta_he_permille, 50);
        assert_eq!(entry.delta_n2_permille, 60);
        assert!(entry.violation);
    }

    #[test]
    fn test_nitrogen_drop_does_not_violate() {
        let d = Counterdiffusion::between(&GasMix::AIR, &TX21_35);
        assert!(d.delta_he > 0);
        assert!(d.delta_n2 < 0);
        assert!(!d.is_violation());
    }

    #[test]
    fn test_switch_to_ean50_at_21m() {
        let atm = Atmosphere::default();
        let ambient = atm.depth_to_mbar(21_000);
        let entry = IcdEntry::new(1440, ambient, TX21_35, GasMix::from_permille(500, 0));
        assert_eq!(entry.delta_he_permille, -350);
        assert_eq!(entry.delta_n2_permille, 60);
        assert!(!entry.violation);
        assert!((entry.delta_he_percent() + 35.0).abs() < 1e-9);
        assert!((entry.max_delta_n2_percent() - 7.0).abs() < 1e-9);
        let expected_bar = f64::from(ambient) * -350.0 / 1e6;
        assert!((entry.delta_he_bar - expected_bar).abs() < 1e-9);
        assert!((entry.max_delta_n2_bar - -expected_bar / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_ignores_helium_free_departures() {
        let changes = [
            GasChangeEvent {
                time_s: 600,
                depth_mm: 30_000,
                from: GasMix::AIR,
                to: GasMix::from_permille(500, 0),
            },
            GasChangeEvent {
                time_s: 900,
                depth_mm: 21_000,
                from: TX21_35,
                to: GasMix::from_permille(248, 300),
            },
        ];
        let table = evaluate(&changes, &Atmosphere::default());
        assert_eq!(table.entries.len(), 1);
        assert_eq!(table.entries[0].time_s, 900);
        assert!(table.warning);
    }
}
