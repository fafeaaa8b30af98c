//! TOML-based scenario configuration: battery, delivery, and sweep parameters.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigIssue;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the built-in default scenario. Load
/// from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::default_scenario`] directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery technical specification.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Binary delivery target and charge threshold.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Capacity sweep range and optimal-size rule.
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Immutable battery technical specification.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// SOC lower bound, fraction of capacity.
    pub soc_min: f32,
    /// SOC upper bound, fraction of capacity.
    pub soc_max: f32,
    /// Initial SOC, fraction of capacity.
    pub soc_init: f32,
    /// Round-trip efficiency. One-way efficiency applied per direction is `sqrt(eta_rt)`.
    pub eta_rt: f32,
    /// Charge C-rate, multiple of capacity per hour.
    pub c_charge: f32,
    /// Discharge C-rate, multiple of capacity per hour.
    pub c_discharge: f32,
    /// Maximum state-transition cycles allowed per day.
    pub max_cycles_per_day: f32,
    /// Capacity fraction lost per full equivalent cycle.
    pub degradation_per_cycle: f32,
    /// Parasitic per-hour draw, fraction of capacity.
    pub aux_load_pct: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            soc_min: 0.05,
            soc_max: 0.95,
            soc_init: 0.50,
            eta_rt: 0.87,
            c_charge: 1.0,
            c_discharge: 1.0,
            max_cycles_per_day: 2.0,
            degradation_per_cycle: 1.5e-5,
            aux_load_pct: 0.0,
        }
    }
}

impl BatteryConfig {
    /// One-way efficiency applied per transfer direction: `sqrt(eta_rt)`.
    pub fn eta_one_way(&self) -> f32 {
        self.eta_rt.sqrt()
    }
}

/// Binary delivery target and charge threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Fixed per-hour delivery magnitude. Delivery is 0 or this value, never partial.
    pub target_mw: f32,
    /// Minimum excess solar required to initiate charging.
    pub charge_threshold_mw: f32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            target_mw: 25.0,
            charge_threshold_mw: 0.0,
        }
    }
}

/// Capacity sweep range and the optimal-size marginal-gain rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Smallest capacity tested (MWh).
    pub size_min: f32,
    /// Largest capacity tested (MWh), inclusive if reached exactly by the step.
    pub size_max: f32,
    /// Capacity increment between tested sizes (MWh).
    pub size_step: f32,
    /// Forward marginal hours/MWh below which a capacity is diminishing-returns.
    pub marginal_threshold: f32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            size_min: 10.0,
            size_max: 500.0,
            size_step: 5.0,
            marginal_threshold: 30.0,
        }
    }
}

impl ScenarioConfig {
    /// Returns the built-in default scenario.
    pub fn default_scenario() -> Self {
        Self {
            battery: BatteryConfig::default(),
            delivery: DeliveryConfig::default(),
            sweep: SweepConfig::default(),
        }
    }

    /// A tighter daily-cycle-budget preset: fewer cycles, lower degradation risk.
    pub fn small_daily_cycle() -> Self {
        Self {
            battery: BatteryConfig {
                max_cycles_per_day: 1.0,
                degradation_per_cycle: 1.0e-5,
                ..BatteryConfig::default()
            },
            delivery: DeliveryConfig::default(),
            sweep: SweepConfig::default(),
        }
    }

    /// A wide, fine-grained sweep preset for exploratory sizing runs.
    pub fn aggressive_sweep() -> Self {
        Self {
            battery: BatteryConfig::default(),
            delivery: DeliveryConfig::default(),
            sweep: SweepConfig {
                size_min: 5.0,
                size_max: 800.0,
                size_step: 2.5,
                ..SweepConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "small_daily_cycle", "aggressive_sweep"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigIssue` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigIssue> {
        match name {
            "default" => Ok(Self::default_scenario()),
            "small_daily_cycle" => Ok(Self::small_daily_cycle()),
            "aggressive_sweep" => Ok(Self::aggressive_sweep()),
            _ => Err(ConfigIssue::error(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigIssue` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigIssue> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigIssue::error("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigIssue` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigIssue> {
        toml::from_str(s).map_err(|e| ConfigIssue::error("toml", e.to_string()))
    }

    /// Validates every config rule and returns all findings (both
    /// error- and warn-severity). An empty vector means the scenario is
    /// clean; the presence of any error-severity issue means simulation
    /// must not run.
    ///
    /// `solar_avg_mw`, when known, enables the solar/target ratio warning.
    pub fn validate(&self, solar_avg_mw: Option<f32>) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let b = &self.battery;
        let s = &self.sweep;

        if !(b.soc_min < b.soc_max) {
            issues.push(ConfigIssue::error("battery.soc_min", "must be < battery.soc_max"));
        }
        if !(b.soc_min <= b.soc_init && b.soc_init <= b.soc_max) {
            issues.push(ConfigIssue::error(
                "battery.soc_init",
                "must be within [battery.soc_min, battery.soc_max]",
            ));
        }
        if b.soc_max - b.soc_min < 0.20 {
            issues.push(ConfigIssue::error(
                "battery.soc_max",
                "operating window (soc_max - soc_min) must be >= 0.20",
            ));
        }
        if !(s.size_min < s.size_max) {
            issues.push(ConfigIssue::error("sweep.size_min", "must be < sweep.size_max"));
        }
        if !(s.size_step > 0.0) {
            issues.push(ConfigIssue::error("sweep.size_step", "must be > 0"));
        }
        if s.size_min < 5.0 {
            issues.push(ConfigIssue::warn("sweep.size_min", "below the recommended 5 MWh floor"));
        }
        if !(b.eta_rt > 0.0 && b.eta_rt < 1.0) {
            issues.push(ConfigIssue::error("battery.eta_rt", "must be in (0, 1)"));
        }
        if !(b.c_charge > 0.0 && b.c_charge <= 2.0) {
            issues.push(ConfigIssue::error("battery.c_charge", "must be in (0, 2]"));
        }
        if !(b.c_discharge > 0.0 && b.c_discharge <= 2.0) {
            issues.push(ConfigIssue::error("battery.c_discharge", "must be in (0, 2]"));
        }
        if let Some(avg) = solar_avg_mw {
            if self.delivery.target_mw > 0.0 && avg / self.delivery.target_mw < 1.2 {
                issues.push(ConfigIssue::warn(
                    "delivery.target_mw",
                    "solar/target ratio below 1.2 — deliveries may be solar-constrained",
                ));
            }
        }
        let count = ((s.size_max - s.size_min) / s.size_step).floor() as i64 + 1;
        if count > 100 {
            issues.push(ConfigIssue::warn(
                "sweep.size_step",
                format!("sweep tests {count} capacities, exceeding the recommended 100"),
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_is_valid() {
        let cfg = ScenarioConfig::default_scenario();
        let issues = cfg.validate(None);
        assert!(issues.iter().all(|i| !i.is_fatal()), "defaults should have no errors: {issues:?}");
    }

    #[test]
    fn from_preset_default() {
        let cfg = ScenarioConfig::from_preset("default");
        assert!(cfg.is_ok());
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        assert!(err.unwrap_err().message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).unwrap_or_else(|_| panic!("preset {name} should load"));
            let issues = cfg.validate(None);
            assert!(
                issues.iter().all(|i| !i.is_fatal()),
                "preset \"{name}\" should have no errors: {issues:?}"
            );
        }
    }

    #[test]
    fn small_daily_cycle_has_tighter_cap() {
        let base = ScenarioConfig::default_scenario();
        let small = ScenarioConfig::small_daily_cycle();
        assert!(small.battery.max_cycles_per_day < base.battery.max_cycles_per_day);
    }

    #[test]
    fn aggressive_sweep_has_finer_step() {
        let base = ScenarioConfig::default_scenario();
        let aggressive = ScenarioConfig::aggressive_sweep();
        assert!(aggressive.sweep.size_step < base.sweep.size_step);
        assert!(aggressive.sweep.size_max > base.sweep.size_max);
    }

    #[test]
    fn validate_catches_soc_ordering() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.battery.soc_min = 0.9;
        cfg.battery.soc_max = 0.1;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "battery.soc_min" && i.is_fatal()));
    }

    #[test]
    fn validate_catches_narrow_operating_window() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.battery.soc_min = 0.40;
        cfg.battery.soc_max = 0.50;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "battery.soc_max" && i.is_fatal()));
    }

    #[test]
    fn validate_catches_soc_init_out_of_range() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.battery.soc_init = 1.5;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "battery.soc_init" && i.is_fatal()));
    }

    #[test]
    fn validate_catches_bad_size_ordering() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.sweep.size_min = 600.0;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "sweep.size_min" && i.is_fatal()));
    }

    #[test]
    fn validate_catches_nonpositive_step() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.sweep.size_step = 0.0;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "sweep.size_step" && i.is_fatal()));
    }

    #[test]
    fn validate_warns_on_small_minimum_size() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.sweep.size_min = 2.0;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "sweep.size_min" && !i.is_fatal()));
    }

    #[test]
    fn validate_catches_rte_out_of_bounds() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.battery.eta_rt = 1.2;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "battery.eta_rt" && i.is_fatal()));
    }

    #[test]
    fn validate_catches_crate_out_of_bounds() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.battery.c_charge = 3.0;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "battery.c_charge" && i.is_fatal()));
    }

    #[test]
    fn validate_warns_on_low_solar_ratio() {
        let cfg = ScenarioConfig::default_scenario();
        let issues = cfg.validate(Some(10.0));
        assert!(issues.iter().any(|i| i.field == "delivery.target_mw" && !i.is_fatal()));
    }

    #[test]
    fn validate_warns_on_large_capacity_count() {
        let mut cfg = ScenarioConfig::default_scenario();
        cfg.sweep.size_max = 10000.0;
        let issues = cfg.validate(None);
        assert!(issues.iter().any(|i| i.field == "sweep.size_step" && !i.is_fatal()));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = "[battery]\nsoc_min = 0.1\nbogus_field = true\n";
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = "[delivery]\ntarget_mw = 40.0\n";
        let cfg = ScenarioConfig::from_toml_str(toml).expect("valid toml should parse");
        assert_eq!(cfg.delivery.target_mw, 40.0);
        assert_eq!(cfg.battery.soc_min, 0.05);
    }
}
