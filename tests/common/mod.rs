//! Shared test fixtures for integration tests.

use bess_sizer::config::{BatteryConfig, DeliveryConfig, SweepConfig};
use bess_sizer::sim::types::{SolarProfile, HOURS_PER_YEAR};

/// Default battery spec matching the scenario defaults.
pub fn default_battery_config() -> BatteryConfig {
    BatteryConfig {
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

/// Default delivery target (25 MW, no charge threshold).
pub fn default_delivery_config() -> DeliveryConfig {
    DeliveryConfig {
        target_mw: 25.0,
        charge_threshold_mw: 0.0,
    }
}

/// A small, fast sweep range for integration tests.
pub fn small_sweep_config() -> SweepConfig {
    SweepConfig {
        size_min: 50.0,
        size_max: 200.0,
        size_step: 50.0,
        marginal_threshold: 30.0,
    }
}

/// A one-year solar profile with a flat daytime plateau (hours 6..18 inclusive-exclusive)
/// and zero at night, repeated for every day of the year.
pub fn daytime_plateau_profile(peak_mw: f32) -> SolarProfile {
    let mut hours = Vec::with_capacity(HOURS_PER_YEAR);
    for h in 0..HOURS_PER_YEAR {
        let hod = h % 24;
        hours.push(if (6..18).contains(&hod) { peak_mw } else { 0.0 });
    }
    SolarProfile::new(hours).expect("plateau profile should be valid")
}

/// A constant-value profile for every hour of the year.
pub fn flat_profile(value_mw: f32) -> SolarProfile {
    SolarProfile::new(vec![value_mw; HOURS_PER_YEAR]).expect("flat profile should be valid")
}
