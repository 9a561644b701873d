//! Physical host power consumption models.

use dyn_clone::{clone_trait_object, DynClone};

/// Power model is a function, which computes the power consumption of a physical host
/// based on its peak power and current CPU load.
pub trait PowerModel: DynClone {
    /// Returns the power consumption of a physical host.
    ///
    /// - `peak_power` - host power consumption when its CPU is fully loaded.
    /// - `cpu_load` - host CPU load relative to the capacity admitted by its commitment level.
    fn get_power(&self, peak_power: f64, cpu_load: f64) -> f64;
}

clone_trait_object!(PowerModel);

/// Simple linear power model.
///
/// Computes host power consumption as `idle + cpu_load * (peak - idle)`, where idle power is a fixed
/// share of the peak power (60% by default).
///
/// If CPU load is zero, then it is assumed that the host is powered off and its power consumption is zero.
#[derive(Clone)]
pub struct LinearPowerModel {
    idle_ratio: f64,
}

impl LinearPowerModel {
    /// Default constructor, idle power is 60% of peak power.
    pub fn new() -> Self {
        Self { idle_ratio: 0.6 }
    }

    /// - `idle_ratio` - host idle power relative to its peak power.
    pub fn new_with_idle_ratio(idle_ratio: f64) -> Self {
        Self { idle_ratio }
    }
}

impl Default for LinearPowerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerModel for LinearPowerModel {
    fn get_power(&self, peak_power: f64, cpu_load: f64) -> f64 {
        if cpu_load == 0. {
            return 0.;
        }
        let idle_power = self.idle_ratio * peak_power;
        idle_power + cpu_load * (peak_power - idle_power)
    }
}
