//! Battery capacity sizing from the energy budget.

use serde::{Deserialize, Serialize};

use crate::aggregation::BudgetSummary;

/// Sizing inputs as entered on the form: percents for DoD and efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryParameters {
    pub depth_of_discharge_pct: f64,
    pub efficiency_pct: f64,
    pub bus_voltage_v: f64,
}

impl Default for BatteryParameters {
    fn default() -> Self {
        Self {
            depth_of_discharge_pct: 80.0,
            efficiency_pct: 90.0,
            bus_voltage_v: 28.0,
        }
    }
}

impl BatteryParameters {
    /// Read the three form fields; unparseable text becomes 0 and so fails
    /// the sizing guard.
    pub fn depth_of_discharge(&self) -> f64 {
        self.depth_of_discharge_pct / 100.0
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency_pct / 100.0
    }

    pub fn is_valid(&self) -> bool {
        self.depth_of_discharge() > 0.0 && self.efficiency() > 0.0 && self.bus_voltage_v > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatterySizing {
    Sized {
        energy_wh: f64,
        capacity_ah: f64,
        capacity_wh: f64,
        bus_voltage_v: f64,
    },
    InvalidParameters,
}

/// Capacity needed to deliver `energy_wh` per cycle.
///
/// ```text
/// Ah = energy / (bus * dod * efficiency)
/// Wh = Ah * bus
/// ```
pub fn size_battery(energy_wh: f64, params: &BatteryParameters) -> BatterySizing {
    if !params.is_valid() {
        return BatterySizing::InvalidParameters;
    }
    let capacity_ah =
        energy_wh / (params.bus_voltage_v * params.depth_of_discharge() * params.efficiency());
    let capacity_wh = capacity_ah * params.bus_voltage_v;
    if !capacity_ah.is_finite() || !capacity_wh.is_finite() {
        return BatterySizing::InvalidParameters;
    }
    BatterySizing::Sized {
        energy_wh,
        capacity_ah,
        capacity_wh,
        bus_voltage_v: params.bus_voltage_v,
    }
}

/// Energy used against required capacity, on the duty-cycle basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryAnalysis {
    pub energy_used_wh: f64,
    pub required_capacity_wh: f64,
    pub required_capacity_ah: f64,
    pub margin_pct: f64,
}

pub fn analyze_battery(summary: &BudgetSummary, params: &BatteryParameters) -> BatteryAnalysis {
    let energy_used_wh = summary.cycle_energy_wh;
    let required_capacity_wh =
        finite_or_zero(energy_used_wh / (params.depth_of_discharge() * params.efficiency()));
    let required_capacity_ah = finite_or_zero(required_capacity_wh / params.bus_voltage_v);
    let margin_pct = finite_or_zero(
        (required_capacity_wh - energy_used_wh).max(0.0) / required_capacity_wh.max(1.0) * 100.0,
    );

    BatteryAnalysis {
        energy_used_wh,
        required_capacity_wh,
        required_capacity_ah,
        margin_pct,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
