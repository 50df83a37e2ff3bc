//! Per-mode power and energy totals.
//!
//! Recomputed from scratch on every call; nothing here caches state.

use serde::Serialize;

use crate::model::{ModeSet, ModelComponentSet};

/// Totals for one operating mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeTotals {
    pub name: String,
    pub active_count: usize,
    /// Watts
    pub power_w: f64,
    /// Hours
    pub duration_h: f64,
    /// Watt-hours
    pub energy_wh: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub modes: Vec<ModeTotals>,
    /// Sum of every mode's power.
    pub total_power_w: f64,
    pub total_duration_h: f64,
    /// `total_power_w * total_duration_h`. Kept for compatibility with
    /// existing budgets; it is not the energy of one pass through the modes.
    pub total_energy_wh: f64,
    /// Sum of every mode's energy; the energy of one duty cycle.
    pub cycle_energy_wh: f64,
}

impl BudgetSummary {
    pub fn mode(&self, name: &str) -> Option<&ModeTotals> {
        self.modes.iter().find(|m| m.name == name)
    }
}

pub fn aggregate(components: &ModelComponentSet, modes: &ModeSet) -> BudgetSummary {
    let mut summary = BudgetSummary::default();

    for mode in modes.iter() {
        let power_w: f64 = mode
            .active_ids()
            .filter_map(|id| components.by_id(id))
            .map(|c| c.power())
            .sum();
        let energy_wh = power_w * mode.duration;

        summary.total_power_w += power_w;
        summary.total_duration_h += mode.duration;
        summary.cycle_energy_wh += energy_wh;
        summary.modes.push(ModeTotals {
            name: mode.name.clone(),
            active_count: mode.active_count(),
            power_w,
            duration_h: mode.duration,
            energy_wh,
        });
    }

    summary.total_energy_wh = summary.total_power_w * summary.total_duration_h;

    tracing::debug!(
        "Aggregated {} mode(s): {:.2} W total, {:.2} Wh",
        summary.modes.len(),
        summary.total_power_w,
        summary.total_energy_wh
    );
    summary
}
