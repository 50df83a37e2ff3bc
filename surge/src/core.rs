//! Core report logic shared by the session and the CLI.
//! No storage or presentation dependencies.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregation::{aggregate, BudgetSummary};
use crate::battery::{analyze_battery, size_battery, BatteryAnalysis, BatteryParameters, BatterySizing};
use crate::model::PowerModel;
use crate::persistence::snapshot::ProjectSnapshot;
use crate::persistence::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SurgeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
    #[error("Component already exists: {0}")]
    DuplicateComponent(String),
    #[error("Mode already exists: {0}")]
    DuplicateMode(String),
    #[error("Invalid file format: {0}")]
    ImportFormat(String),
    #[error("No current model")]
    NoCurrentModel,
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SurgeError>;

/// Which collection an out-of-range index was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Component,
    LibraryComponent,
    Mode,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Component => write!(f, "component"),
            IndexKind::LibraryComponent => write!(f, "library component"),
            IndexKind::Mode => write!(f, "mode"),
        }
    }
}

pub(crate) fn check_index(kind: IndexKind, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(SurgeError::IndexOutOfRange { kind, index, len })
    }
}

/// Energy figure used to size the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyBasis {
    /// Sum of all mode powers times the sum of all durations.
    #[default]
    Literal,
    /// Sum over modes of power times that mode's duration.
    DutyCycle,
}

impl EnergyBasis {
    pub fn energy_wh(&self, summary: &BudgetSummary) -> f64 {
        match self {
            EnergyBasis::Literal => summary.total_energy_wh,
            EnergyBasis::DutyCycle => summary.cycle_energy_wh,
        }
    }
}

/// Options for report runs (CLI or session).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BudgetOptions {
    pub energy_basis: EnergyBasis,
    /// Overrides the battery parameters stored in a snapshot.
    #[serde(default)]
    pub battery: Option<BatteryParameters>,
}

/// Everything a presentation layer needs to render one project.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub model_name: Option<String>,
    pub component_count: usize,
    pub library_count: usize,
    pub summary: BudgetSummary,
    pub energy_basis: EnergyBasis,
    pub parameters: BatteryParameters,
    pub battery: BatterySizing,
    pub analysis: BatteryAnalysis,
    /// Mode references dropped because they pointed at no component.
    pub dropped_references: usize,
}

impl BudgetReport {
    pub fn battery_is_valid(&self) -> bool {
        matches!(self.battery, BatterySizing::Sized { .. })
    }
}

/// Stateless report API used by the CLI.
pub struct SurgeCore;

impl SurgeCore {
    /// Read a project file and build its report.
    pub fn report_file(path: &Path, options: BudgetOptions) -> Result<BudgetReport> {
        let text = std::fs::read_to_string(path)?;
        let snapshot = ProjectSnapshot::from_json(&text)?;
        Self::report(&snapshot, options)
    }

    /// Build a report from an already parsed snapshot.
    pub fn report(snapshot: &ProjectSnapshot, options: BudgetOptions) -> Result<BudgetReport> {
        let (model, dropped_references) =
            PowerModel::from_records(snapshot.components.clone(), &snapshot.modes)
                .map_err(|e| SurgeError::ImportFormat(e.to_string()))?;

        let summary = aggregate(model.components(), model.modes());
        let parameters = options
            .battery
            .unwrap_or_else(|| snapshot.battery_parameters());
        let battery = size_battery(options.energy_basis.energy_wh(&summary), &parameters);
        let analysis = analyze_battery(&summary, &parameters);

        let model_name = snapshot
            .current_model
            .clone()
            .or_else(|| Some(snapshot.model_name.clone()).filter(|n| !n.is_empty()));

        Ok(BudgetReport {
            model_name,
            component_count: model.components().len(),
            library_count: snapshot.global_components.len(),
            summary,
            energy_basis: options.energy_basis,
            parameters,
            battery,
            analysis,
            dropped_references,
        })
    }
}
