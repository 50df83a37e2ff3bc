//! SURGE - spacecraft power budget engine
//!
//! This library keeps the electrical side of a spacecraft budget: a catalog
//! of components, the components assigned to a mission model, the operating
//! modes that switch them on, and the power, energy and battery figures
//! derived from them.
//!
//! # Quick Start
//!
//! ```
//! use surge::prelude::*;
//!
//! let mut session = Session::new(MemoryStore::new());
//! session.add_component(Component::new("Payload", 5.0, 2.0)).unwrap();
//! session.add_component(Component::new("Radio", 12.0, 1.0)).unwrap();
//! session.add_mode("Peak", "1", None).unwrap();
//! session.toggle_component(0, 0).unwrap();
//! session.toggle_component(0, 1).unwrap();
//!
//! assert_eq!(session.summary().total_power_w, 22.0);
//! ```
//!
//! # Features
//!
//! - **Index-stable modes**: removing a component never shifts another
//!   component in or out of a mode
//! - **Aggregation**: per-mode power and energy, totals, duty-cycle energy
//! - **Battery sizing**: capacity in Ah and Wh from DoD, efficiency and bus voltage
//! - **Persistence**: pluggable key-value stores (memory, SQLite) and JSON
//!   project snapshots

pub mod aggregation;
pub mod battery;
pub mod core;
pub mod model;
pub mod numeric;
pub mod persistence;
pub mod session;

// Re-export main types
pub use aggregation::{aggregate, BudgetSummary, ModeTotals};
pub use battery::{analyze_battery, size_battery, BatteryAnalysis, BatteryParameters, BatterySizing};
pub use crate::core::{
    BudgetOptions, BudgetReport, EnergyBasis, IndexKind, SurgeCore, SurgeError,
};
pub use model::{Component, ComponentId, ComponentLibrary, Mode, ModeRecord, ModeSet, ModelComponentSet, PowerModel};
pub use numeric::parse_float_lenient;
pub use persistence::{KeyValueStore, MemoryStore, ProjectSnapshot, SqliteStore, StoreError};
pub use session::Session;

/// Build a report from a project file (convenience wrapper).
pub fn report_file(
    path: &std::path::Path,
    options: BudgetOptions,
) -> Result<BudgetReport, SurgeError> {
    SurgeCore::report_file(path, options)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BatteryParameters, BatterySizing, BudgetOptions, BudgetReport, BudgetSummary, Component,
        EnergyBasis, KeyValueStore, MemoryStore, ProjectSnapshot, Session, SurgeCore, SurgeError,
    };
}
