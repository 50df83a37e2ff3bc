//! Hardware component definitions shared by the library and the model set.

use serde::{Deserialize, Serialize};

use crate::core::{Result, SurgeError};

/// Stable key for a component held in a [`ModelComponentSet`](super::ModelComponentSet).
///
/// Issued from a counter owned by the set and never reused, so mode
/// membership survives removal of other components without renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

/// A hardware item with an electrical draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,
    /// Volts
    pub voltage: f64,
    /// Amps
    pub current: f64,
    /// Kilograms; absent in older records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
}

impl Component {
    pub fn new(name: impl Into<String>, voltage: f64, current: f64) -> Self {
        Self {
            name: name.into(),
            model_number: None,
            voltage,
            current,
            mass: None,
        }
    }

    pub fn with_model_number(mut self, model_number: impl Into<String>) -> Self {
        let model_number = model_number.into();
        self.model_number = Some(model_number).filter(|m| !m.is_empty());
        self
    }

    pub fn with_mass(mut self, mass_kg: f64) -> Self {
        self.mass = Some(mass_kg);
        self
    }

    /// Power draw in watts.
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }

    /// Mass in kilograms, 0 when unset.
    pub fn mass_or_zero(&self) -> f64 {
        self.mass.unwrap_or(0.0)
    }

    /// Name with model number, as shown in component lists.
    pub fn label(&self) -> String {
        let model = self
            .model_number
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("N/A");
        format!("{} ({})", self.name, model)
    }

    /// Reject entries the forms would never have accepted.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SurgeError::InvalidInput(
                "component name must not be empty".to_string(),
            ));
        }
        if self.voltage.is_nan() {
            return Err(SurgeError::InvalidInput(format!(
                "voltage of '{}' is not a number",
                self.name
            )));
        }
        if self.current.is_nan() {
            return Err(SurgeError::InvalidInput(format!(
                "current of '{}' is not a number",
                self.name
            )));
        }
        Ok(())
    }

    /// Duplicate check used when copying between library and model.
    /// Only name, voltage and current take part; mass and model number do not.
    pub fn same_structure(&self, other: &Component) -> bool {
        self.name == other.name && self.voltage == other.voltage && self.current == other.current
    }
}
