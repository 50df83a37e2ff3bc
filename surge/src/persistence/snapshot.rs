//! Project snapshot file: everything needed to restore a session.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::battery::BatteryParameters;
use crate::core::{Result, SurgeError};
use crate::model::{Component, ModeRecord};
use crate::numeric::parse_float_lenient;

/// Export/import envelope.
///
/// The three collections are required on import. Battery inputs travel as
/// the text typed into the form; numbers are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub current_model: Option<String>,
    pub global_components: Vec<Component>,
    pub components: Vec<Component>,
    pub modes: Vec<ModeRecord>,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub model_desc: String,
    #[serde(default, deserialize_with = "form_value")]
    pub dod: Option<String>,
    #[serde(default, deserialize_with = "form_value")]
    pub efficiency: Option<String>,
    #[serde(default, deserialize_with = "form_value")]
    pub bus_voltage: Option<String>,
    #[serde(default)]
    pub export_date: Option<String>,
}

impl ProjectSnapshot {
    /// Parse a snapshot file. Any shape problem is an `ImportFormat` error.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ProjectSnapshot =
            serde_json::from_str(json).map_err(|e| SurgeError::ImportFormat(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Components that the forms would have refused make the file invalid.
    pub fn validate(&self) -> Result<()> {
        for c in self.global_components.iter().chain(self.components.iter()) {
            c.validate()
                .map_err(|e| SurgeError::ImportFormat(e.to_string()))?;
        }
        Ok(())
    }

    /// Battery inputs over the defaults.
    pub fn battery_parameters(&self) -> BatteryParameters {
        self.battery_parameters_over(&BatteryParameters::default())
    }

    /// Battery inputs layered over `current`. A field only changes when the
    /// file carries a non-empty value for it.
    pub fn battery_parameters_over(&self, current: &BatteryParameters) -> BatteryParameters {
        BatteryParameters {
            depth_of_discharge_pct: form_field(&self.dod, current.depth_of_discharge_pct),
            efficiency_pct: form_field(&self.efficiency, current.efficiency_pct),
            bus_voltage_v: form_field(&self.bus_voltage, current.bus_voltage_v),
        }
    }

    pub fn set_battery_parameters(&mut self, params: &BatteryParameters) {
        self.dod = Some(params.depth_of_discharge_pct.to_string());
        self.efficiency = Some(params.efficiency_pct.to_string());
        self.bus_voltage = Some(params.bus_voltage_v.to_string());
    }

    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.export_date = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    /// Suggested download name: `surge-project-<model>-<date>.json`.
    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        format!(
            "surge-project-{}-{}.json",
            self.current_model.as_deref().unwrap_or("untitled"),
            now.format("%Y-%m-%d")
        )
    }
}

fn form_field(value: &Option<String>, current: f64) -> f64 {
    match value.as_deref() {
        Some(text) if !text.is_empty() => parse_float_lenient(text),
        _ => current,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FormValue {
    Text(String),
    Number(f64),
}

fn form_value<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<FormValue> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        FormValue::Text(s) => s,
        FormValue::Number(n) => n.to_string(),
    }))
}
