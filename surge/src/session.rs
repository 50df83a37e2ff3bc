//! In-memory editing session.
//!
//! Owns the library, the power model, model metadata and battery inputs.
//! Every mutation validates, applies, writes the touched records through the
//! injected store and recomputes the summary before returning.

use chrono::{DateTime, Utc};

use crate::aggregation::{aggregate, BudgetSummary};
use crate::battery::{analyze_battery, size_battery, BatteryAnalysis, BatteryParameters, BatterySizing};
use crate::core::{check_index, BudgetOptions, IndexKind, Result, SurgeError};
use crate::model::{Component, ComponentLibrary, PowerModel};
use crate::numeric::parse_float_lenient;
use crate::persistence::{self, KeyValueStore, NamedModelRecord, ProjectSnapshot, StoreResult};

pub struct Session<S: KeyValueStore> {
    store: S,
    library: ComponentLibrary,
    model: PowerModel,
    current_model: Option<String>,
    model_name: String,
    model_description: String,
    battery: BatteryParameters,
    options: BudgetOptions,
    summary: BudgetSummary,
}

impl<S: KeyValueStore> Session<S> {
    /// Start with a clean slate; stored state is only read by [`Session::restore`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            library: ComponentLibrary::new(),
            model: PowerModel::new(),
            current_model: None,
            model_name: String::new(),
            model_description: String::new(),
            battery: BatteryParameters::default(),
            options: BudgetOptions::default(),
            summary: BudgetSummary::default(),
        }
    }

    pub fn with_options(mut self, options: BudgetOptions) -> Self {
        if let Some(battery) = options.battery {
            self.battery = battery;
        }
        self.options = options;
        self
    }

    /// Load library, model set and modes from the store.
    ///
    /// Returns the number of mode references dropped because they pointed
    /// past the end of the stored component list.
    pub fn restore(&mut self) -> Result<usize> {
        let library = persistence::load_library(&self.store)?;
        let components = persistence::load_components(&self.store)?;
        let modes = persistence::load_modes(&self.store)?;

        let library = ComponentLibrary::from_components(library)?;
        let (model, dropped) = PowerModel::from_records(components, &modes)?;

        self.library = library;
        self.model = model;
        self.recompute();
        tracing::info!(
            "Restored {} library component(s), {} model component(s), {} mode(s)",
            self.library.len(),
            self.model.components().len(),
            self.model.modes().len()
        );
        Ok(dropped)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn library(&self) -> &ComponentLibrary {
        &self.library
    }

    pub fn model(&self) -> &PowerModel {
        &self.model
    }

    pub fn summary(&self) -> &BudgetSummary {
        &self.summary
    }

    pub fn current_model(&self) -> Option<&str> {
        self.current_model.as_deref()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_description(&self) -> &str {
        &self.model_description
    }

    pub fn options(&self) -> &BudgetOptions {
        &self.options
    }

    // Library

    pub fn add_library_component(&mut self, component: Component) -> Result<usize> {
        let index = self.library.add(component)?;
        self.persist_library();
        Ok(index)
    }

    pub fn remove_library_component(&mut self, index: usize) -> Result<Component> {
        let removed = self.library.remove(index)?;
        self.persist_library();
        Ok(removed)
    }

    /// Copy a library entry into the model set unless a structural match is
    /// already there.
    pub fn copy_to_model(&mut self, library_index: usize) -> Result<usize> {
        check_index(IndexKind::LibraryComponent, library_index, self.library.len())?;
        let component = self.library.as_slice()[library_index].clone();
        if self.model.components().contains_structural(&component) {
            return Err(SurgeError::DuplicateComponent(component.name));
        }
        let index = self.model.add_component(component)?;
        self.persist_components();
        self.recompute();
        Ok(index)
    }

    /// Copy a model component into the library unless a structural match is
    /// already there.
    pub fn copy_to_library(&mut self, model_index: usize) -> Result<usize> {
        let component = self
            .model
            .components()
            .get(model_index)
            .cloned()
            .ok_or(SurgeError::IndexOutOfRange {
                kind: IndexKind::Component,
                index: model_index,
                len: self.model.components().len(),
            })?;
        if self.library.contains_structural(&component) {
            return Err(SurgeError::DuplicateComponent(component.name));
        }
        let index = self.library.add(component)?;
        self.persist_library();
        Ok(index)
    }

    // Model components

    pub fn add_component(&mut self, component: Component) -> Result<usize> {
        let index = self.model.add_component(component)?;
        self.persist_components();
        self.recompute();
        Ok(index)
    }

    pub fn remove_component(&mut self, index: usize) -> Result<Component> {
        let removed = self.model.remove_component(index)?;
        self.persist_components();
        self.persist_modes();
        self.recompute();
        Ok(removed)
    }

    // Modes

    /// Duration as typed; unparseable text sets 0. A copied mode takes the
    /// source's duration instead.
    pub fn add_mode(&mut self, name: &str, duration: &str, copy_from: Option<usize>) -> Result<usize> {
        let index = self
            .model
            .add_mode(name, parse_float_lenient(duration), copy_from)?;
        self.persist_modes();
        self.recompute();
        Ok(index)
    }

    pub fn toggle_component(&mut self, mode_index: usize, component_index: usize) -> Result<bool> {
        let active = self.model.toggle_component(mode_index, component_index)?;
        self.persist_modes();
        self.recompute();
        Ok(active)
    }

    /// Duration as typed; unparseable text sets 0.
    pub fn set_mode_duration(&mut self, mode_index: usize, value: &str) -> Result<()> {
        self.model
            .set_mode_duration(mode_index, parse_float_lenient(value))?;
        self.persist_modes();
        self.recompute();
        Ok(())
    }

    pub fn remove_mode(&mut self, mode_index: usize) -> Result<()> {
        self.model.remove_mode(mode_index)?;
        self.persist_modes();
        self.recompute();
        Ok(())
    }

    // Battery

    pub fn battery_parameters(&self) -> &BatteryParameters {
        &self.battery
    }

    pub fn set_battery_parameters(&mut self, params: BatteryParameters) {
        self.battery = params;
    }

    pub fn battery_sizing(&self) -> BatterySizing {
        size_battery(self.options.energy_basis.energy_wh(&self.summary), &self.battery)
    }

    pub fn battery_analysis(&self) -> BatteryAnalysis {
        analyze_battery(&self.summary, &self.battery)
    }

    // Named models

    pub fn set_model_details(&mut self, name: &str, description: &str) {
        self.model_name = name.trim().to_string();
        self.model_description = description.trim().to_string();
    }

    /// Save the model component set under `name` and make it current.
    pub fn save_as_new_model(&mut self, name: &str, description: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SurgeError::InvalidInput(
                "model name must not be empty".to_string(),
            ));
        }
        let record = NamedModelRecord {
            name: name.to_string(),
            description: description.trim().to_string(),
            components: self.model.components().to_vec(),
        };
        persistence::save_named_model(&self.store, &record)?;
        self.current_model = Some(record.name.clone());
        self.model_name = record.name;
        self.model_description = record.description;
        tracing::info!("Saved model '{}'", self.model_name);
        Ok(())
    }

    /// Overwrite the current model's record with the model set as it is now.
    pub fn update_current_model(&mut self, description: &str) -> Result<()> {
        let name = self.current_model.clone().ok_or(SurgeError::NoCurrentModel)?;
        let record = NamedModelRecord {
            name,
            description: description.trim().to_string(),
            components: self.model.components().to_vec(),
        };
        persistence::save_named_model(&self.store, &record)?;
        self.model_description = record.description;
        Ok(())
    }

    /// Load a saved model's components; modes stay and keep their positions.
    pub fn load_model(&mut self, name: &str) -> Result<()> {
        let record = persistence::load_named_model(&self.store, name)?
            .ok_or_else(|| SurgeError::ModelNotFound(name.to_string()))?;
        self.model.replace_components(record.components)?;
        self.current_model = Some(name.to_string());
        self.model_name = name.to_string();
        self.model_description = record.description;
        self.persist_components();
        self.persist_modes();
        self.recompute();
        tracing::info!(
            "Loaded model '{}' with {} component(s)",
            name,
            self.model.components().len()
        );
        Ok(())
    }

    pub fn list_models(&self) -> Result<Vec<String>> {
        Ok(persistence::list_named_models(&self.store)?)
    }

    /// Drop a saved model record. The model set in memory is left alone.
    pub fn delete_model(&mut self, name: &str) -> Result<()> {
        if !persistence::delete_named_model(&self.store, name)? {
            return Err(SurgeError::ModelNotFound(name.to_string()));
        }
        if self.current_model.as_deref() == Some(name) {
            self.current_model = None;
        }
        tracing::info!("Deleted model '{}'", name);
        Ok(())
    }

    /// Wipe the store and every collection; battery inputs go back to defaults.
    pub fn clear_all_data(&mut self) -> Result<()> {
        self.store.clear()?;
        self.library = ComponentLibrary::new();
        self.model = PowerModel::new();
        self.current_model = None;
        self.model_name.clear();
        self.model_description.clear();
        self.battery = BatteryParameters::default();
        self.recompute();
        tracing::info!("Cleared all data");
        Ok(())
    }

    // Snapshot

    pub fn export_snapshot(&self, now: DateTime<Utc>) -> ProjectSnapshot {
        let mut snapshot = ProjectSnapshot {
            current_model: self.current_model.clone(),
            global_components: self.library.as_slice().to_vec(),
            components: self.model.components().to_vec(),
            modes: self.model.mode_records(),
            model_name: self.model_name.clone(),
            model_desc: self.model_description.clone(),
            dod: None,
            efficiency: None,
            bus_voltage: None,
            export_date: None,
        };
        snapshot.set_battery_parameters(&self.battery);
        snapshot.stamp(now);
        snapshot
    }

    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String> {
        self.export_snapshot(now).to_json_pretty()
    }

    /// Replace the session with a snapshot file's content.
    /// On any error the session is left as it was.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let snapshot = ProjectSnapshot::from_json(json)?;
        self.import_snapshot(snapshot)
    }

    pub fn import_snapshot(&mut self, snapshot: ProjectSnapshot) -> Result<usize> {
        snapshot.validate()?;
        let library = ComponentLibrary::from_components(snapshot.global_components.clone())
            .map_err(|e| SurgeError::ImportFormat(e.to_string()))?;
        let (model, dropped) = PowerModel::from_records(snapshot.components.clone(), &snapshot.modes)
            .map_err(|e| SurgeError::ImportFormat(e.to_string()))?;
        let battery = snapshot.battery_parameters_over(&self.battery);

        self.library = library;
        self.model = model;
        self.current_model = snapshot.current_model;
        if !snapshot.model_name.is_empty() {
            self.model_name = snapshot.model_name;
        }
        if !snapshot.model_desc.is_empty() {
            self.model_description = snapshot.model_desc;
        }
        self.battery = battery;

        self.persist_library();
        self.persist_components();
        self.persist_modes();
        self.recompute();
        tracing::info!(
            "Imported {} component(s) and {} mode(s)",
            self.model.components().len(),
            self.model.modes().len()
        );
        Ok(dropped)
    }

    fn recompute(&mut self) {
        self.summary = aggregate(self.model.components(), self.model.modes());
    }

    fn persist_library(&self) {
        log_store_failure(
            "library",
            persistence::save_library(&self.store, self.library.as_slice()),
        );
    }

    fn persist_components(&self) {
        log_store_failure(
            "components",
            persistence::save_components(&self.store, &self.model.components().to_vec()),
        );
    }

    fn persist_modes(&self) {
        log_store_failure(
            "modes",
            persistence::save_modes(&self.store, &self.model.mode_records()),
        );
    }
}

/// Saves after a mutation are fire-and-forget; the in-memory state stays
/// authoritative.
fn log_store_failure(what: &str, result: StoreResult<()>) {
    if let Err(e) = result {
        tracing::warn!("Failed to save {}: {}", what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn session() -> Session<MemoryStore> {
        Session::new(MemoryStore::new())
    }

    #[test]
    fn test_mutations_recompute() {
        let mut s = session();
        s.add_component(Component::new("A", 5.0, 2.0)).unwrap();
        s.add_mode("Idle", "2", None).unwrap();
        assert_eq!(s.summary().total_power_w, 0.0);

        s.toggle_component(0, 0).unwrap();
        assert_eq!(s.summary().total_power_w, 10.0);

        s.set_mode_duration(0, "3h").unwrap();
        assert_eq!(s.summary().total_energy_wh, 30.0);

        s.set_mode_duration(0, "soon").unwrap();
        assert_eq!(s.summary().total_duration_h, 0.0);

        s.remove_component(0).unwrap();
        assert_eq!(s.summary().total_power_w, 0.0);
    }

    #[test]
    fn test_add_mode_parses_duration_text() {
        let mut s = session();
        s.add_mode("Eclipse", "0.6 h", None).unwrap();
        s.add_mode("Unknown", "n/a", None).unwrap();
        assert_eq!(s.model().modes().get(0).unwrap().duration, 0.6);
        assert_eq!(s.model().modes().get(1).unwrap().duration, 0.0);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut s = session();
        s.add_component(Component::new("A", 5.0, 2.0)).unwrap();
        s.add_component(Component::new("B", 12.0, 1.0)).unwrap();
        s.add_mode("Peak", "1", None).unwrap();
        s.toggle_component(0, 1).unwrap();
        s.remove_component(0).unwrap();

        let modes = persistence::load_modes(s.store()).unwrap();
        assert_eq!(modes[0].active_components, vec![0]);
        let components = persistence::load_components(s.store()).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "B");
    }

    #[test]
    fn test_duplicate_copy_guard() {
        let mut s = session();
        s.add_library_component(Component::new("Radio", 12.0, 1.0).with_mass(0.3))
            .unwrap();
        assert_eq!(s.copy_to_model(0).unwrap(), 0);
        assert!(matches!(
            s.copy_to_model(0),
            Err(SurgeError::DuplicateComponent(_))
        ));
        assert!(matches!(
            s.copy_to_library(0),
            Err(SurgeError::DuplicateComponent(_))
        ));
        assert!(matches!(
            s.copy_to_model(3),
            Err(SurgeError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_copies_are_independent() {
        let mut s = session();
        s.add_component(Component::new("Camera", 5.0, 0.4)).unwrap();
        s.copy_to_library(0).unwrap();
        s.remove_component(0).unwrap();
        assert_eq!(s.library().get(0).unwrap().name, "Camera");
        assert!(s.model().components().is_empty());
    }

    #[test]
    fn test_battery_sizing_uses_energy_basis() {
        let mut s = session();
        s.add_component(Component::new("A", 10.0, 1.0)).unwrap();
        s.add_mode("One", "1", None).unwrap();
        s.add_mode("Two", "1", None).unwrap();
        s.toggle_component(0, 0).unwrap();
        // literal: 10 W * 2 h = 20 Wh; duty cycle: 10 Wh
        match s.battery_sizing() {
            BatterySizing::Sized { energy_wh, .. } => assert_eq!(energy_wh, 20.0),
            other => panic!("unexpected {:?}", other),
        }

        let mut s = s.with_options(BudgetOptions {
            energy_basis: crate::core::EnergyBasis::DutyCycle,
            battery: None,
        });
        match s.battery_sizing() {
            BatterySizing::Sized { energy_wh, .. } => assert_eq!(energy_wh, 10.0),
            other => panic!("unexpected {:?}", other),
        }

        s.set_battery_parameters(BatteryParameters {
            bus_voltage_v: 0.0,
            ..Default::default()
        });
        assert_eq!(s.battery_sizing(), BatterySizing::InvalidParameters);
    }

    #[test]
    fn test_named_model_lifecycle() {
        let mut s = session();
        assert!(matches!(
            s.update_current_model("x"),
            Err(SurgeError::NoCurrentModel)
        ));
        assert!(matches!(
            s.save_as_new_model("  ", ""),
            Err(SurgeError::InvalidInput(_))
        ));

        s.add_component(Component::new("A", 1.0, 1.0)).unwrap();
        s.save_as_new_model("LEO", "first").unwrap();
        assert_eq!(s.current_model(), Some("LEO"));

        s.add_component(Component::new("B", 2.0, 1.0)).unwrap();
        s.update_current_model("second").unwrap();
        s.remove_component(0).unwrap();
        s.remove_component(0).unwrap();

        s.load_model("LEO").unwrap();
        assert_eq!(s.model().components().len(), 2);
        assert_eq!(s.model_description(), "second");
        assert_eq!(s.list_models().unwrap(), vec!["LEO"]);
        assert!(matches!(
            s.load_model("GEO"),
            Err(SurgeError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_delete_model() {
        let mut s = session();
        s.add_component(Component::new("A", 1.0, 1.0)).unwrap();
        s.save_as_new_model("LEO", "").unwrap();
        s.save_as_new_model("GEO", "").unwrap();

        s.delete_model("LEO").unwrap();
        assert_eq!(s.current_model(), Some("GEO"));
        assert_eq!(s.list_models().unwrap(), vec!["GEO"]);

        s.delete_model("GEO").unwrap();
        assert!(s.current_model().is_none());
        assert!(s.list_models().unwrap().is_empty());
        assert_eq!(s.model().components().len(), 1);

        assert!(matches!(
            s.delete_model("GEO"),
            Err(SurgeError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_import_keeps_battery_inputs_missing_from_file() {
        let mut s = session();
        let custom = BatteryParameters {
            depth_of_discharge_pct: 50.0,
            efficiency_pct: 95.0,
            bus_voltage_v: 12.0,
        };
        s.set_battery_parameters(custom);

        s.import_json(
            r#"{"globalComponents":[],"components":[],"modes":[],
                "dod":"","efficiency":"","busVoltage":""}"#,
        )
        .unwrap();
        assert_eq!(*s.battery_parameters(), custom);

        s.import_json(r#"{"globalComponents":[],"components":[],"modes":[]}"#)
            .unwrap();
        assert_eq!(*s.battery_parameters(), custom);

        s.import_json(r#"{"globalComponents":[],"components":[],"modes":[],"busVoltage":"8.4"}"#)
            .unwrap();
        assert_eq!(s.battery_parameters().bus_voltage_v, 8.4);
        assert_eq!(s.battery_parameters().depth_of_discharge_pct, 50.0);
    }

    #[test]
    fn test_import_drops_negative_mode_indices() {
        let mut s = session();
        let dropped = s
            .import_json(
                r#"{"globalComponents":[],
                    "components":[{"name":"A","voltage":5,"current":1}],
                    "modes":[{"name":"Safe","duration":1,"activeComponents":[-1,0]}]}"#,
            )
            .unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(s.summary().total_power_w, 5.0);
    }

    #[test]
    fn test_clear_all_data() {
        let mut s = session();
        s.add_library_component(Component::new("A", 1.0, 1.0)).unwrap();
        s.add_component(Component::new("A", 1.0, 1.0)).unwrap();
        s.save_as_new_model("M", "").unwrap();
        s.set_battery_parameters(BatteryParameters {
            depth_of_discharge_pct: 50.0,
            ..Default::default()
        });

        s.clear_all_data().unwrap();
        assert!(s.library().is_empty());
        assert!(s.model().components().is_empty());
        assert!(s.current_model().is_none());
        assert_eq!(*s.battery_parameters(), BatteryParameters::default());
        assert!(s.store().keys().unwrap().is_empty());
    }

    #[test]
    fn test_failed_import_leaves_state() {
        let mut s = session();
        s.add_component(Component::new("A", 1.0, 1.0)).unwrap();
        let err = s.import_json(r#"{"components":[],"modes":[]}"#).unwrap_err();
        assert!(matches!(err, SurgeError::ImportFormat(_)));
        assert_eq!(s.model().components().len(), 1);
    }
}
