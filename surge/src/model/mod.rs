//! Power model data: component library, model component set and mode set.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  copy by value  ┌──────────────┐   ids    ┌──────────────┐
//! │   Component  │◀───────────────▶│    Model     │◀─────────│   Mode Set   │
//! │   Library    │                 │ Component Set│          │              │
//! └──────────────┘                 └──────┬───────┘          └──────┬───────┘
//!                                         │                         │
//!                                         └────────────┬────────────┘
//!                                                      ▼
//!                                              ┌──────────────┐
//!                                              │ Aggregation  │
//!                                              └──────────────┘
//! ```
//!
//! Modes refer to model components by [`ComponentId`], so deleting a
//! component only has to strip its id from each mode. Index views are
//! derived on demand.

pub mod component;
pub mod components;
pub mod library;
pub mod modes;

use std::collections::BTreeSet;

pub use component::{Component, ComponentId};
pub use components::ModelComponentSet;
pub use library::ComponentLibrary;
pub use modes::{Mode, ModeRecord, ModeSet};

use crate::core::{check_index, IndexKind, Result};

/// Model component set plus the modes that reference it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerModel {
    components: ModelComponentSet,
    modes: ModeSet,
}

impl PowerModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored records.
    ///
    /// Mode indices with no matching component, negative ones included, are
    /// dropped so every reference resolves; the count of dropped references
    /// is returned.
    pub fn from_records(
        components: Vec<Component>,
        modes: &[ModeRecord],
    ) -> Result<(Self, usize)> {
        let mut model = Self::new();
        model.components.replace_all(components)?;

        let mut dropped = 0;
        for record in modes {
            let mut mode = Mode::new(record.name.clone(), record.duration);
            let ids: BTreeSet<ComponentId> = record
                .active_components
                .iter()
                .filter_map(|&idx| {
                    let id = usize::try_from(idx)
                        .ok()
                        .and_then(|i| model.components.id_at(i));
                    if id.is_none() {
                        dropped += 1;
                        tracing::warn!(
                            "Mode '{}' references component {} which does not exist; dropping",
                            record.name,
                            idx
                        );
                    }
                    id
                })
                .collect();
            mode.set_active(ids);
            model.modes.push(mode);
        }

        Ok((model, dropped))
    }

    pub fn components(&self) -> &ModelComponentSet {
        &self.components
    }

    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    pub fn mode_records(&self) -> Vec<ModeRecord> {
        self.modes
            .iter()
            .map(|m| m.to_record(&self.components))
            .collect()
    }

    pub fn add_component(&mut self, component: Component) -> Result<usize> {
        self.components.add(component)
    }

    /// Remove the component at `index` and drop it from every mode.
    ///
    /// Seen through indices: members below `index` keep their value, the
    /// member equal to `index` disappears, members above shift down by one.
    pub fn remove_component(&mut self, index: usize) -> Result<Component> {
        let (id, component) = self.components.remove(index)?;
        let affected = self.modes.forget_component(id);
        tracing::debug!(
            "Removed component '{}' at {}; dropped from {} mode(s)",
            component.name,
            index,
            affected
        );
        Ok(component)
    }

    /// Replace the component list, carrying mode membership over by position.
    /// Positions past the end of the new list are dropped.
    pub fn replace_components(&mut self, components: Vec<Component>) -> Result<()> {
        let memberships: Vec<BTreeSet<usize>> = self
            .modes
            .iter()
            .map(|m| m.active_indices(&self.components))
            .collect();

        self.components.replace_all(components)?;

        for (mode, indices) in self.modes.iter_mut().zip(memberships) {
            let ids: Vec<ComponentId> = indices
                .into_iter()
                .filter_map(|idx| self.components.id_at(idx))
                .collect();
            mode.set_active(ids);
        }
        Ok(())
    }

    pub fn add_mode(&mut self, name: &str, duration: f64, copy_from: Option<usize>) -> Result<usize> {
        self.modes.add_mode(name, duration, copy_from)
    }

    /// Flip membership of a component in a mode; returns the new state.
    pub fn toggle_component(&mut self, mode_index: usize, component_index: usize) -> Result<bool> {
        check_index(IndexKind::Mode, mode_index, self.modes.len())?;
        check_index(IndexKind::Component, component_index, self.components.len())?;
        match self.components.id_at(component_index) {
            Some(id) => self.modes.toggle(mode_index, id),
            None => Ok(false),
        }
    }

    pub fn set_mode_duration(&mut self, mode_index: usize, hours: f64) -> Result<()> {
        self.modes.set_duration(mode_index, hours)
    }

    pub fn remove_mode(&mut self, mode_index: usize) -> Result<Mode> {
        self.modes.remove_mode(mode_index)
    }

    /// Active component positions of one mode.
    pub fn active_indices(&self, mode_index: usize) -> Result<BTreeSet<usize>> {
        check_index(IndexKind::Mode, mode_index, self.modes.len())?;
        Ok(self
            .modes
            .get(mode_index)
            .map(|m| m.active_indices(&self.components))
            .unwrap_or_default())
    }
}
