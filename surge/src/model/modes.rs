//! Operating modes and the set of components each one keeps powered.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{check_index, IndexKind, Result, SurgeError};

use super::{ComponentId, ModelComponentSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    pub name: String,
    /// Hours
    pub duration: f64,
    active: BTreeSet<ComponentId>,
}

impl Mode {
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            duration,
            active: BTreeSet::new(),
        }
    }

    pub fn is_active(&self, id: ComponentId) -> bool {
        self.active.contains(&id)
    }

    pub fn active_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.active.iter().copied()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Current positions of the active components.
    pub fn active_indices(&self, components: &ModelComponentSet) -> BTreeSet<usize> {
        self.active
            .iter()
            .filter_map(|id| components.index_of(*id))
            .collect()
    }

    /// Returns the new membership state.
    fn toggle(&mut self, id: ComponentId) -> bool {
        if self.active.remove(&id) {
            false
        } else {
            self.active.insert(id);
            true
        }
    }

    pub(crate) fn set_active(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.active = ids.into_iter().collect();
    }

    /// Wire form: membership as positions into `components`.
    pub fn to_record(&self, components: &ModelComponentSet) -> ModeRecord {
        ModeRecord {
            name: self.name.clone(),
            duration: self.duration,
            active_components: self
                .active_indices(components)
                .into_iter()
                .map(|i| i as i64)
                .collect(),
        }
    }
}

/// Stored and exported shape of a mode. The set travels as an array; order
/// carries no meaning. Positions are signed so hand-edited files with
/// negative entries still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRecord {
    pub name: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub active_components: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeSet {
    modes: Vec<Mode>,
}

impl ModeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mode and return its index.
    ///
    /// With `copy_from`, both membership and duration are cloned from the
    /// source and `duration` is ignored.
    pub fn add_mode(
        &mut self,
        name: &str,
        duration: f64,
        copy_from: Option<usize>,
    ) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SurgeError::InvalidInput(
                "mode name must not be empty".to_string(),
            ));
        }
        if self.find(name).is_some() {
            return Err(SurgeError::DuplicateMode(name.to_string()));
        }

        let mode = match copy_from {
            Some(source) => {
                check_index(IndexKind::Mode, source, self.modes.len())?;
                let source = &self.modes[source];
                Mode {
                    name: name.to_string(),
                    duration: source.duration,
                    active: source.active.clone(),
                }
            }
            None => Mode::new(name, if duration.is_nan() { 0.0 } else { duration }),
        };

        self.modes.push(mode);
        Ok(self.modes.len() - 1)
    }

    /// Append without the creation checks; used when loading stored state.
    pub(crate) fn push(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    pub(crate) fn toggle(&mut self, mode_index: usize, id: ComponentId) -> Result<bool> {
        check_index(IndexKind::Mode, mode_index, self.modes.len())?;
        Ok(self.modes[mode_index].toggle(id))
    }

    /// NaN is stored as 0; everything else is taken as given.
    pub fn set_duration(&mut self, mode_index: usize, hours: f64) -> Result<()> {
        check_index(IndexKind::Mode, mode_index, self.modes.len())?;
        self.modes[mode_index].duration = if hours.is_nan() { 0.0 } else { hours };
        Ok(())
    }

    pub fn remove_mode(&mut self, mode_index: usize) -> Result<Mode> {
        check_index(IndexKind::Mode, mode_index, self.modes.len())?;
        Ok(self.modes.remove(mode_index))
    }

    /// Drop `id` from every mode; returns how many modes referenced it.
    pub(crate) fn forget_component(&mut self, id: ComponentId) -> usize {
        self.modes
            .iter_mut()
            .map(|m| m.active.remove(&id))
            .filter(|removed| *removed)
            .count()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Mode> {
        self.modes.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Mode> {
        self.modes.get(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.modes.iter().position(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_mode_rejects_empty_and_duplicate() {
        let mut modes = ModeSet::new();
        assert!(matches!(
            modes.add_mode("  ", 1.0, None),
            Err(SurgeError::InvalidInput(_))
        ));
        modes.add_mode("Safe", 1.0, None).unwrap();
        assert!(matches!(
            modes.add_mode("Safe", 2.0, None),
            Err(SurgeError::DuplicateMode(_))
        ));
        // Uniqueness is case-sensitive
        assert!(modes.add_mode("safe", 2.0, None).is_ok());
        assert_eq!(modes.len(), 2);
    }

    #[test]
    fn test_copy_from_clones_membership_and_duration() {
        let mut modes = ModeSet::new();
        modes.add_mode("Science", 3.5, None).unwrap();
        modes.toggle(0, ComponentId(7)).unwrap();

        let idx = modes.add_mode("Science-2", 99.0, Some(0)).unwrap();
        let copy = modes.get(idx).unwrap();
        assert_eq!(copy.duration, 3.5);
        assert!(copy.is_active(ComponentId(7)));

        // Independent sets afterwards
        modes.toggle(idx, ComponentId(8)).unwrap();
        assert!(!modes.get(0).unwrap().is_active(ComponentId(8)));
    }

    #[test]
    fn test_copy_from_out_of_range() {
        let mut modes = ModeSet::new();
        assert!(matches!(
            modes.add_mode("X", 1.0, Some(0)),
            Err(SurgeError::IndexOutOfRange {
                kind: IndexKind::Mode,
                ..
            })
        ));
        assert!(modes.is_empty());
    }

    #[test]
    fn test_toggle_flips() {
        let mut modes = ModeSet::new();
        modes.add_mode("M", 1.0, None).unwrap();
        assert!(modes.toggle(0, ComponentId(1)).unwrap());
        assert!(!modes.toggle(0, ComponentId(1)).unwrap());
        assert_eq!(modes.get(0).unwrap().active_count(), 0);
        assert!(modes.toggle(1, ComponentId(1)).is_err());
    }

    #[test]
    fn test_set_duration_nan_is_zero() {
        let mut modes = ModeSet::new();
        modes.add_mode("M", 1.0, None).unwrap();
        modes.set_duration(0, f64::NAN).unwrap();
        assert_eq!(modes.get(0).unwrap().duration, 0.0);
        assert!(modes.set_duration(3, 1.0).is_err());
    }

    #[test]
    fn test_record_defaults() {
        let record: ModeRecord = serde_json::from_str(r#"{"name":"Idle"}"#).unwrap();
        assert_eq!(record.duration, 0.0);
        assert!(record.active_components.is_empty());
    }
}
