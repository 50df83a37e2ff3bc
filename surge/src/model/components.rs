//! Components assigned to the open mission model.
//!
//! Positions are the public addressing scheme (tables, wire format); each
//! entry also carries a [`ComponentId`] that modes hold on to instead.

use crate::core::{check_index, IndexKind, Result};

use super::{Component, ComponentId};

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    id: ComponentId,
    component: Component,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelComponentSet {
    slots: Vec<Slot>,
    next_id: u64,
}

impl ModelComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component and return its index.
    pub fn add(&mut self, component: Component) -> Result<usize> {
        component.validate()?;
        let id = self.issue_id();
        self.slots.push(Slot { id, component });
        Ok(self.slots.len() - 1)
    }

    /// Remove the component at `index`; later entries shift down by one.
    ///
    /// Callers holding ids must forget the returned one; see
    /// [`PowerModel::remove_component`](super::PowerModel::remove_component).
    pub(crate) fn remove(&mut self, index: usize) -> Result<(ComponentId, Component)> {
        check_index(IndexKind::Component, index, self.slots.len())?;
        let slot = self.slots.remove(index);
        Ok((slot.id, slot.component))
    }

    /// Swap in a new list. Ids keep counting up so stale ids never collide.
    pub(crate) fn replace_all(&mut self, components: Vec<Component>) -> Result<()> {
        for c in &components {
            c.validate()?;
        }
        let mut slots = Vec::with_capacity(components.len());
        for component in components {
            let id = self.issue_id();
            slots.push(Slot { id, component });
        }
        self.slots = slots;
        Ok(())
    }

    fn issue_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.slots.get(index).map(|s| &s.component)
    }

    pub fn id_at(&self, index: usize) -> Option<ComponentId> {
        self.slots.get(index).map(|s| s.id)
    }

    pub fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    pub fn by_id(&self, id: ComponentId) -> Option<&Component> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.component)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.slots.iter().map(|s| &s.component)
    }

    pub fn to_vec(&self) -> Vec<Component> {
        self.iter().cloned().collect()
    }

    pub fn contains_structural(&self, component: &Component) -> bool {
        self.iter().any(|c| c.same_structure(component))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_across_removal() {
        let mut set = ModelComponentSet::new();
        set.add(Component::new("A", 1.0, 1.0)).unwrap();
        set.add(Component::new("B", 2.0, 1.0)).unwrap();
        set.add(Component::new("C", 3.0, 1.0)).unwrap();

        let id_c = set.id_at(2).unwrap();
        set.remove(0).unwrap();

        assert_eq!(set.index_of(id_c), Some(1));
        assert_eq!(set.by_id(id_c).unwrap().name, "C");
    }

    #[test]
    fn test_ids_not_reused() {
        let mut set = ModelComponentSet::new();
        set.add(Component::new("A", 1.0, 1.0)).unwrap();
        let (old, _) = set.remove(0).unwrap();
        set.add(Component::new("A", 1.0, 1.0)).unwrap();
        assert_ne!(set.id_at(0), Some(old));

        set.replace_all(vec![Component::new("B", 1.0, 1.0)]).unwrap();
        assert_ne!(set.id_at(0), Some(old));
        assert_eq!(set.index_of(old), None);
    }

    #[test]
    fn test_replace_all_validates_first() {
        let mut set = ModelComponentSet::new();
        set.add(Component::new("A", 1.0, 1.0)).unwrap();
        let result = set.replace_all(vec![
            Component::new("B", 1.0, 1.0),
            Component::new("", 1.0, 1.0),
        ]);
        assert!(result.is_err());
        assert_eq!(set.get(0).unwrap().name, "A");
    }
}
