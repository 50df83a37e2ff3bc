//! Reusable component catalog, independent of any mission model.

use crate::core::{check_index, IndexKind, Result};

use super::Component;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentLibrary {
    components: Vec<Component>,
}

impl ComponentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, rejecting any that fail validation.
    pub fn from_components(components: Vec<Component>) -> Result<Self> {
        for c in &components {
            c.validate()?;
        }
        Ok(Self { components })
    }

    /// Append a definition and return its index.
    pub fn add(&mut self, component: Component) -> Result<usize> {
        component.validate()?;
        self.components.push(component);
        Ok(self.components.len() - 1)
    }

    /// Nothing references library positions, so removal needs no repair.
    pub fn remove(&mut self, index: usize) -> Result<Component> {
        check_index(IndexKind::LibraryComponent, index, self.components.len())?;
        Ok(self.components.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn as_slice(&self) -> &[Component] {
        &self.components
    }

    pub fn contains_structural(&self, component: &Component) -> bool {
        self.components.iter().any(|c| c.same_structure(component))
    }
}
