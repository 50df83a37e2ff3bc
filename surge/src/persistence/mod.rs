//! Durable key-value storage of the library, model set, modes and named
//! models, plus the JSON project snapshot used for file interchange.

pub mod memory;
pub mod snapshot;
pub mod sqlite;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Component, ModeRecord};

pub use memory::MemoryStore;
pub use snapshot::ProjectSnapshot;
pub use sqlite::SqliteStore;

pub const LIBRARY_KEY: &str = "globalComponents";
pub const COMPONENTS_KEY: &str = "components";
pub const MODES_KEY: &str = "modes";
pub const MODEL_KEY_PREFIX: &str = "model_";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Lock error: {0}")]
    Lock(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String-keyed, string-valued storage the session writes through.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    fn keys(&self) -> StoreResult<Vec<String>>;
    fn clear(&self) -> StoreResult<()>;
}

/// Saved mission model: a named copy of the model component set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedModelRecord {
    pub name: String,
    #[serde(default, rename = "desc")]
    pub description: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| StoreError::Serialization(format!("Failed to serialize {}: {}", key, e)))?;
    store.set(key, &json)
}

pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("Failed to parse {}: {}", key, e))),
        None => Ok(None),
    }
}

pub fn save_library(store: &dyn KeyValueStore, library: &[Component]) -> StoreResult<()> {
    write_json(store, LIBRARY_KEY, library)
}

pub fn save_components(store: &dyn KeyValueStore, components: &[Component]) -> StoreResult<()> {
    write_json(store, COMPONENTS_KEY, components)
}

pub fn save_modes(store: &dyn KeyValueStore, modes: &[ModeRecord]) -> StoreResult<()> {
    write_json(store, MODES_KEY, modes)
}

pub fn load_library(store: &dyn KeyValueStore) -> StoreResult<Vec<Component>> {
    Ok(read_json(store, LIBRARY_KEY)?.unwrap_or_default())
}

pub fn load_components(store: &dyn KeyValueStore) -> StoreResult<Vec<Component>> {
    Ok(read_json(store, COMPONENTS_KEY)?.unwrap_or_default())
}

pub fn load_modes(store: &dyn KeyValueStore) -> StoreResult<Vec<ModeRecord>> {
    Ok(read_json(store, MODES_KEY)?.unwrap_or_default())
}

fn model_key(name: &str) -> String {
    format!("{}{}", MODEL_KEY_PREFIX, name)
}

pub fn save_named_model(store: &dyn KeyValueStore, record: &NamedModelRecord) -> StoreResult<()> {
    write_json(store, &model_key(&record.name), record)
}

pub fn load_named_model(store: &dyn KeyValueStore, name: &str) -> StoreResult<Option<NamedModelRecord>> {
    read_json(store, &model_key(name))
}

/// Returns whether a record existed under `name`.
pub fn delete_named_model(store: &dyn KeyValueStore, name: &str) -> StoreResult<bool> {
    let key = model_key(name);
    if store.get(&key)?.is_none() {
        return Ok(false);
    }
    store.remove(&key)?;
    Ok(true)
}

/// Names of all saved models, sorted.
pub fn list_named_models(store: &dyn KeyValueStore) -> StoreResult<Vec<String>> {
    let mut names: Vec<String> = store
        .keys()?
        .into_iter()
        .filter_map(|k| k.strip_prefix(MODEL_KEY_PREFIX).map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_round_trip() {
        let store = MemoryStore::new();
        let components = vec![
            Component::new("OBC", 5.0, 0.3).with_model_number("X1"),
            Component::new("Heater", 28.0, 0.5).with_mass(0.2),
        ];
        let modes = vec![ModeRecord {
            name: "Safe".to_string(),
            duration: 4.0,
            active_components: vec![1, 0],
        }];

        save_library(&store, &components).unwrap();
        save_components(&store, &components[..1]).unwrap();
        save_modes(&store, &modes).unwrap();

        assert_eq!(load_library(&store).unwrap(), components);
        assert_eq!(load_components(&store).unwrap(), components[..1].to_vec());
        assert_eq!(load_modes(&store).unwrap(), modes);
    }

    #[test]
    fn test_missing_keys_load_empty() {
        let store = MemoryStore::new();
        assert!(load_library(&store).unwrap().is_empty());
        assert!(load_modes(&store).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_record_is_serialization_error() {
        let store = MemoryStore::new();
        store.set(MODES_KEY, "{not json").unwrap();
        assert!(matches!(load_modes(&store), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_named_models_listed_by_prefix() {
        let store = MemoryStore::new();
        for name in ["Cubesat-B", "Cubesat-A"] {
            save_named_model(
                &store,
                &NamedModelRecord {
                    name: name.to_string(),
                    description: String::new(),
                    components: vec![],
                },
            )
            .unwrap();
        }
        store.set(COMPONENTS_KEY, "[]").unwrap();

        assert_eq!(list_named_models(&store).unwrap(), vec!["Cubesat-A", "Cubesat-B"]);
        assert!(load_named_model(&store, "Cubesat-A").unwrap().is_some());
        assert!(load_named_model(&store, "Nope").unwrap().is_none());

        assert!(delete_named_model(&store, "Cubesat-A").unwrap());
        assert!(!delete_named_model(&store, "Cubesat-A").unwrap());
        assert_eq!(list_named_models(&store).unwrap(), vec!["Cubesat-B"]);
        assert!(store.get(COMPONENTS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_named_model_wire_shape() {
        let json = r#"{"name":"LEO","desc":"demo","components":[{"name":"A","voltage":1,"current":2}]}"#;
        let record: NamedModelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.description, "demo");
        assert_eq!(record.components[0].power(), 2.0);
    }
}
