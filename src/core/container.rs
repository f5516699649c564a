//! Data containers and the shared store that holds them.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{AttributeTable, DataArrayPath, GridGeometry, TypedBuffer};
use crate::util::{Error, Result};

/// A grid geometry plus the attribute tables defined on it.
#[derive(Clone, Debug, PartialEq)]
pub struct DataContainer {
    name: String,
    geometry: GridGeometry,
    tables: IndexMap<String, AttributeTable>,
}

impl DataContainer {
    /// Create a container without tables.
    pub fn new(name: impl Into<String>, geometry: GridGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            tables: IndexMap::new(),
        }
    }

    /// Container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same contents under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Grid geometry.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Add or replace a table, keyed by its name.
    pub fn insert_table(&mut self, table: AttributeTable) -> Option<AttributeTable> {
        self.tables.insert(table.name().to_string(), table)
    }

    /// Look up a table.
    pub fn table(&self, name: &str) -> Option<&AttributeTable> {
        self.tables.get(name)
    }

    /// Table names in insertion order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.tables.keys().map(String::as_str)
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &AttributeTable> + '_ {
        self.tables.values()
    }

    /// Array addressed by `path`; the container part is ignored.
    pub fn array(&self, path: &DataArrayPath) -> Result<&TypedBuffer> {
        self.table(&path.table)
            .ok_or_else(|| Error::table_not_found(&path.table))?
            .array(&path.array)
    }
}

/// Named containers shared between a host and the jobs it runs.
///
/// Readers get `Arc` snapshots; writers replace a whole container under the
/// write lock, so a reader never observes a half-updated container.
#[derive(Debug, Default)]
pub struct DataStore {
    containers: RwLock<IndexMap<String, Arc<DataContainer>>>,
}

impl DataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a container.
    pub fn get(&self, name: &str) -> Option<Arc<DataContainer>> {
        self.containers.read().get(name).cloned()
    }

    /// Snapshot of a container, failing with `NotFound`.
    pub fn container(&self, name: &str) -> Result<Arc<DataContainer>> {
        self.get(name).ok_or_else(|| Error::container_not_found(name))
    }

    /// Check whether a container exists.
    pub fn contains(&self, name: &str) -> bool {
        self.containers.read().contains_key(name)
    }

    /// Container names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.containers.read().keys().cloned().collect()
    }

    /// Number of containers.
    pub fn len(&self) -> usize {
        self.containers.read().len()
    }

    /// True if the store holds no containers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add or replace a container, returning the previous one.
    pub fn insert(&self, container: DataContainer) -> Option<Arc<DataContainer>> {
        let name = container.name().to_string();
        self.containers.write().insert(name, Arc::new(container))
    }

    /// Add a container whose name must not be taken yet.
    pub fn insert_new(&self, container: DataContainer) -> Result<()> {
        let mut containers = self.containers.write();
        if containers.contains_key(container.name()) {
            return Err(Error::DuplicateName(container.name().to_string()));
        }
        containers.insert(container.name().to_string(), Arc::new(container));
        Ok(())
    }

    /// Remove a container.
    pub fn remove(&self, name: &str) -> Option<Arc<DataContainer>> {
        self.containers.write().shift_remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TableKind;
    use crate::util::ErrorKind;

    fn container() -> DataContainer {
        let geom = GridGeometry::new((2, 1, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        let mut dc = DataContainer::new("DataContainer", geom);
        let mut cells = AttributeTable::new("CellData", TableKind::Cell, (2, 1, 1));
        cells
            .insert("Data", TypedBuffer::from_values(&[1u8, 2], 1).unwrap())
            .unwrap();
        dc.insert_table(cells);
        dc
    }

    #[test]
    fn test_container_lookup() {
        let dc = container();
        let path = DataArrayPath::new("DataContainer", "CellData", "Data");
        assert_eq!(dc.array(&path).unwrap().tuple_count(), 2);
        let missing = DataArrayPath::new("DataContainer", "Nope", "Data");
        assert_eq!(dc.array(&missing).unwrap_err().code(), -46500);
        assert_eq!(dc.table_names().collect::<Vec<_>>(), vec!["CellData"]);
    }

    #[test]
    fn test_snapshots_survive_replacement() {
        let store = DataStore::new();
        store.insert(container());
        let before = store.container("DataContainer").unwrap();

        let geom = GridGeometry::new((4, 1, 1), (0.5, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        let previous = store.insert(DataContainer::new("DataContainer", geom));
        assert!(previous.is_some());

        assert_eq!(before.geometry().num_cells(), 2);
        assert_eq!(store.container("DataContainer").unwrap().geometry().num_cells(), 4);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_remove() {
        let store = DataStore::new();
        store.insert(container());
        store.insert_new(container().renamed("Copy")).unwrap();
        assert_eq!(
            store.insert_new(container()).unwrap_err().kind(),
            ErrorKind::DuplicateName
        );
        assert_eq!(store.names(), vec!["DataContainer".to_string(), "Copy".to_string()]);
        assert!(store.remove("DataContainer").is_some());
        assert!(!store.contains("DataContainer"));
        assert_eq!(store.container("DataContainer").unwrap_err().kind(), ErrorKind::NotFound);
    }
}
