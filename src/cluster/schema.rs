//! Catalogue of keyspace, table and column metadata.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{trace, warn};

use crate::cluster::host::Host;
use crate::response::Row;

const KEYSPACE_NAME: &str = "keyspace_name";
const TABLE_NAME: &str = "columnfamily_name";
const COLUMN_NAME: &str = "column_name";

/// External catalogue of schema metadata.
///
/// Each update replaces the catalogue at its granularity with rows freshly
/// read from the schema tables; applying the same rows twice leaves the
/// catalogue unchanged. `host` is the node the rows were read from; its
/// release version decides how version-dependent columns are interpreted.
pub trait ClusterSchema: Send + Sync {
    /// Replaces the whole schema.
    fn update_keyspaces(&self, host: &Arc<Host>, keyspaces: Vec<Row>, tables: Vec<Row>, columns: Vec<Row>);

    /// Replaces a single keyspace.
    fn update_keyspace(&self, host: &Arc<Host>, keyspace: Row, tables: Vec<Row>, columns: Vec<Row>);

    /// Replaces a single table within `keyspace`.
    fn update_table(&self, host: &Arc<Host>, keyspace: &str, table: Row, columns: Vec<Row>);
}

/// Table metadata: the raw system row plus columns keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    pub row: Row,
    pub columns: HashMap<String, Row>,
}

/// Keyspace metadata: the raw system row plus tables keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyspaceMetadata {
    pub row: Row,
    pub tables: HashMap<String, TableMetadata>,
}

/// In-memory [`ClusterSchema`].
#[derive(Debug, Default)]
pub struct ClusterSchemaCatalog {
    keyspaces: Mutex<HashMap<String, KeyspaceMetadata>>,
}

impl ClusterSchemaCatalog {
    pub fn new() -> Self {
        ClusterSchemaCatalog::default()
    }

    pub fn keyspace(&self, name: &str) -> Option<KeyspaceMetadata> {
        self.keyspaces.lock().unwrap().get(name).cloned()
    }

    pub fn keyspace_names(&self) -> Vec<String> {
        self.keyspaces.lock().unwrap().keys().cloned().collect()
    }

    fn build_keyspace(keyspace: Row, tables: Vec<Row>, columns: Vec<Row>) -> KeyspaceMetadata {
        let mut metadata = KeyspaceMetadata {
            row: keyspace,
            tables: HashMap::new(),
        };
        for table in tables {
            let Some(name) = table.get(TABLE_NAME).map(str::to_string) else {
                warn!(row = ?table, "Table row without a name, skipping");
                continue;
            };
            metadata.tables.insert(
                name,
                TableMetadata {
                    row: table,
                    columns: HashMap::new(),
                },
            );
        }
        for column in columns {
            let (Some(table), Some(name)) = (column.get(TABLE_NAME), column.get(COLUMN_NAME))
            else {
                warn!(row = ?column, "Column row without a table or name, skipping");
                continue;
            };
            if let Some(table) = metadata.tables.get_mut(table) {
                table.columns.insert(name.to_string(), column.clone());
            }
        }
        metadata
    }

    fn group_by_keyspace(rows: Vec<Row>) -> HashMap<String, Vec<Row>> {
        let mut grouped: HashMap<String, Vec<Row>> = HashMap::new();
        for row in rows {
            let Some(keyspace) = row.get(KEYSPACE_NAME).map(str::to_string) else {
                warn!(row = ?row, "Schema row without a keyspace, skipping");
                continue;
            };
            grouped.entry(keyspace).or_default().push(row);
        }
        grouped
    }
}

impl ClusterSchema for ClusterSchemaCatalog {
    fn update_keyspaces(
        &self,
        host: &Arc<Host>,
        keyspaces: Vec<Row>,
        tables: Vec<Row>,
        columns: Vec<Row>,
    ) {
        trace!(host = %host, keyspaces = keyspaces.len(), "Replacing schema");
        let mut tables_by_keyspace = Self::group_by_keyspace(tables);
        let mut columns_by_keyspace = Self::group_by_keyspace(columns);

        let mut catalog = HashMap::new();
        for keyspace in keyspaces {
            let Some(name) = keyspace.get(KEYSPACE_NAME).map(str::to_string) else {
                warn!(row = ?keyspace, "Keyspace row without a name, skipping");
                continue;
            };
            let tables = tables_by_keyspace.remove(&name).unwrap_or_default();
            let columns = columns_by_keyspace.remove(&name).unwrap_or_default();
            catalog.insert(name, Self::build_keyspace(keyspace, tables, columns));
        }
        *self.keyspaces.lock().unwrap() = catalog;
    }

    fn update_keyspace(
        &self,
        host: &Arc<Host>,
        keyspace: Row,
        tables: Vec<Row>,
        columns: Vec<Row>,
    ) {
        let Some(name) = keyspace.get(KEYSPACE_NAME).map(str::to_string) else {
            warn!(host = %host, row = ?keyspace, "Keyspace row without a name, skipping update");
            return;
        };
        trace!(host = %host, keyspace = %name, "Replacing keyspace");
        let metadata = Self::build_keyspace(keyspace, tables, columns);
        self.keyspaces.lock().unwrap().insert(name, metadata);
    }

    fn update_table(&self, host: &Arc<Host>, keyspace: &str, table: Row, columns: Vec<Row>) {
        let Some(name) = table.get(TABLE_NAME).map(str::to_string) else {
            warn!(host = %host, row = ?table, "Table row without a name, skipping update");
            return;
        };
        trace!(host = %host, keyspace = %keyspace, table = %name, "Replacing table");
        let mut metadata = TableMetadata {
            row: table,
            columns: HashMap::new(),
        };
        for column in columns {
            let Some(column_name) = column.get(COLUMN_NAME) else {
                warn!(row = ?column, "Column row without a name, skipping");
                continue;
            };
            metadata.columns.insert(column_name.to_string(), column.clone());
        }
        self.keyspaces
            .lock()
            .unwrap()
            .entry(keyspace.to_string())
            .or_default()
            .tables
            .insert(name, metadata);
    }
}
