// SPDX-License-Identifier: Apache-2.0

//! Logical tables.
//!
//! A [`LogicalTable`] is the unified view of a table split across shards. Its
//! schema comes from the first data node (the representative shard) only;
//! the other shards are assumed to declare the same columns.
//! [`LogicalTable::verify_shard_schemas`] checks that assumption on demand.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::engine::registry::DriverRegistry;

use super::error::{FederationError, FederationResult};
use super::executor::FederatedExecutor;
use super::metadata::MetadataLoader;
use super::row_type::{RowField, RowTypeDescriptor, SchemaProvider, TypeFactory};
use super::type_mapper::{map_native_type, LogicalType};
use super::types::{DataNode, DataSourceMap, Dialect, PhysicalTableMetadata};

/// Unified, immutable view of a sharded table.
#[derive(Debug, Clone)]
pub struct LogicalTable {
    data_sources: DataSourceMap,
    data_nodes: Vec<DataNode>,
    dialect: Dialect,
    table_metadata: PhysicalTableMetadata,
    row_type: RowTypeDescriptor,
}

/// A difference between a shard's columns and the representative shard's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaDrift {
    /// The table does not exist on the shard.
    MissingTable { node: DataNode },
    /// The shard's column names, order, or mapped types differ.
    ColumnMismatch {
        node: DataNode,
        expected: Vec<(String, LogicalType)>,
        actual: Vec<(String, LogicalType)>,
    },
}

impl LogicalTable {
    /// Builds a logical table from the representative (first) data node.
    ///
    /// Only that node's metadata is loaded; there is no fallback to other
    /// shards when it is missing.
    #[instrument(
        skip(loader, data_sources, data_nodes, dialect),
        fields(nodes = data_nodes.len(), dialect = %dialect)
    )]
    pub fn build(
        loader: &dyn MetadataLoader,
        data_sources: DataSourceMap,
        data_nodes: Vec<DataNode>,
        dialect: Dialect,
    ) -> FederationResult<Self> {
        let representative = data_nodes.first().ok_or_else(|| {
            FederationError::metadata_load("<none>", "Logical table has no data nodes")
        })?;

        let source = data_sources
            .get(representative.data_source_name())
            .ok_or_else(|| {
                FederationError::metadata_load(representative, "Unknown data source")
            })?;

        let table_metadata = match loader.load(source, representative.table_name(), dialect) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                return Err(FederationError::metadata_load(representative, "Table not found"));
            }
            Err(e) => return Err(FederationError::metadata_load(representative, e.to_string())),
        };

        let row_type = derive_row_type(&table_metadata);
        debug!(node = %representative, columns = row_type.len(), "Logical table built");

        Ok(Self {
            data_sources,
            data_nodes,
            dialect,
            table_metadata,
            row_type,
        })
    }

    pub fn data_sources(&self) -> &DataSourceMap {
        &self.data_sources
    }

    pub fn data_nodes(&self) -> &[DataNode] {
        &self.data_nodes
    }

    /// The node whose schema defines the table. Never absent on a built table.
    pub fn representative_node(&self) -> &DataNode {
        &self.data_nodes[0]
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table_metadata(&self) -> &PhysicalTableMetadata {
        &self.table_metadata
    }

    pub fn row_type_descriptor(&self) -> &RowTypeDescriptor {
        &self.row_type
    }

    /// Creates an executor connected to `node`'s data source.
    pub fn executor_for(
        &self,
        node: &DataNode,
        registry: &DriverRegistry,
    ) -> FederationResult<FederatedExecutor> {
        if !self.data_nodes.contains(node) {
            return Err(FederationError::config(format!(
                "Data node {node} is not part of this table"
            )));
        }
        let source = self.data_sources.get(node.data_source_name()).ok_or_else(|| {
            FederationError::config(format!(
                "Unknown data source '{}'",
                node.data_source_name()
            ))
        })?;
        FederatedExecutor::from_registry(registry, source.properties.clone())
    }

    /// Loads every non-representative shard and compares its mapped columns
    /// with the table's row type.
    ///
    /// Returns an empty list when all shards agree. Load errors are returned
    /// as-is.
    #[instrument(skip(self, loader), fields(nodes = self.data_nodes.len()))]
    pub fn verify_shard_schemas(
        &self,
        loader: &dyn MetadataLoader,
    ) -> FederationResult<Vec<SchemaDrift>> {
        let expected = signature(&self.row_type);
        let mut drift = Vec::new();

        for node in self.data_nodes.iter().skip(1) {
            let source = self.data_sources.get(node.data_source_name()).ok_or_else(|| {
                FederationError::metadata_load(node, "Unknown data source")
            })?;

            match loader.load(source, node.table_name(), self.dialect)? {
                None => drift.push(SchemaDrift::MissingTable { node: node.clone() }),
                Some(metadata) => {
                    let actual = signature(&derive_row_type(&metadata));
                    if actual != expected {
                        drift.push(SchemaDrift::ColumnMismatch {
                            node: node.clone(),
                            expected: expected.clone(),
                            actual,
                        });
                    }
                }
            }
        }

        if !drift.is_empty() {
            debug!(drifted = drift.len(), "Shard schemas differ");
        }
        Ok(drift)
    }
}

impl SchemaProvider for LogicalTable {
    fn row_type<F: TypeFactory>(&self, factory: &F) -> F::RowType {
        self.row_type.apply(factory)
    }
}

fn derive_row_type(metadata: &PhysicalTableMetadata) -> RowTypeDescriptor {
    metadata
        .columns
        .iter()
        .map(|column| {
            let mapped = map_native_type(&column.native_type);
            if mapped.logical_type == LogicalType::Unknown {
                debug!(
                    column = %column.name,
                    native_type = %column.native_type,
                    "Unmapped native type, using UNKNOWN"
                );
            }
            RowField::new(column.name.clone(), mapped.logical_type, mapped.nullable)
        })
        .collect()
}

fn signature(row_type: &RowTypeDescriptor) -> Vec<(String, LogicalType)> {
    row_type
        .fields()
        .iter()
        .map(|f| (f.name.to_string(), f.logical_type))
        .collect()
}
