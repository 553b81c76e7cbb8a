// SPDX-License-Identifier: Apache-2.0

//! Physical metadata loading.
//!
//! The catalog loader reads column declarations from the shard's own catalog
//! through a [`FederatedExecutor`], so metadata lookups open and release their
//! connection exactly like query execution does.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::engine::error::EngineError;
use crate::engine::registry::DriverRegistry;
use crate::engine::types::{Row, Value};
use crate::metrics;

use super::error::{FederationError, FederationResult};
use super::executor::FederatedExecutor;
use super::types::{DataSource, Dialect, PhysicalColumn, PhysicalTableMetadata};

/// Source of physical table metadata for one shard.
///
/// `Ok(None)` means the table does not exist on that source.
pub trait MetadataLoader: Send + Sync {
    fn load(
        &self,
        source: &DataSource,
        table: &str,
        dialect: Dialect,
    ) -> FederationResult<Option<PhysicalTableMetadata>>;
}

/// Loads column metadata with the dialect's catalog query.
pub struct CatalogMetadataLoader {
    registry: Arc<DriverRegistry>,
}

impl CatalogMetadataLoader {
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self { registry }
    }
}

impl MetadataLoader for CatalogMetadataLoader {
    #[instrument(skip(self, source, dialect), fields(source = %source.name, dialect = %dialect))]
    fn load(
        &self,
        source: &DataSource,
        table: &str,
        dialect: Dialect,
    ) -> FederationResult<Option<PhysicalTableMetadata>> {
        let result = load_columns(&self.registry, source, table, dialect);
        metrics::record_metadata_load(result.is_ok());

        let columns = result?;
        if columns.is_empty() {
            debug!("Table not found in catalog");
            return Ok(None);
        }
        debug!(columns = columns.len(), "Loaded table metadata");
        Ok(Some(PhysicalTableMetadata::new(table, columns)))
    }
}

fn load_columns(
    registry: &DriverRegistry,
    source: &DataSource,
    table: &str,
    dialect: Dialect,
) -> FederationResult<Vec<PhysicalColumn>> {
    let mut executor = FederatedExecutor::from_registry(registry, source.properties.clone())?;
    let rows = executor.execute_scoped(
        dialect.column_catalog_query(),
        &[Value::from(table)],
        |cursor| cursor.collect::<Result<Vec<Row>, EngineError>>(),
    )??;

    rows.iter()
        .map(|row| column_from_row(row, dialect))
        .collect()
}

fn column_from_row(row: &Row, dialect: Dialect) -> FederationResult<PhysicalColumn> {
    let name = text_at(row, 0, "column name")?;
    let native_type = text_at(row, 1, "column type")?;
    let nullable = match row.get(2) {
        Some(flag) if dialect.reports_not_null_flag() => !is_truthy(flag),
        Some(Value::Text(s)) => s.eq_ignore_ascii_case("yes"),
        Some(Value::Bool(b)) => *b,
        _ => true,
    };
    Ok(PhysicalColumn::new(name, native_type, nullable))
}

fn text_at<'a>(row: &'a Row, idx: usize, what: &str) -> FederationResult<&'a str> {
    row.get(idx)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            FederationError::Execution(EngineError::internal(format!(
                "Catalog row is missing the {what}"
            )))
        })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Text(s) => matches!(s.as_str(), "1" | "true" | "TRUE" | "YES" | "yes"),
        _ => false,
    }
}
