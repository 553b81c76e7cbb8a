// SPDX-License-Identifier: Apache-2.0

//! Types for the sharded table federation layer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::engine::types::ConnectionProperties;

use super::error::FederationError;

/// A named physical backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub properties: ConnectionProperties,
}

impl DataSource {
    pub fn new(name: impl Into<String>, properties: ConnectionProperties) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

/// Mapping from data source name to data source.
pub type DataSourceMap = HashMap<String, DataSource>;

/// Builds a [`DataSourceMap`] keyed by each source's name.
pub fn data_source_map(sources: impl IntoIterator<Item = DataSource>) -> DataSourceMap {
    sources
        .into_iter()
        .map(|source| (source.name.clone(), source))
        .collect()
}

/// One physical shard: a table on a named data source.
///
/// Written as `"<data source>.<table>"`. The table is looked up by bare name
/// in the catalog, so a schema-qualified table is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataNode {
    data_source_name: CompactString,
    table_name: CompactString,
}

impl DataNode {
    pub fn new(data_source_name: impl Into<CompactString>, table_name: impl Into<CompactString>) -> Self {
        Self {
            data_source_name: data_source_name.into(),
            table_name: table_name.into(),
        }
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.data_source_name, self.table_name)
    }
}

impl FromStr for DataNode {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((_, table)) if table.contains('.') => Err(FederationError::config(format!(
                "Invalid data node '{s}': table name must not contain '.'"
            ))),
            Some((source, table)) if !source.is_empty() && !table.is_empty() => {
                Ok(Self::new(source, table))
            }
            _ => Err(FederationError::config(format!(
                "Invalid data node '{s}': expected '<data source>.<table>'"
            ))),
        }
    }
}

impl TryFrom<String> for DataNode {
    type Error = FederationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataNode> for String {
    fn from(node: DataNode) -> Self {
        node.to_string()
    }
}

/// SQL flavor of a physical backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    DuckDb,
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
    /// Plain SQL-standard `information_schema` with `?` placeholders
    Ansi,
}

impl Dialect {
    /// Catalog query returning `(column name, declared type, nullability)`
    /// for one table, in declaration order. Takes the table name as its only
    /// parameter.
    pub fn column_catalog_query(self) -> &'static str {
        match self {
            Dialect::DuckDb => {
                "SELECT column_name, data_type, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = ? \
                 ORDER BY ordinal_position"
            }
            Dialect::Postgres => {
                "SELECT column_name, data_type, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position"
            }
            Dialect::MySql => {
                "SELECT column_name, column_type, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ? \
                 ORDER BY ordinal_position"
            }
            Dialect::Sqlite => {
                "SELECT name, type, \"notnull\" FROM pragma_table_info(?) ORDER BY cid"
            }
            Dialect::SqlServer => {
                "SELECT column_name, data_type, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = SCHEMA_NAME() AND table_name = @P1 \
                 ORDER BY ordinal_position"
            }
            Dialect::Ansi => {
                "SELECT column_name, data_type, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_name = ? \
                 ORDER BY ordinal_position"
            }
        }
    }

    /// Whether the catalog reports a NOT NULL flag instead of `is_nullable`.
    pub(crate) fn reports_not_null_flag(self) -> bool {
        matches!(self, Dialect::Sqlite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::DuckDb => "duckdb",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
            Dialect::Ansi => "ansi",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckdb" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "ansi" => Ok(Dialect::Ansi),
            other => Err(FederationError::config(format!("Unknown dialect '{other}'"))),
        }
    }
}

/// One physical column as declared on a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalColumn {
    pub name: CompactString,
    /// Backend-declared type name (e.g., "INTEGER", "character varying")
    pub native_type: CompactString,
    pub nullable: bool,
}

impl PhysicalColumn {
    pub fn new(name: impl Into<CompactString>, native_type: impl Into<CompactString>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            nullable,
        }
    }
}

/// Physical table metadata of one shard, columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalTableMetadata {
    pub name: CompactString,
    pub columns: Vec<PhysicalColumn>,
}

impl PhysicalTableMetadata {
    pub fn new(name: impl Into<CompactString>, columns: Vec<PhysicalColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&PhysicalColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_node_parses_source_and_table() {
        let node: DataNode = "ds_0.t_order_0".parse().unwrap();
        assert_eq!(node.data_source_name(), "ds_0");
        assert_eq!(node.table_name(), "t_order_0");
    }

    #[test]
    fn data_node_rejects_qualified_table() {
        let err = "ds_1.sales.t_order".parse::<DataNode>().unwrap_err();
        assert!(matches!(err, FederationError::Config { .. }));
        assert!(err.to_string().contains("must not contain '.'"));

        let json = serde_json::json!("ds_1.sales.t_order");
        assert!(serde_json::from_value::<DataNode>(json).is_err());
    }

    #[test]
    fn data_node_rejects_missing_parts() {
        for bad in ["t_order", ".t_order", "ds_0.", ""] {
            assert!(bad.parse::<DataNode>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn data_node_serde_uses_dotted_form() {
        let node = DataNode::new("ds_0", "t_order_0");
        assert_eq!(serde_json::to_string(&node).unwrap(), "\"ds_0.t_order_0\"");

        let parsed: Vec<DataNode> = serde_json::from_str(r#"["ds_0.t_0","ds_1.t_1"]"#).unwrap();
        assert_eq!(parsed[1], DataNode::new("ds_1", "t_1"));
        assert!(serde_json::from_str::<DataNode>("\"nodot\"").is_err());
    }

    #[test]
    fn dialect_parses_aliases() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("mariadb".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(serde_json::to_string(&Dialect::DuckDb).unwrap(), "\"duckdb\"");
    }

    #[test]
    fn data_source_map_keys_by_name() {
        let map = data_source_map([
            DataSource::new("ds_0", ConnectionProperties::new("duckdb", ":memory:")),
            DataSource::new("ds_1", ConnectionProperties::new("duckdb", ":memory:")),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["ds_1"].name, "ds_1");
    }
}
