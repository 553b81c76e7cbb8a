// SPDX-License-Identifier: Apache-2.0

//! Configuration
//!
//! [`FederationConfig`] describes data sources and logical tables as JSON:
//!
//! ```json
//! {
//!   "data_sources": {
//!     "ds0": "duckdb:///var/data/ds0.duckdb",
//!     "ds1": { "driver": "duckdb", "url": "/var/data/ds1.duckdb", "options": { "threads": "2" } }
//!   },
//!   "tables": {
//!     "t_order": { "dialect": "duckdb", "data_nodes": ["ds0.t_order_0", "ds1.t_order_1"] }
//!   }
//! }
//! ```
//!
//! [`LogSettings`] is read from the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::engine::connection_url::parse_connection_url;
use crate::engine::types::ConnectionProperties;
use crate::federation::error::{FederationError, FederationResult};
use crate::federation::logical_table::LogicalTable;
use crate::federation::metadata::MetadataLoader;
use crate::federation::types::{data_source_map, DataNode, DataSource, DataSourceMap, Dialect};

/// A data source declared either as a connection URL or as explicit properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataSourceEntry {
    Url(String),
    Properties(ConnectionProperties),
}

impl DataSourceEntry {
    pub fn to_properties(&self) -> FederationResult<ConnectionProperties> {
        match self {
            DataSourceEntry::Url(url) => Ok(parse_connection_url(url)?),
            DataSourceEntry::Properties(properties) => Ok(properties.clone()),
        }
    }
}

/// Sharding rule of one logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRule {
    pub dialect: Dialect,
    pub data_nodes: Vec<DataNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationConfig {
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSourceEntry>,
    #[serde(default)]
    pub tables: BTreeMap<String, TableRule>,
}

impl FederationConfig {
    pub fn from_json_str(json: &str) -> FederationResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FederationError::config(format!("Invalid federation config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FederationResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            FederationError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that every table has data nodes and that every node names a
    /// declared data source.
    pub fn validate(&self) -> FederationResult<()> {
        for (table, rule) in &self.tables {
            if rule.data_nodes.is_empty() {
                return Err(FederationError::config(format!(
                    "Table '{table}' has no data nodes"
                )));
            }
            if let Some(node) = rule
                .data_nodes
                .iter()
                .find(|node| !self.data_sources.contains_key(node.data_source_name()))
            {
                return Err(FederationError::config(format!(
                    "Table '{table}' references unknown data source in {node}"
                )));
            }
        }
        Ok(())
    }

    /// Resolves every declared data source into connection properties.
    pub fn data_source_map(&self) -> FederationResult<DataSourceMap> {
        let sources = self
            .data_sources
            .iter()
            .map(|(name, entry)| Ok(DataSource::new(name, entry.to_properties()?)))
            .collect::<FederationResult<Vec<_>>>()?;
        Ok(data_source_map(sources))
    }

    /// Builds every configured logical table. Stops at the first failure.
    #[instrument(skip(self, loader), fields(tables = self.tables.len()))]
    pub fn build_tables(
        &self,
        loader: &dyn MetadataLoader,
    ) -> FederationResult<BTreeMap<String, LogicalTable>> {
        let sources = self.data_source_map()?;
        self.tables
            .iter()
            .map(|(name, rule)| {
                let table = LogicalTable::build(
                    loader,
                    sources.clone(),
                    rule.data_nodes.clone(),
                    rule.dialect,
                )?;
                Ok((name.clone(), table))
            })
            .collect()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive string
    pub filter: String,
    pub format: LogFormat,
    /// Daily rolling log files go here; stderr when unset
    pub directory: Option<PathBuf>,
    pub retention_days: u64,
}

impl LogSettings {
    pub const DEFAULT_FILTER: &'static str = "fedlink=info";
    pub const DEFAULT_RETENTION_DAYS: u64 = 14;

    /// Reads `FEDLINK_LOG`, `FEDLINK_LOG_FORMAT`, `FEDLINK_LOG_DIR` and
    /// `FEDLINK_LOG_RETENTION_DAYS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let format = match non_empty("FEDLINK_LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            filter: non_empty("FEDLINK_LOG").unwrap_or_else(|| Self::DEFAULT_FILTER.to_string()),
            format,
            directory: non_empty("FEDLINK_LOG_DIR").map(PathBuf::from),
            retention_days: non_empty("FEDLINK_LOG_RETENTION_DAYS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(Self::DEFAULT_RETENTION_DAYS),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: Self::DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            directory: None,
            retention_days: Self::DEFAULT_RETENTION_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONFIG: &str = r#"{
        "data_sources": {
            "ds0": "duckdb:///var/data/ds0.duckdb?threads=2",
            "ds1": { "driver": "duckdb", "url": "/var/data/ds1.duckdb" }
        },
        "tables": {
            "t_order": { "dialect": "duckdb", "data_nodes": ["ds0.t_order_0", "ds1.t_order_1"] }
        }
    }"#;

    #[test]
    fn parses_urls_and_explicit_properties() {
        let config = FederationConfig::from_json_str(CONFIG).unwrap();
        let sources = config.data_source_map().unwrap();

        let ds0 = &sources["ds0"].properties;
        assert_eq!(ds0.driver, "duckdb");
        assert_eq!(ds0.url, "/var/data/ds0.duckdb");
        assert_eq!(ds0.options.get("threads").map(String::as_str), Some("2"));
        assert_eq!(sources["ds1"].properties.url, "/var/data/ds1.duckdb");

        let rule = &config.tables["t_order"];
        assert_eq!(rule.dialect, Dialect::DuckDb);
        assert_eq!(rule.data_nodes[1], DataNode::new("ds1", "t_order_1"));
    }

    #[test]
    fn rejects_unknown_data_source() {
        let json = r#"{
            "data_sources": { "ds0": "duckdb::memory:" },
            "tables": { "t": { "dialect": "duckdb", "data_nodes": ["ds0.t", "ds9.t"] } }
        }"#;
        let err = FederationConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("ds9.t"));
    }

    #[test]
    fn rejects_malformed_node_and_empty_tables() {
        let bad_node = r#"{ "tables": { "t": { "dialect": "duckdb", "data_nodes": ["nodot"] } } }"#;
        assert!(matches!(
            FederationConfig::from_json_str(bad_node),
            Err(FederationError::Config { .. })
        ));

        let qualified = r#"{
            "data_sources": { "ds0": "duckdb::memory:" },
            "tables": { "t": { "dialect": "duckdb", "data_nodes": ["ds0.sales.t"] } }
        }"#;
        assert!(FederationConfig::from_json_str(qualified).is_err());

        let empty = r#"{ "tables": { "t": { "dialect": "duckdb", "data_nodes": [] } } }"#;
        assert!(FederationConfig::from_json_str(empty).is_err());
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("federation.json");
        fs::write(&path, CONFIG).unwrap();
        assert_eq!(FederationConfig::from_path(&path).unwrap().tables.len(), 1);

        let missing = FederationConfig::from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, FederationError::Config { .. }));
    }

    #[test]
    fn log_settings_defaults_and_overrides() {
        let defaults = LogSettings::from_lookup(|_| None);
        assert_eq!(defaults, LogSettings::default());

        let vars: HashMap<&str, &str> = HashMap::from([
            ("FEDLINK_LOG", "fedlink=debug,duckdb=warn"),
            ("FEDLINK_LOG_FORMAT", "JSON"),
            ("FEDLINK_LOG_DIR", "/var/log/fedlink"),
            ("FEDLINK_LOG_RETENTION_DAYS", "not-a-number"),
        ]);
        let settings = LogSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(settings.filter, "fedlink=debug,duckdb=warn");
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.directory, Some(PathBuf::from("/var/log/fedlink")));
        assert_eq!(settings.retention_days, LogSettings::DEFAULT_RETENTION_DAYS);
    }
}
