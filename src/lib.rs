// SPDX-License-Identifier: Apache-2.0

//! fedlink - sharded table federation
//!
//! Lets a relational planner treat a table split across several physical
//! databases as one logical table, and run physical SQL against one shard at
//! a time.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fedlink::config::FederationConfig;
//! use fedlink::federation::{ArrowTypeFactory, CatalogMetadataLoader, SchemaProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = fedlink::init_backend();
//! let config = FederationConfig::from_path("federation.json")?;
//! let tables = config.build_tables(&CatalogMetadataLoader::new(Arc::clone(&registry)))?;
//!
//! let orders = &tables["t_order"];
//! let schema = orders.row_type(&ArrowTypeFactory::new());
//!
//! let mut executor = orders.executor_for(orders.representative_node(), &registry)?;
//! let rows = executor.execute_scoped(
//!     "SELECT * FROM t_order_0 WHERE id = ?",
//!     &[42.into()],
//!     |cursor| cursor.count(),
//! )?;
//! # let _ = (schema, rows);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod federation;
pub mod metrics;
pub mod observability;

pub use engine::{init_backend, DriverRegistry, EngineError, EngineResult};
pub use federation::{FederatedExecutor, FederationError, FederationResult, LogicalTable};
