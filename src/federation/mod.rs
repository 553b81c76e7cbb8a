// SPDX-License-Identifier: Apache-2.0

//! Sharded Table Federation
//!
//! Presents a table split across several physical backends as one logical
//! table with a uniform row type, and runs physical SQL against one shard at
//! a time with scoped resource release.

pub mod arrow_schema;
pub mod error;
pub mod executor;
pub mod logical_table;
pub mod metadata;
pub mod row_type;
pub mod type_mapper;
pub mod types;

pub use arrow_schema::ArrowTypeFactory;
pub use error::{FederationError, FederationResult};
pub use executor::{FederatedExecutor, ResultCursor};
pub use logical_table::{LogicalTable, SchemaDrift};
pub use metadata::{CatalogMetadataLoader, MetadataLoader};
pub use row_type::{RowField, RowTypeDescriptor, SchemaProvider, TypeFactory};
pub use type_mapper::{map_native_type, LogicalType, MappedType};
pub use types::{
    data_source_map, DataNode, DataSource, DataSourceMap, Dialect, PhysicalColumn,
    PhysicalTableMetadata,
};
