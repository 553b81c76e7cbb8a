// SPDX-License-Identifier: Apache-2.0

//! Arrow type factory.
//!
//! Materializes logical row types as Arrow schemas, the schema currency of
//! Arrow-based planners. `UNKNOWN` columns surface as Utf8.

use std::sync::Arc;

use duckdb::arrow::datatypes::{DataType, Field, IntervalUnit, Schema, SchemaRef, TimeUnit};

use super::row_type::TypeFactory;
use super::type_mapper::LogicalType;

/// [`TypeFactory`] producing Arrow [`SchemaRef`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowTypeFactory;

impl ArrowTypeFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn data_type(logical_type: LogicalType) -> DataType {
        match logical_type {
            LogicalType::Boolean => DataType::Boolean,
            LogicalType::TinyInt => DataType::Int8,
            LogicalType::SmallInt => DataType::Int16,
            LogicalType::Integer => DataType::Int32,
            LogicalType::BigInt => DataType::Int64,
            // Precision is not carried by the logical type
            LogicalType::Decimal => DataType::Float64,
            LogicalType::Real => DataType::Float32,
            LogicalType::Double => DataType::Float64,
            LogicalType::Char | LogicalType::Varchar => DataType::Utf8,
            LogicalType::Binary | LogicalType::Varbinary => DataType::Binary,
            LogicalType::Date => DataType::Date32,
            LogicalType::Time => DataType::Time64(TimeUnit::Microsecond),
            LogicalType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            LogicalType::TimestampWithTimeZone => {
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
            }
            LogicalType::Interval => DataType::Interval(IntervalUnit::MonthDayNano),
            LogicalType::Array => {
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
            }
            LogicalType::Unknown => DataType::Utf8,
        }
    }
}

impl TypeFactory for ArrowTypeFactory {
    type Field = Field;
    type RowType = SchemaRef;

    fn create_field(&self, name: &str, logical_type: LogicalType, nullable: bool) -> Field {
        Field::new(name, Self::data_type(logical_type), nullable)
    }

    fn create_row_type(&self, fields: Vec<Field>) -> SchemaRef {
        Arc::new(Schema::new(fields))
    }
}
