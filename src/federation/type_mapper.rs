// SPDX-License-Identifier: Apache-2.0

//! Native column type → logical type mapping.
//!
//! Native type codes are the type names a backend declares in its catalog
//! (`INTEGER`, `character varying`, `DECIMAL(18,3)`, `int unsigned`, `TEXT[]`).
//! Every mapped column is nullable; names with no mapping degrade to
//! [`LogicalType::Unknown`] instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Planner-facing SQL type of a logical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalType {
    Boolean,
    #[serde(rename = "TINYINT")]
    TinyInt,
    #[serde(rename = "SMALLINT")]
    SmallInt,
    Integer,
    #[serde(rename = "BIGINT")]
    BigInt,
    Decimal,
    Real,
    Double,
    Char,
    Varchar,
    Binary,
    Varbinary,
    Date,
    Time,
    Timestamp,
    TimestampWithTimeZone,
    Interval,
    Array,
    Unknown,
}

impl LogicalType {
    pub fn sql_name(self) -> &'static str {
        match self {
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::Real => "REAL",
            LogicalType::Double => "DOUBLE",
            LogicalType::Char => "CHAR",
            LogicalType::Varchar => "VARCHAR",
            LogicalType::Binary => "BINARY",
            LogicalType::Varbinary => "VARBINARY",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::TimestampWithTimeZone => "TIMESTAMP_WITH_TIME_ZONE",
            LogicalType::Interval => "INTERVAL",
            LogicalType::Array => "ARRAY",
            LogicalType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Result of mapping one native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedType {
    pub logical_type: LogicalType,
    /// Always `true`: the federation layer widens nullability uniformly.
    pub nullable: bool,
}

/// Maps a backend-declared type name to its logical type.
pub fn map_native_type(native_type: &str) -> MappedType {
    MappedType {
        logical_type: logical_type_for(native_type),
        nullable: true,
    }
}

fn logical_type_for(native_type: &str) -> LogicalType {
    let lower = native_type.trim().to_lowercase();

    // Check for array types first
    if lower.ends_with("[]") || lower.starts_with("array") || lower.starts_with('_') {
        return LogicalType::Array;
    }

    let normalized = normalize(&lower);
    match normalized.as_str() {
        "boolean" | "bool" | "bit" => LogicalType::Boolean,

        "tinyint" | "int1" | "utinyint" => LogicalType::TinyInt,
        "smallint" | "int2" | "smallserial" | "serial2" | "usmallint" => LogicalType::SmallInt,
        "integer" | "int" | "int4" | "serial" | "serial4" | "mediumint" | "uinteger" => {
            LogicalType::Integer
        }
        "bigint" | "int8" | "bigserial" | "serial8" | "long" | "ubigint" => LogicalType::BigInt,

        "numeric" | "decimal" | "dec" | "number" | "money" | "smallmoney" | "hugeint"
        | "uhugeint" => LogicalType::Decimal,
        "real" | "float4" => LogicalType::Real,
        "double" | "double precision" | "float8" | "float" => LogicalType::Double,

        "char" | "character" | "bpchar" | "nchar" => LogicalType::Char,
        "varchar" | "character varying" | "nvarchar" | "varchar2" | "text" | "string"
        | "citext" | "name" | "tinytext" | "mediumtext" | "longtext" | "ntext" | "clob"
        | "enum" | "set" => LogicalType::Varchar,

        "binary" => LogicalType::Binary,
        "varbinary" | "bytea" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "image" => {
            LogicalType::Varbinary
        }

        "date" => LogicalType::Date,
        "time" | "time without time zone" => LogicalType::Time,
        "timestamp" | "timestamp without time zone" | "datetime" | "datetime2"
        | "smalldatetime" | "timestamp_s" | "timestamp_ms" | "timestamp_ns" => {
            LogicalType::Timestamp
        }
        "timestamptz" | "timestamp with time zone" | "datetimeoffset" => {
            LogicalType::TimestampWithTimeZone
        }
        "interval" => LogicalType::Interval,

        _ => LogicalType::Unknown,
    }
}

/// Strips type parameters and modifiers: `decimal(18, 3)` → `decimal`,
/// `timestamp(3) with time zone` → `timestamp with time zone`,
/// `int(11) unsigned zerofill` → `int`.
fn normalize(lower: &str) -> String {
    let mut stripped = String::with_capacity(lower.len());
    let mut depth = 0usize;
    for ch in lower.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    stripped
        .split_whitespace()
        .filter(|word| !matches!(*word, "unsigned" | "signed" | "zerofill"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn logical(native: &str) -> LogicalType {
        map_native_type(native).logical_type
    }

    #[test]
    fn maps_common_declared_types() {
        assert_eq!(logical("INTEGER"), LogicalType::Integer);
        assert_eq!(logical("VARCHAR(50)"), LogicalType::Varchar);
        assert_eq!(logical("character varying"), LogicalType::Varchar);
        assert_eq!(logical("DECIMAL(18,3)"), LogicalType::Decimal);
        assert_eq!(logical("double precision"), LogicalType::Double);
        assert_eq!(logical("TIMESTAMP WITH TIME ZONE"), LogicalType::TimestampWithTimeZone);
        assert_eq!(logical("timestamp(3) with time zone"), LogicalType::TimestampWithTimeZone);
        assert_eq!(logical("int(11) unsigned"), LogicalType::Integer);
        assert_eq!(logical("BLOB"), LogicalType::Varbinary);
        assert_eq!(logical("  Date "), LogicalType::Date);
    }

    #[test]
    fn maps_array_syntaxes() {
        assert_eq!(logical("INTEGER[]"), LogicalType::Array);
        assert_eq!(logical("ARRAY<STRING>"), LogicalType::Array);
        assert_eq!(logical("_int4"), LogicalType::Array);
    }

    #[test]
    fn unknown_types_degrade_to_unknown() {
        for native in ["uuid", "jsonb", "geometry", "STRUCT(a INTEGER)", "inet", ""] {
            let mapped = map_native_type(native);
            assert_eq!(mapped.logical_type, LogicalType::Unknown, "{native}");
            assert!(mapped.nullable);
        }
    }

    #[test]
    fn logical_type_serializes_as_sql_name() {
        assert_eq!(
            serde_json::to_string(&LogicalType::TimestampWithTimeZone).unwrap(),
            "\"TIMESTAMP_WITH_TIME_ZONE\""
        );
        assert_eq!(LogicalType::Varchar.to_string(), "VARCHAR");
    }

    proptest! {
        #[test]
        fn every_mapping_is_nullable(native in ".*") {
            prop_assert!(map_native_type(&native).nullable);
        }

        #[test]
        fn length_parameters_do_not_change_the_mapping(len in 1u32..10_000) {
            prop_assert_eq!(logical(&format!("varchar({len})")), LogicalType::Varchar);
            prop_assert_eq!(logical(&format!("CHAR({len})")), LogicalType::Char);
        }
    }
}
