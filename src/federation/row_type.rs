// SPDX-License-Identifier: Apache-2.0

//! Context-free row types and the planner type-factory protocol.
//!
//! A [`RowTypeDescriptor`] is derived once per logical table. Planners may run
//! several type contexts side by side; each one receives its own schema object
//! by applying the descriptor to its [`TypeFactory`], without any metadata I/O.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::type_mapper::LogicalType;

/// One logical column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowField {
    pub name: CompactString,
    pub logical_type: LogicalType,
    pub nullable: bool,
}

impl RowField {
    pub fn new(name: impl Into<CompactString>, logical_type: LogicalType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable,
        }
    }
}

/// Ordered, context-free row type of a logical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTypeDescriptor {
    fields: Vec<RowField>,
}

impl RowTypeDescriptor {
    pub fn new(fields: Vec<RowField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[RowField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&RowField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Materializes the descriptor in the given type context.
    pub fn apply<F: TypeFactory>(&self, factory: &F) -> F::RowType {
        let fields = self
            .fields
            .iter()
            .map(|f| factory.create_field(&f.name, f.logical_type, f.nullable))
            .collect();
        factory.create_row_type(fields)
    }
}

impl FromIterator<RowField> for RowTypeDescriptor {
    fn from_iter<I: IntoIterator<Item = RowField>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A planner's type context.
pub trait TypeFactory {
    /// Context-bound field object
    type Field;
    /// Context-bound row type (schema) object
    type RowType;

    fn create_field(&self, name: &str, logical_type: LogicalType, nullable: bool) -> Self::Field;

    fn create_row_type(&self, fields: Vec<Self::Field>) -> Self::RowType;
}

/// Capability of exposing a row type to a planner's type context.
pub trait SchemaProvider {
    fn row_type<F: TypeFactory>(&self, factory: &F) -> F::RowType;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Echoes fields back as tuples and counts materializations.
    #[derive(Default)]
    struct TupleFactory {
        rows_built: Cell<usize>,
    }

    impl TypeFactory for TupleFactory {
        type Field = (String, LogicalType, bool);
        type RowType = Vec<(String, LogicalType, bool)>;

        fn create_field(&self, name: &str, logical_type: LogicalType, nullable: bool) -> Self::Field {
            (name.to_string(), logical_type, nullable)
        }

        fn create_row_type(&self, fields: Vec<Self::Field>) -> Self::RowType {
            self.rows_built.set(self.rows_built.get() + 1);
            fields
        }
    }

    #[test]
    fn apply_preserves_field_order() {
        let descriptor: RowTypeDescriptor = [
            RowField::new("id", LogicalType::Integer, true),
            RowField::new("name", LogicalType::Varchar, true),
        ]
        .into_iter()
        .collect();

        let factory = TupleFactory::default();
        let row = descriptor.apply(&factory);
        assert_eq!(
            row,
            vec![
                ("id".to_string(), LogicalType::Integer, true),
                ("name".to_string(), LogicalType::Varchar, true),
            ]
        );
        assert_eq!(factory.rows_built.get(), 1);
    }

    #[test]
    fn each_application_yields_a_fresh_equal_schema() {
        let descriptor = RowTypeDescriptor::new(vec![RowField::new("v", LogicalType::Unknown, true)]);
        let first = TupleFactory::default();
        let second = TupleFactory::default();

        assert_eq!(descriptor.apply(&first), descriptor.apply(&second));
        assert_eq!(first.rows_built.get(), 1);
        assert_eq!(second.rows_built.get(), 1);
    }

    #[test]
    fn field_lookup_by_name() {
        let descriptor = RowTypeDescriptor::new(vec![RowField::new("id", LogicalType::BigInt, true)]);
        assert_eq!(descriptor.field("id").map(|f| f.logical_type), Some(LogicalType::BigInt));
        assert!(descriptor.field("missing").is_none());
        assert_eq!(descriptor.len(), 1);
    }
}
