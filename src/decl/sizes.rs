//! Type widths
//!
//! Like the rest of the declaration model, sizes are fixed and
//! platform-independent:
//! - `char`: 1 byte, `short`: 2, `int`/`float`: 4
//! - `long`/`long long`/`double`/pointer: 8
//! - `struct`: sum of field sizes (no padding or alignment)
//! - `union`: size of the largest field
//! - incomplete arrays (`name[]`) contribute 0
//!
//! Record names are resolved through a [`Scope`]: a record's own nested
//! definitions shadow the records visible around it.

use super::{BaseType, Decl, RecordDecl, RecordKind, Type};
use rustc_hash::{FxHashMap, FxHashSet};

/// Records visible by name while computing sizes
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    records: FxHashMap<&'a str, &'a RecordDecl>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RecordDecl>,
    {
        let mut scope = Self::new();
        for record in records {
            scope.records.insert(record.name.as_str(), record);
        }
        scope
    }

    /// This scope extended with the nested definitions of `record`
    pub fn enter(&self, record: &'a RecordDecl) -> Scope<'a> {
        let mut scope = self.clone();
        for nested in record.nested_records() {
            scope.records.insert(nested.name.as_str(), nested);
        }
        scope
    }

    pub fn lookup(&self, name: &str) -> Option<&'a RecordDecl> {
        self.records.get(name).copied()
    }
}

/// Calculate the size of a type in bytes
///
/// Unknown record names have size 0; resolving them is the front-end's job.
/// A record that contains itself by value also counts as 0 at the point of
/// recursion. Sizes saturate at `usize::MAX` instead of overflowing.
pub fn sizeof_type(t: &Type, scope: &Scope<'_>) -> usize {
    type_size(t, scope, &mut FxHashSet::default())
}

/// Calculate the size of a record in bytes
pub fn sizeof_record(record: &RecordDecl, scope: &Scope<'_>) -> usize {
    record_size(record, scope, &mut FxHashSet::default())
}

fn type_size(t: &Type, scope: &Scope<'_>, visiting: &mut FxHashSet<String>) -> usize {
    let base_size = if t.pointer_depth > 0 {
        8
    } else {
        match &t.base {
            BaseType::Char => 1,
            BaseType::Short => 2,
            BaseType::Int | BaseType::Float => 4,
            BaseType::Long | BaseType::LongLong | BaseType::Double => 8,
            BaseType::Void => 0,
            BaseType::Struct(name) | BaseType::Union(name) => scope
                .lookup(name)
                .map(|record| record_size(record, scope, visiting))
                .unwrap_or(0),
        }
    };

    // Incomplete dimensions count as zero elements
    t.array_dims
        .iter()
        .fold(base_size, |size, dim| size.saturating_mul(dim.unwrap_or(0)))
}

fn record_size(record: &RecordDecl, scope: &Scope<'_>, visiting: &mut FxHashSet<String>) -> usize {
    if !visiting.insert(record.name.clone()) {
        tracing::trace!(record = %record.name, "record contains itself by value");
        return 0;
    }

    let inner = scope.enter(record);
    let sizes = record
        .decls
        .iter()
        .filter_map(|decl| match decl {
            Decl::Field(field) => Some(type_size(&field.ty, &inner, visiting)),
            _ => None,
        })
        .collect::<Vec<_>>();

    visiting.remove(&record.name);

    match record.kind {
        RecordKind::Struct => sizes.into_iter().fold(0, usize::saturating_add),
        RecordKind::Union => sizes.into_iter().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::FieldDecl;

    #[test]
    fn test_scalar_sizes() {
        let scope = Scope::new();
        assert_eq!(sizeof_type(&Type::new(BaseType::Char), &scope), 1);
        assert_eq!(sizeof_type(&Type::new(BaseType::Short), &scope), 2);
        assert_eq!(sizeof_type(&Type::new(BaseType::Int), &scope), 4);
        assert_eq!(sizeof_type(&Type::new(BaseType::LongLong), &scope), 8);
        assert_eq!(
            sizeof_type(&Type::new(BaseType::Void).with_pointer(), &scope),
            8
        );
    }

    #[test]
    fn test_array_sizes() {
        let scope = Scope::new();
        let fixed = Type::new(BaseType::Int).with_array(Some(2)).with_array(Some(3));
        assert_eq!(sizeof_type(&fixed, &scope), 24);
        let flexible = Type::new(BaseType::Char).with_array(None);
        assert_eq!(sizeof_type(&flexible, &scope), 0);
    }

    #[test]
    fn test_nested_records_resolve_through_scope() {
        let inner = RecordDecl::new_union("inner")
            .with_field(FieldDecl::new("i", Type::new(BaseType::Int)))
            .with_field(FieldDecl::new("d", Type::new(BaseType::Double)));
        let outer = RecordDecl::new_struct("outer")
            .with_decl(Decl::Record(inner))
            .with_field(FieldDecl::new("c", Type::new(BaseType::Char)))
            .with_field(FieldDecl::new(
                "u",
                Type::new(BaseType::Union("inner".to_string())),
            ));

        assert_eq!(sizeof_record(&outer, &Scope::new()), 9);
    }

    #[test]
    fn test_oversized_arrays_saturate() {
        let scope = Scope::new();
        let huge = Type::new(BaseType::Long)
            .with_array(Some(1 << 40))
            .with_array(Some(1 << 40));
        assert_eq!(sizeof_type(&huge, &scope), usize::MAX);

        let record = RecordDecl::new_struct("wide")
            .with_field(FieldDecl::new("a", huge.clone()))
            .with_field(FieldDecl::new("b", huge));
        assert_eq!(sizeof_record(&record, &scope), usize::MAX);
    }

    #[test]
    fn test_record_containing_itself_terminates() {
        let node = RecordDecl::new_struct("node")
            .with_field(FieldDecl::new("value", Type::new(BaseType::Int)))
            .with_field(FieldDecl::new(
                "next",
                Type::new(BaseType::Struct("node".to_string())),
            ));
        let scope = Scope::with_records([&node]);
        assert_eq!(sizeof_record(&node, &scope), 4);
    }

    #[test]
    fn test_mutually_recursive_records_terminate() {
        let a = RecordDecl::new_struct("a")
            .with_field(FieldDecl::new("x", Type::new(BaseType::Short)))
            .with_field(FieldDecl::new("b", Type::new(BaseType::Struct("b".to_string()))));
        let b = RecordDecl::new_struct("b")
            .with_field(FieldDecl::new("y", Type::new(BaseType::Int)))
            .with_field(FieldDecl::new("a", Type::new(BaseType::Struct("a".to_string()))));
        let scope = Scope::with_records([&a, &b]);
        assert_eq!(sizeof_record(&a, &scope), 6);
        assert_eq!(sizeof_type(&Type::new(BaseType::Struct("b".to_string())), &scope), 6);
    }

    #[test]
    fn test_const_does_not_change_size() {
        let scope = Scope::new();
        let ty = Type::new(BaseType::Int).with_const();
        assert!(ty.is_const);
        assert_eq!(sizeof_type(&ty, &scope), 4);
    }

    #[test]
    fn test_unknown_record_is_zero() {
        let ty = Type::new(BaseType::Struct("missing".to_string()));
        assert_eq!(sizeof_type(&ty, &Scope::new()), 0);
    }
}
