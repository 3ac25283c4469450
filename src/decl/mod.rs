//! Declaration model for composite types
//!
//! This module holds the small front-end AST the layout pass operates on:
//! - [`RecordDecl`]: a `struct` or `union` with its ordered member list
//! - [`Decl`]: one member (data field, nested record, or static member)
//! - [`Type`] / [`BaseType`]: C types with pointer and array modifiers
//! - [`sizes`]: fixed, platform-independent type widths
//!
//! Members are owned by their record. The layout pass never creates or drops
//! a member; it only hands back a permutation of indices, which
//! [`RecordDecl::commit`] applies in one step.

pub mod sizes;

use crate::errors::{LayoutError, Result};
use rustc_hash::FxHashSet;

/// Source location information for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Base types known to the declaration model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Float,
    Double,
    Void,
    Struct(String), // Record name
    Union(String),  // Record name
}

/// Type representation with const qualifier, pointers, and arrays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub base: BaseType,
    pub is_const: bool,
    pub pointer_depth: usize, // 0 = not pointer, 1 = *, 2 = **, etc.
    pub array_dims: Vec<Option<usize>>, // None for an incomplete dimension (`name[]`)
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type {
            base,
            is_const: false,
            pointer_depth: 0,
            array_dims: Vec::new(),
        }
    }

    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_pointer(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    pub fn with_array(mut self, size: Option<usize>) -> Self {
        self.array_dims.push(size);
        self
    }

    /// True for `T name[]`: an array whose outermost dimension is unknown.
    pub fn is_incomplete_array(&self) -> bool {
        matches!(self.array_dims.first(), Some(None))
    }
}

/// Data member of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Empty for unnamed bit-fields (`int : 0;`)
    pub name: String,
    pub ty: Type,
    /// `Some(n)` for a bit-field of width `n`; `Some(0)` is a zero-width bit-field
    pub bit_width: Option<u32>,
    pub location: SourceLocation,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        FieldDecl {
            name: name.into(),
            ty,
            bit_width: None,
            location: SourceLocation::default(),
        }
    }

    pub fn bit_field(name: impl Into<String>, ty: Type, width: u32) -> Self {
        FieldDecl {
            bit_width: Some(width),
            ..FieldDecl::new(name, ty)
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn is_bit_field(&self) -> bool {
        self.bit_width.is_some()
    }

    pub fn is_zero_width_bit_field(&self) -> bool {
        self.bit_width == Some(0)
    }

    pub fn is_flexible_array(&self) -> bool {
        self.ty.is_incomplete_array()
    }
}

/// One entry in a record's member list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Field(FieldDecl),
    /// Nested `struct`/`union` definition
    Record(RecordDecl),
    StaticMember {
        name: String,
        ty: Type,
        location: SourceLocation,
    },
}

impl Decl {
    pub fn as_field(&self) -> Option<&FieldDecl> {
        match self {
            Decl::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Decl::Field(field) => &field.name,
            Decl::Record(record) => &record.name,
            Decl::StaticMember { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

/// Layout-affecting attributes attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutAttrs {
    /// `__attribute__((randomize_layout))`
    pub randomize: bool,
    /// `__attribute__((no_randomize_layout))`
    pub no_randomize: bool,
    /// `__attribute__((packed))`
    pub packed: bool,
}

/// Record (struct or union) definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
    pub name: String,
    pub kind: RecordKind,
    pub decls: Vec<Decl>,
    pub attrs: LayoutAttrs,
    pub location: SourceLocation,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        RecordDecl {
            name: name.into(),
            kind,
            decls: Vec::new(),
            attrs: LayoutAttrs::default(),
            location: SourceLocation::default(),
        }
    }

    pub fn new_struct(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::Struct)
    }

    pub fn new_union(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::Union)
    }

    pub fn with_decl(mut self, decl: Decl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn with_field(self, field: FieldDecl) -> Self {
        self.with_decl(Decl::Field(field))
    }

    pub fn with_attrs(mut self, attrs: LayoutAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn randomized(mut self) -> Self {
        self.attrs.randomize = true;
        self
    }

    pub fn not_randomized(mut self) -> Self {
        self.attrs.no_randomize = true;
        self
    }

    pub fn packed(mut self) -> Self {
        self.attrs.packed = true;
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn is_union(&self) -> bool {
        self.kind == RecordKind::Union
    }

    /// Data members, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.decls.iter().filter_map(Decl::as_field)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields().map(|f| f.name.clone()).collect()
    }

    /// Nested record definitions, in declaration order
    pub fn nested_records(&self) -> impl Iterator<Item = &RecordDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Record(record) => Some(record),
            _ => None,
        })
    }

    /// Replace the member list with the permutation named by `order`.
    ///
    /// `order[i]` is the current index of the member that should end up at
    /// position `i`. The record is left untouched when `order` is not a
    /// permutation of `0..decls.len()`.
    pub fn commit(&mut self, order: &[usize]) -> Result<()> {
        let expected = self.decls.len();
        let mut seen = FxHashSet::default();
        let valid = order.len() == expected
            && order.iter().all(|&index| index < expected && seen.insert(index));

        if !valid {
            return Err(LayoutError::NotAPermutation {
                record: self.name.clone(),
                expected,
                got: order.to_vec(),
            });
        }

        let mut slots: Vec<Option<Decl>> = self.decls.drain(..).map(Some).collect();
        self.decls = order
            .iter()
            .filter_map(|&index| slots[index].take())
            .collect();

        Ok(())
    }
}
