//! Host seam for the layout pass
//!
//! [`Composite`] is everything the pass reads from, and writes back to, a
//! record type. The pass sees members only as [`Member`] shapes addressed by
//! index; the declarations themselves stay with the host.

use crate::constants::BITS_PER_BYTE;
use crate::decl::sizes::{sizeof_type, Scope};
use crate::decl::{Decl, LayoutAttrs, RecordDecl, SourceLocation};
use crate::errors::Result;

/// Layout-relevant facts about one data member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    /// Width of the field's declared type, in bits
    pub storage_bits: u64,
    /// Declared bit-field width, if this is a bit-field
    pub bit_width: Option<u32>,
    /// Trailing incomplete array (`T name[]`)
    pub is_flexible_array: bool,
}

impl FieldShape {
    pub fn plain(storage_bits: u64) -> Self {
        FieldShape {
            storage_bits,
            bit_width: None,
            is_flexible_array: false,
        }
    }

    pub fn bit_field(storage_bits: u64, width: u32) -> Self {
        FieldShape {
            bit_width: Some(width),
            ..Self::plain(storage_bits)
        }
    }

    pub fn flexible_array() -> Self {
        FieldShape {
            is_flexible_array: true,
            ..Self::plain(0)
        }
    }

    pub fn is_bit_field(&self) -> bool {
        self.bit_width.is_some()
    }

    pub fn is_zero_width_bit_field(&self) -> bool {
        self.bit_width == Some(0)
    }

    /// Bit-fields that carry data and must stay in their run
    pub fn is_run_bit_field(&self) -> bool {
        self.is_bit_field() && !self.is_zero_width_bit_field()
    }
}

/// One entry of a record's member list, as seen by the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// Nested type, static member, or anything else that is not data
    NonField,
    Field(FieldShape),
}

/// A record type the layout pass can inspect and reorder
pub trait Composite {
    fn name(&self) -> &str;

    fn location(&self) -> SourceLocation;

    fn is_union(&self) -> bool;

    fn layout_attrs(&self) -> LayoutAttrs;

    /// Shapes of the current members, in declaration order
    fn members(&self) -> Vec<Member>;

    /// Rewrite the member list; `order[i]` is the current index of the member
    /// that moves to position `i`.
    fn commit_order(&mut self, order: &[usize]) -> Result<()>;
}

fn member_shapes(record: &RecordDecl, scope: &Scope<'_>) -> Vec<Member> {
    let inner = scope.enter(record);
    record
        .decls
        .iter()
        .map(|decl| match decl {
            Decl::Field(field) => Member::Field(FieldShape {
                storage_bits: (sizeof_type(&field.ty, &inner) as u64).saturating_mul(BITS_PER_BYTE),
                bit_width: field.bit_width,
                is_flexible_array: field.is_flexible_array(),
            }),
            Decl::Record(_) | Decl::StaticMember { .. } => Member::NonField,
        })
        .collect()
}

impl Composite for RecordDecl {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn is_union(&self) -> bool {
        RecordDecl::is_union(self)
    }

    fn layout_attrs(&self) -> LayoutAttrs {
        self.attrs
    }

    fn members(&self) -> Vec<Member> {
        member_shapes(self, &Scope::new())
    }

    fn commit_order(&mut self, order: &[usize]) -> Result<()> {
        self.commit(order)
    }
}

/// A record together with the records visible around it, so that fields
/// typed as other records get their real widths.
pub struct ScopedRecord<'r, 's> {
    pub record: &'r mut RecordDecl,
    pub scope: &'r Scope<'s>,
}

impl<'r, 's> ScopedRecord<'r, 's> {
    pub fn new(record: &'r mut RecordDecl, scope: &'r Scope<'s>) -> Self {
        Self { record, scope }
    }
}

impl Composite for ScopedRecord<'_, '_> {
    fn name(&self) -> &str {
        &self.record.name
    }

    fn location(&self) -> SourceLocation {
        self.record.location
    }

    fn is_union(&self) -> bool {
        self.record.is_union()
    }

    fn layout_attrs(&self) -> LayoutAttrs {
        self.record.attrs
    }

    fn members(&self) -> Vec<Member> {
        member_shapes(self.record, self.scope)
    }

    fn commit_order(&mut self, order: &[usize]) -> Result<()> {
        self.record.commit(order)
    }
}
