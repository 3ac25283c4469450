//! Member classification
//!
//! Splits a record's member list into the parts the pass treats differently:
//! non-field declarations (kept in place, ahead of the fields), fields to be
//! shuffled, and the trailing flexible array member.

use crate::composite::{FieldShape, Member};

/// A field awaiting placement: its member index plus its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingField {
    pub index: usize,
    pub shape: FieldShape,
}

/// Output of [`classify`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Indices of non-field declarations, in original order
    pub non_fields: Vec<usize>,
    /// Fields to randomize, in original order
    pub fields: Vec<PendingField>,
    /// Index of the flexible array member, if any
    pub flexible_array: Option<usize>,
}

/// Classify `members` by index.
///
/// Valid input has at most one flexible array member. If more turn up, the
/// last one stays trailing and the others are packed like ordinary fields so
/// that nothing is dropped.
pub fn classify(members: &[Member]) -> Classified {
    let mut classified = Classified::default();

    for (index, member) in members.iter().enumerate() {
        match member {
            Member::NonField => classified.non_fields.push(index),
            Member::Field(shape) if shape.is_flexible_array => {
                if let Some(previous) = classified.flexible_array.replace(index) {
                    tracing::trace!(index = previous, "extra flexible array member packed as a field");
                    classified.fields.push(PendingField {
                        index: previous,
                        shape: FieldShape::plain(0),
                    });
                }
            }
            Member::Field(shape) => classified.fields.push(PendingField {
                index,
                shape: *shape,
            }),
        }
    }

    classified
}
