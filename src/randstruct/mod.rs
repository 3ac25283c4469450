//! Structure layout randomization
//!
//! The pass runs once per eligible record:
//!
//! ```text
//! should_randomize → classify → pack → shuffle → reassemble → commit
//! ```
//!
//! - [`classify`]: split members into non-fields, fields and the trailing
//!   flexible array member
//! - [`bucket`]: group fields into cache-line buckets and bit-field runs
//! - [`shuffle`]: permute buckets and the fields inside packed buckets
//! - [`reassemble`]: non-fields, then shuffled fields, then the flexible array
//!
//! Only the final commit mutates the record, and it only reorders members.

pub mod bucket;
pub mod classify;
pub mod shuffle;

use crate::composite::{Composite, ScopedRecord};
use crate::config::RandstructConfig;
use crate::decl::sizes::Scope;
use crate::decl::{Decl, RecordDecl};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use bucket::pack;
use classify::{classify, Classified};
use rand::rngs::StdRng;
use shuffle::shuffle;

/// Decide whether `record` opted in to layout randomization.
///
/// Unions are never randomized. A record marked both `randomize_layout` and
/// `no_randomize_layout` gets a warning and is left alone.
pub fn should_randomize<C: Composite + ?Sized>(record: &C, sink: &mut dyn DiagnosticSink) -> bool {
    if record.is_union() {
        return false;
    }

    let attrs = record.layout_attrs();
    if attrs.randomize && attrs.no_randomize {
        sink.report(Diagnostic::warning(
            DiagnosticKind::RandomizeAttrConflict,
            record.name(),
            record.location(),
        ));
    }

    !attrs.no_randomize && attrs.randomize
}

/// Final member order: non-fields, shuffled fields, flexible array member.
pub fn reassemble(classified: &Classified, shuffled: &[usize]) -> Vec<usize> {
    let mut order = Vec::with_capacity(
        classified.non_fields.len() + shuffled.len() + usize::from(classified.flexible_array.is_some()),
    );
    order.extend_from_slice(&classified.non_fields);
    order.extend_from_slice(shuffled);
    order.extend(classified.flexible_array);
    order
}

/// The layout randomization pass, with its pass-scoped random source
pub struct Randstruct {
    rng: StdRng,
    capacity_bits: u64,
}

impl Randstruct {
    pub fn new(config: &RandstructConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.seed.rng(),
            capacity_bits: config.capacity_bits(),
        })
    }

    /// Bucket capacity in bits
    pub fn capacity_bits(&self) -> u64 {
        self.capacity_bits
    }

    /// Reorder the members of `record`.
    ///
    /// Returns `false` without touching the record for unions and records
    /// without fields.
    pub fn randomize_layout<C: Composite + ?Sized>(&mut self, record: &mut C) -> Result<bool> {
        if record.is_union() {
            tracing::debug!(record = record.name(), "union layout left unchanged");
            return Ok(false);
        }

        let members = record.members();
        let classified = classify(&members);
        if classified.fields.is_empty() {
            return Ok(false);
        }

        let buckets = pack(&classified.fields, self.capacity_bits);
        tracing::debug!(
            record = record.name(),
            fields = classified.fields.len(),
            buckets = buckets.len(),
            runs = buckets.iter().filter(|b| b.is_bitfield_run()).count(),
            "packed fields"
        );

        let shuffled = shuffle(buckets, &mut self.rng);
        let order = reassemble(&classified, &shuffled);
        tracing::debug!(record = record.name(), ?order, "committing randomized layout");

        record.commit_order(&order)?;
        Ok(true)
    }

    /// Randomize every eligible record in `records`, nested definitions
    /// first. Returns the number of records whose new order was committed.
    pub fn randomize_records(
        &mut self,
        records: &mut [RecordDecl],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<usize> {
        let snapshot = records.to_vec();
        let scope = Scope::with_records(&snapshot);

        let mut reordered = 0;
        for record in records.iter_mut() {
            reordered += self.visit(record, &scope, sink)?;
        }
        Ok(reordered)
    }

    fn visit(
        &mut self,
        record: &mut RecordDecl,
        scope: &Scope<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<usize> {
        let mut reordered = 0;

        // Widths only depend on the set of fields, so a pre-pass copy is
        // good enough for resolving nested types.
        let snapshot = record.clone();
        let inner = scope.enter(&snapshot);
        for decl in record.decls.iter_mut() {
            if let Decl::Record(nested) = decl {
                reordered += self.visit(nested, &inner, sink)?;
            }
        }

        if should_randomize(&*record, sink)
            && self.randomize_layout(&mut ScopedRecord::new(record, scope))?
        {
            reordered += 1;
        }

        Ok(reordered)
    }
}
