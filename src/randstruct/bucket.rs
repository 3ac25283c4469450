//! Cache-line bucketing
//!
//! Fields are grouped greedily, first-fit, into buckets of roughly one cache
//! line. Consecutive bit-fields form a run instead: a run has no capacity
//! limit and is never reordered internally, so adjacent bit-fields keep
//! sharing their storage unit.
//!
//! # Packing loop
//!
//! The work list is a queue. A field that does not fit the open bucket goes
//! to the back and bumps a skip counter; once every remaining field has been
//! skipped, the open bucket is closed and a fresh one started. A field at
//! least as wide as a whole bucket gets a bucket of its own.

use super::classify::PendingField;
use std::collections::VecDeque;

/// A group of fields that moves as one unit when shuffled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    /// Fields that may be reordered among themselves
    Packed { fields: Vec<usize>, size: u64 },
    /// Adjacent bit-fields, kept in declaration order
    BitfieldRun { fields: Vec<usize> },
}

impl Bucket {
    pub fn packed() -> Self {
        Bucket::Packed {
            fields: Vec::new(),
            size: 0,
        }
    }

    pub fn bitfield_run() -> Self {
        Bucket::BitfieldRun { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[usize] {
        match self {
            Bucket::Packed { fields, .. } | Bucket::BitfieldRun { fields } => fields,
        }
    }

    pub fn is_bitfield_run(&self) -> bool {
        matches!(self, Bucket::BitfieldRun { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn can_fit(&self, width: u64, capacity: u64) -> bool {
        match self {
            Bucket::Packed { size, .. } => size.saturating_add(width) <= capacity,
            Bucket::BitfieldRun { .. } => true,
        }
    }

    pub fn is_full(&self, capacity: u64) -> bool {
        match self {
            Bucket::Packed { size, .. } => *size >= capacity,
            Bucket::BitfieldRun { .. } => false,
        }
    }

    pub fn add_field(&mut self, index: usize, width: u64) {
        match self {
            Bucket::Packed { fields, size } => {
                fields.push(index);
                *size = size.saturating_add(width);
            }
            Bucket::BitfieldRun { fields } => fields.push(index),
        }
    }
}

fn close(buckets: &mut Vec<Bucket>, bucket: Option<Bucket>) {
    if let Some(bucket) = bucket.filter(|b| !b.is_empty()) {
        buckets.push(bucket);
    }
}

/// Group `fields` into buckets and bit-field runs.
///
/// Buckets come back in the order they were closed. `capacity` and field
/// widths are in bits.
pub fn pack(fields: &[PendingField], capacity: u64) -> Vec<Bucket> {
    let mut queue: VecDeque<PendingField> = fields.iter().copied().collect();
    let mut buckets = Vec::new();

    let mut current: Option<Bucket> = None;
    let mut run: Option<Bucket> = None;
    let mut skipped = 0usize;

    while !queue.is_empty() {
        // Everything left has been tried against the open bucket
        if skipped >= queue.len() {
            skipped = 0;
            close(&mut buckets, current.take());
        }

        let Some(field) = queue.pop_front() else {
            break;
        };

        if field.shape.is_run_bit_field() {
            run.get_or_insert_with(Bucket::bitfield_run)
                .add_field(field.index, 1);
            continue;
        }

        // Ordinary fields (and zero-width bit-fields) end a run
        close(&mut buckets, run.take());

        let width = field.shape.storage_bits;
        if width >= capacity {
            let mut oversized = Bucket::packed();
            oversized.add_field(field.index, width);
            buckets.push(oversized);
            continue;
        }

        let bucket = current.get_or_insert_with(Bucket::packed);
        if bucket.can_fit(width, capacity) {
            bucket.add_field(field.index, width);
            if bucket.is_full(capacity) {
                skipped = 0;
                close(&mut buckets, current.take());
            }
        } else {
            tracing::trace!(index = field.index, width, "field deferred to a later bucket");
            skipped += 1;
            queue.push_back(field);
        }
    }

    close(&mut buckets, current);
    close(&mut buckets, run);

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::FieldShape;

    const CAPACITY: u64 = 512;

    fn plain(index: usize, bits: u64) -> PendingField {
        PendingField {
            index,
            shape: FieldShape::plain(bits),
        }
    }

    fn bits(index: usize, width: u32) -> PendingField {
        PendingField {
            index,
            shape: FieldShape::bit_field(32, width),
        }
    }

    #[test]
    fn test_small_fields_share_a_bucket() {
        let fields: Vec<_> = (0..6).map(|i| plain(i, 32)).collect();
        let buckets = pack(&fields, CAPACITY);

        assert_eq!(
            buckets,
            vec![Bucket::Packed {
                fields: vec![0, 1, 2, 3, 4, 5],
                size: 192
            }]
        );
    }

    #[test]
    fn test_full_bucket_is_closed() {
        let fields: Vec<_> = (0..10).map(|i| plain(i, 64)).collect();
        let buckets = pack(&fields, CAPACITY);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].fields(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(buckets[1].fields(), &[8, 9]);
    }

    #[test]
    fn test_oversized_field_gets_own_bucket() {
        let fields = vec![plain(0, 32), plain(1, 1024), plain(2, 512), plain(3, 32)];
        let buckets = pack(&fields, CAPACITY);

        assert_eq!(
            buckets,
            vec![
                Bucket::Packed {
                    fields: vec![1],
                    size: 1024
                },
                Bucket::Packed {
                    fields: vec![2],
                    size: 512
                },
                Bucket::Packed {
                    fields: vec![0, 3],
                    size: 64
                },
            ]
        );
    }

    #[test]
    fn test_field_that_does_not_fit_is_deferred() {
        // 384 + 256 overflows; the 64-bit field behind it fills the gap first
        let fields = vec![plain(0, 384), plain(1, 256), plain(2, 64)];
        let buckets = pack(&fields, CAPACITY);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].fields(), &[0, 2]);
        assert_eq!(buckets[1].fields(), &[1]);
    }

    #[test]
    fn test_bit_fields_form_runs() {
        let fields = vec![
            plain(0, 32),
            plain(1, 32),
            bits(2, 1),
            bits(3, 1),
            bits(4, 1),
            plain(5, 32),
        ];
        let buckets = pack(&fields, CAPACITY);

        assert_eq!(
            buckets,
            vec![
                Bucket::BitfieldRun {
                    fields: vec![2, 3, 4]
                },
                Bucket::Packed {
                    fields: vec![0, 1, 5],
                    size: 96
                },
            ]
        );
    }

    #[test]
    fn test_zero_width_bit_field_splits_runs() {
        let fields = vec![bits(0, 1), bits(1, 0), bits(2, 1)];
        let buckets = pack(&fields, CAPACITY);

        assert_eq!(
            buckets,
            vec![
                Bucket::BitfieldRun { fields: vec![0] },
                Bucket::Packed {
                    fields: vec![1],
                    size: 32
                },
                Bucket::BitfieldRun { fields: vec![2] },
            ]
        );
    }

    #[test]
    fn test_all_bit_fields_make_one_run() {
        let fields: Vec<_> = (0..5).map(|i| bits(i, 3)).collect();
        let buckets = pack(&fields, CAPACITY);
        assert_eq!(
            buckets,
            vec![Bucket::BitfieldRun {
                fields: vec![0, 1, 2, 3, 4]
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(pack(&[], CAPACITY).is_empty());
    }

    #[test]
    fn test_capacity_checks() {
        let mut bucket = Bucket::packed();
        bucket.add_field(0, 500);
        assert!(bucket.can_fit(12, CAPACITY));
        assert!(!bucket.can_fit(13, CAPACITY));
        assert!(!bucket.is_full(CAPACITY));
        bucket.add_field(1, 12);
        assert!(bucket.is_full(CAPACITY));

        let run = Bucket::bitfield_run();
        assert!(run.can_fit(u64::MAX, CAPACITY));
        assert!(!run.is_full(CAPACITY));
    }
}
