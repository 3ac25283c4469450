//! Bucket shuffling

use super::bucket::Bucket;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle bucket order, then the fields inside each packed bucket, and
/// flatten the result into the new field order.
///
/// Bit-field runs move as a unit and keep their internal order.
pub fn shuffle<R: Rng + ?Sized>(mut buckets: Vec<Bucket>, rng: &mut R) -> Vec<usize> {
    buckets.shuffle(rng);

    let mut order = Vec::with_capacity(buckets.iter().map(|b| b.fields().len()).sum());
    for bucket in &mut buckets {
        if let Bucket::Packed { fields, .. } = bucket {
            fields.shuffle(rng);
        }
        order.extend_from_slice(bucket.fields());
    }

    order
}
