// Constants for the layout pass

/// Bucket capacity used when no configuration overrides it.
/// 64 bytes matches the cache line of current x86-64 and AArch64 cores.
pub const DEFAULT_CACHE_LINE_BYTES: u64 = 64;

/// Widths reach the pass in bits
pub const BITS_PER_BYTE: u64 = 8;
