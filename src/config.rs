//! Pass configuration
//!
//! Seeding is explicit. Production builds should use [`SeedPolicy::Entropy`];
//! reproducible builds and tests pick [`SeedPolicy::Fixed`] or a
//! [`SeedPolicy::Phrase`] shared across the build.
//!
//! # Example
//! ```
//! use randstruct::config::{RandstructConfig, SeedPolicy};
//!
//! let config = RandstructConfig::from_toml_str(
//!     r#"
//!     cache_line_bytes = 32
//!     seed = { phrase = "release-2026" }
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.cache_line_bytes, 32);
//! assert_eq!(config.seed, SeedPolicy::Phrase("release-2026".to_string()));
//! ```

use crate::constants::{BITS_PER_BYTE, DEFAULT_CACHE_LINE_BYTES};
use crate::errors::{LayoutError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where the pass-scoped random source gets its seed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Fresh OS entropy for every pass instance
    #[default]
    Entropy,
    /// Fixed numeric seed
    Fixed(u64),
    /// Seed string, hashed with SHA-256 into the generator seed
    Phrase(String),
}

impl SeedPolicy {
    /// Build the generator this policy describes
    pub fn rng(&self) -> StdRng {
        match self {
            SeedPolicy::Entropy => StdRng::from_entropy(),
            SeedPolicy::Fixed(seed) => StdRng::seed_from_u64(*seed),
            SeedPolicy::Phrase(phrase) => {
                let digest = Sha256::digest(phrase.as_bytes());
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&digest);
                StdRng::from_seed(seed)
            }
        }
    }
}

/// Configuration for the layout randomization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandstructConfig {
    /// Bucket capacity in bytes. Fields are grouped into buckets of roughly
    /// one cache line before the buckets are shuffled.
    pub cache_line_bytes: u64,

    /// Seeding policy for the pass-scoped random source
    pub seed: SeedPolicy,
}

impl Default for RandstructConfig {
    fn default() -> Self {
        Self {
            cache_line_bytes: DEFAULT_CACHE_LINE_BYTES,
            seed: SeedPolicy::Entropy,
        }
    }
}

impl RandstructConfig {
    /// Default configuration with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: SeedPolicy::Fixed(seed),
            ..Self::default()
        }
    }

    pub fn with_cache_line_bytes(mut self, bytes: u64) -> Self {
        self.cache_line_bytes = bytes;
        self
    }

    pub fn with_seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: RandstructConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_line_bytes == 0 {
            return Err(LayoutError::InvalidConfig(
                "cache_line_bytes must be greater than zero".to_string(),
            ));
        }
        if self.cache_line_bytes.checked_mul(BITS_PER_BYTE).is_none() {
            return Err(LayoutError::InvalidConfig(format!(
                "cache_line_bytes {} overflows the bucket width",
                self.cache_line_bytes
            )));
        }
        Ok(())
    }

    /// Bucket capacity in bits
    pub fn capacity_bits(&self) -> u64 {
        self.cache_line_bytes.saturating_mul(BITS_PER_BYTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults() {
        let config = RandstructConfig::default();
        assert_eq!(config.cache_line_bytes, 64);
        assert_eq!(config.capacity_bits(), 512);
        assert_eq!(config.seed, SeedPolicy::Entropy);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = RandstructConfig::from_toml_str("").unwrap();
        assert_eq!(config, RandstructConfig::default());
    }

    #[test]
    fn test_toml_seed_variants() {
        let fixed = RandstructConfig::from_toml_str("seed = { fixed = 7 }").unwrap();
        assert_eq!(fixed.seed, SeedPolicy::Fixed(7));

        let entropy = RandstructConfig::from_toml_str("seed = \"entropy\"").unwrap();
        assert_eq!(entropy.seed, SeedPolicy::Entropy);
    }

    #[test]
    fn test_toml_round_trip() {
        for seed in [
            SeedPolicy::Entropy,
            SeedPolicy::Fixed(99),
            SeedPolicy::Phrase("nightly".to_string()),
        ] {
            let config = RandstructConfig::default()
                .with_cache_line_bytes(128)
                .with_seed(seed);
            let text = toml::to_string(&config).unwrap();
            assert_eq!(RandstructConfig::from_toml_str(&text).unwrap(), config);
        }
    }

    #[test]
    fn test_zero_cache_line_rejected() {
        let err = RandstructConfig::from_toml_str("cache_line_bytes = 0").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = RandstructConfig::from_toml_str("cache_line_bytes = \"wide\"").unwrap_err();
        assert!(matches!(err, LayoutError::ConfigParse(_)));
    }

    #[test]
    fn test_seeded_generators_are_reproducible() {
        let a: u64 = SeedPolicy::Fixed(42).rng().gen();
        let b: u64 = SeedPolicy::Fixed(42).rng().gen();
        assert_eq!(a, b);

        let phrase = SeedPolicy::Phrase("kernel".to_string());
        let c: u64 = phrase.rng().gen();
        let d: u64 = phrase.rng().gen();
        assert_eq!(c, d);

        let other: u64 = SeedPolicy::Phrase("kernel2".to_string()).rng().gen();
        assert_ne!(c, other);
    }
}
