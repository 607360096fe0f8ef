use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use tracing::{debug, warn};
use uuid::Builder;

/// Detected once per process, see [`KeyGenerator::global`]
static GLOBAL: LazyLock<KeyGenerator> = LazyLock::new(KeyGenerator::detect);

/// Mixed into fallback seeds so two batches in the same nanosecond differ
static FALLBACK_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Where key randomness comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomSource {
    /// Thread-local CSPRNG seeded from the operating system
    Os,
    /// Time-seeded PRNG. Keys are still valid UUIDv4 strings but uniqueness
    /// is only as good as the seed.
    Fallback,
}

/// Generates UUIDv4 render keys for log records.
///
/// The random source is chosen when the generator is built, never per key.
#[derive(Clone, Copy, Debug)]
pub struct KeyGenerator {
    source: RandomSource,
}

impl KeyGenerator {
    /// Probe the OS random source and pick the strongest available path
    pub fn detect() -> Self {
        let mut probe = [0u8; 16];
        match OsRng.try_fill_bytes(&mut probe) {
            Ok(()) => {
                debug!("using OS random source for record keys");
                Self::with_source(RandomSource::Os)
            }
            Err(e) => {
                warn!(error = %e, "OS random source unavailable, record keys use a seeded PRNG");
                Self::with_source(RandomSource::Fallback)
            }
        }
    }

    /// Shared generator, detected on first use
    pub fn global() -> Self {
        *GLOBAL
    }

    /// Build a generator with an explicit source
    pub fn with_source(source: RandomSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> RandomSource {
        self.source
    }

    /// Generate a single key
    pub fn generate_one(&self) -> String {
        match self.source {
            RandomSource::Os => key_from(&mut rand::rng()),
            RandomSource::Fallback => key_from(&mut fallback_rng()),
        }
    }

    /// Generate `count` keys, acquiring the random source once for the batch
    pub fn generate_many(&self, count: usize) -> Vec<String> {
        match self.source {
            RandomSource::Os => {
                let mut rng = rand::rng();
                (0..count).map(|_| key_from(&mut rng)).collect()
            }
            RandomSource::Fallback => {
                let mut rng = fallback_rng();
                (0..count).map(|_| key_from(&mut rng)).collect()
            }
        }
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::global()
    }
}

/// Fill 16 random bytes and stamp the UUIDv4 version and variant bits
fn key_from<R: RngCore>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}

fn fallback_rng() -> SmallRng {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let sequence = FALLBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SmallRng::seed_from_u64(nanos ^ sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    fn uuid_v4_pattern() -> Regex {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$").unwrap()
    }

    #[test]
    fn test_generate_one_is_uuid_v4() {
        let key = KeyGenerator::with_source(RandomSource::Os).generate_one();
        assert_eq!(key.len(), 36);
        assert!(uuid_v4_pattern().is_match(&key), "bad key: {key}");
    }

    #[test]
    fn test_generate_many_counts() {
        let generator = KeyGenerator::with_source(RandomSource::Os);
        assert!(generator.generate_many(0).is_empty());
        assert_eq!(generator.generate_many(1).len(), 1);
        assert_eq!(generator.generate_many(2500).len(), 2500);
    }

    #[test]
    fn test_generate_many_distinct_and_well_formed() {
        let pattern = uuid_v4_pattern();
        let keys = KeyGenerator::with_source(RandomSource::Os).generate_many(5000);
        assert!(keys.iter().all(|k| pattern.is_match(k)));

        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_fallback_keys_are_well_formed() {
        let pattern = uuid_v4_pattern();
        let generator = KeyGenerator::with_source(RandomSource::Fallback);

        let keys = generator.generate_many(1000);
        assert_eq!(keys.len(), 1000);
        assert!(keys.iter().all(|k| pattern.is_match(k)));
        assert!(pattern.is_match(&generator.generate_one()));
    }

    #[test]
    fn test_fallback_batches_differ() {
        let generator = KeyGenerator::with_source(RandomSource::Fallback);
        let first = generator.generate_many(10);
        let second = generator.generate_many(10);
        assert_ne!(first, second);
    }

    #[test]
    fn test_detect_prefers_os_source() {
        assert_eq!(KeyGenerator::detect().source(), RandomSource::Os);
        assert_eq!(KeyGenerator::global().source(), RandomSource::Os);
    }
}
