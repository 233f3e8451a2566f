//! Short key generation and custom key validation.
//!
//! Generated keys are drawn uniformly from the base62 alphabet using an
//! injected random source, so tests can replay a seed. Custom keys accept a
//! slightly wider alphabet that also allows `-` and `_`.

use crate::error::AppError;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// The 62 symbols used for generated keys.
pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Minimum length of a custom key.
pub const MIN_CUSTOM_KEY_LEN: usize = 3;

/// Width of the `short_key` column; no key may be longer.
pub const MAX_KEY_LEN: usize = 50;

static CUSTOM_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid custom key regex"));

/// Random short key source.
///
/// Holds its RNG behind a mutex so one generator can be shared by every
/// concurrent caller of the service.
pub struct KeyGenerator {
    rng: Mutex<StdRng>,
}

impl KeyGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Deterministic generator for tests and reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Produces a candidate key of exactly `length` base62 symbols.
    ///
    /// Makes no uniqueness claim; callers check the store and the store's
    /// insert is the final gate.
    ///
    /// # Examples
    ///
    /// ```
    /// use url_shortener_core::utils::key_generator::KeyGenerator;
    ///
    /// let generator = KeyGenerator::from_seed(7);
    /// let key = generator.generate(6);
    /// assert_eq!(key.len(), 6);
    /// assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    /// ```
    pub fn generate(&self, length: usize) -> String {
        let mut rng = self.rng.lock();
        (0..length)
            .map(|_| BASE62_ALPHABET[rng.random_range(0..BASE62_ALPHABET.len())] as char)
            .collect()
    }
}

/// Validates the format of a user-provided custom key.
///
/// # Rules
///
/// - Length: 3-50 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
///
/// # Errors
///
/// Returns [`AppError::InvalidFormat`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use url_shortener_core::utils::key_generator::validate_custom_key;
///
/// assert!(validate_custom_key("my-link").is_ok());
/// assert!(validate_custom_key("ab").is_err());        // Too short
/// assert!(validate_custom_key("my link").is_err());   // Space
/// ```
pub fn validate_custom_key(key: &str) -> Result<(), AppError> {
    if !CUSTOM_KEY_REGEX.is_match(key) {
        return Err(AppError::invalid_format(
            "Custom key can only contain letters, numbers, hyphens, and underscores",
            json!({ "key": key }),
        ));
    }

    if key.len() < MIN_CUSTOM_KEY_LEN {
        return Err(AppError::invalid_format(
            "Custom key must be at least 3 characters long",
            json!({ "key": key, "provided_length": key.len() }),
        ));
    }

    if key.len() > MAX_KEY_LEN {
        return Err(AppError::invalid_format(
            "Custom key must be at most 50 characters long",
            json!({ "provided_length": key.len() }),
        ));
    }

    Ok(())
}
