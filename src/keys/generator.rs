//! Key identifier generation.
//!
//! Two formats are supported:
//! - [`KeyScheme::Uuid`]: `KEY-` followed by an upper-case v4 UUID
//! - [`KeyScheme::Grouped`]: 20 characters from `A-Z0-9` in five dash-separated
//!   groups of four, e.g. `7QK2-M0ZD-4HNA-X9PE-C31L`
//!
//! Generation is a pure function of the supplied RNG. Production callers pass
//! the thread-local CSPRNG; tests pass a seeded `StdRng`.

use crate::KeywardenError;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Characters a grouped key is drawn from.
pub const GROUPED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters in a grouped key.
pub const GROUPED_KEY_CHARS: usize = 20;

/// Characters per dash-separated group.
pub const GROUP_SIZE: usize = 4;

/// Prefix for UUID keys.
pub const UUID_KEY_PREFIX: &str = "KEY-";

/// Key identifier format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    /// `KEY-` + upper-case v4 UUID.
    Uuid,
    /// `XXXX-XXXX-XXXX-XXXX-XXXX` over `A-Z0-9`.
    #[default]
    Grouped,
}

impl KeyScheme {
    /// Mint a key in this scheme using the given entropy source.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self {
            KeyScheme::Uuid => uuid_key(rng),
            KeyScheme::Grouped => grouped_key(rng),
        }
    }

    /// Mint a key using the thread-local CSPRNG.
    pub fn generate(&self) -> String {
        self.generate_with(&mut rand::thread_rng())
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyScheme::Uuid => f.write_str("uuid"),
            KeyScheme::Grouped => f.write_str("grouped"),
        }
    }
}

impl FromStr for KeyScheme {
    type Err = KeywardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(KeyScheme::Uuid),
            "grouped" => Ok(KeyScheme::Grouped),
            other => Err(KeywardenError::ConfigError(format!(
                "unknown key scheme '{}', expected 'uuid' or 'grouped'",
                other
            ))),
        }
    }
}

fn uuid_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.gen();
    let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
    format!("{}{}", UUID_KEY_PREFIX, uuid.to_string().to_uppercase())
}

fn grouped_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let groups = GROUPED_KEY_CHARS / GROUP_SIZE;
    let mut key = String::with_capacity(GROUPED_KEY_CHARS + groups - 1);

    for i in 0..GROUPED_KEY_CHARS {
        if i > 0 && i % GROUP_SIZE == 0 {
            key.push('-');
        }
        let idx = rng.gen_range(0..GROUPED_ALPHABET.len());
        key.push(GROUPED_ALPHABET[idx] as char);
    }

    key
}
