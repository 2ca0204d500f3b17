//! Random alias generation.

use rand::Rng;

use crate::base62::alphabet;
use crate::{Alias, AliasGenerator, MAX_ALIAS_LEN};

/// Alias length used when the caller does not configure one.
pub const DEFAULT_ALIAS_LENGTH: usize = 6;

/// Produce `length` characters drawn uniformly from the base62 alphabet.
pub fn random_alias(length: usize) -> String {
    let chars = alphabet();
    let mut rng = rand::rng();
    (0..length)
        .map(|_| chars[rng.random_range(0..chars.len())] as char)
        .collect()
}

/// Generator producing random base62 aliases of a fixed length.
/// The length is clamped to `1..=MAX_ALIAS_LEN` so every output is a valid `Alias`.
#[derive(Clone, Copy, Debug)]
pub struct RandomAliasGenerator {
    length: usize,
}

impl RandomAliasGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(1, MAX_ALIAS_LEN),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomAliasGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS_LENGTH)
    }
}

impl AliasGenerator for RandomAliasGenerator {
    fn next_alias(&self) -> Alias {
        // clamped length and base62 output already satisfy every Alias rule
        Alias(random_alias(self.length))
    }
}
