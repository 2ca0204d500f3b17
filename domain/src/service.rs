use tracing::debug;

use crate::validate::validate_target_url;
use crate::{Alias, AliasGenerator, AliasStore, CoreError, NewMapping, UrlMapping};

/// Application service orchestrating creation and resolution of mappings.
///
/// Generic over the store and the alias generator. Uniqueness is left to the
/// store; the service never checks for an existing alias before saving.
pub struct ShortenerService<S: AliasStore, G: AliasGenerator> {
    store: S,
    generator: G,
    generated_retries: u32,
}

impl<S: AliasStore, G: AliasGenerator> ShortenerService<S, G> {
    pub fn new(store: S, generator: G) -> Self {
        Self {
            store,
            generator,
            generated_retries: 0,
        }
    }

    /// Extra attempts with a fresh alias when a generated one collides.
    /// Zero surfaces the first conflict to the caller. Caller-supplied
    /// aliases are never retried.
    pub fn with_generated_retries(mut self, retries: u32) -> Self {
        self.generated_retries = retries;
        self
    }

    /// Create a new mapping.
    pub fn shorten(&self, input: NewMapping) -> Result<UrlMapping, CoreError> {
        validate_target_url(&input.target_url)?;
        let target_url = input.target_url.trim();

        if let Some(alias) = input.alias {
            return self.persist(target_url, alias);
        }

        let mut attempt = 0;
        loop {
            let alias = self.generator.next_alias();
            match self.persist(target_url, alias.clone()) {
                Err(CoreError::AliasConflict) if attempt < self.generated_retries => {
                    debug!(alias = %alias, attempt, "generated alias collided, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn persist(&self, target_url: &str, alias: Alias) -> Result<UrlMapping, CoreError> {
        let id = self.store.save(target_url, &alias)?;
        Ok(UrlMapping {
            id,
            alias,
            target_url: target_url.to_string(),
        })
    }

    /// Resolve an alias to its target URL.
    pub fn resolve(&self, alias: &Alias) -> Result<String, CoreError> {
        self.store.lookup(alias)
    }

    /// Remove a mapping; succeeds whether or not it existed.
    pub fn remove(&self, alias: &Alias) -> Result<(), CoreError> {
        self.store.delete(alias)
    }
}
