//! Domain library for the URL Shortener.
//!
//! Holds the alias mapping types, the store and generator ports, and the
//! error taxonomy shared by every adapter. Keep IO concerns out of this
//! crate; the only adapter living here is the in-memory store used by tests
//! and local runs.

use std::sync::Arc;

use thiserror::Error;

/// Longest alias accepted from callers.
pub const MAX_ALIAS_LEN: usize = 64;

/// A URL-safe alias identifying a short link.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alias(String);

impl Alias {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::InvalidAlias("empty".into()));
        }
        if val.len() > MAX_ALIAS_LEN {
            return Err(CoreError::InvalidAlias(format!(
                "longer than {MAX_ALIAS_LEN} characters"
            )));
        }
        if !val
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidAlias("invalid characters".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by the store when a mapping is created.
pub type MappingId = i64;

/// Input data for creating a new mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMapping {
    pub target_url: String,
    /// `None` asks the service to generate an alias.
    pub alias: Option<Alias>,
}

/// Stored alias → URL mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlMapping {
    pub id: MappingId,
    pub alias: Alias,
    pub target_url: String,
}

/// Store port: durable alias → URL mapping with uniqueness enforcement.
///
/// Implementations must reject a duplicate alias atomically inside `save`;
/// callers never pre-check existence.
pub trait AliasStore: Send + Sync {
    /// Insert a new mapping. `AliasConflict` if the alias is already taken.
    fn save(&self, target_url: &str, alias: &Alias) -> Result<MappingId, CoreError>;
    /// Resolve an alias. `NotFound` if no mapping exists.
    fn lookup(&self, alias: &Alias) -> Result<String, CoreError>;
    /// Remove the mapping if present. Succeeds when nothing was stored.
    fn delete(&self, alias: &Alias) -> Result<(), CoreError>;
}

impl<T: AliasStore + ?Sized> AliasStore for Arc<T> {
    fn save(&self, target_url: &str, alias: &Alias) -> Result<MappingId, CoreError> {
        (**self).save(target_url, alias)
    }

    fn lookup(&self, alias: &Alias) -> Result<String, CoreError> {
        (**self).lookup(alias)
    }

    fn delete(&self, alias: &Alias) -> Result<(), CoreError> {
        (**self).delete(alias)
    }
}

/// Alias generator interface. Never consults the store.
pub trait AliasGenerator: Send + Sync {
    fn next_alias(&self) -> Alias;
}

/// Core domain errors, returned uniformly by every store operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("alias already exists")]
    AliasConflict,
    #[error("not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CoreError {
    /// True for input that was rejected before reaching the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::InvalidUrl(_) | CoreError::InvalidAlias(_))
    }
}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{}", pkg, ver)
}

pub mod adapters;
pub mod base62;
pub mod generate;
pub mod service;
pub mod validate;
