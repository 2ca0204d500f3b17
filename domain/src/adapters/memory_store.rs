use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{Alias, AliasStore, CoreError, MappingId, UrlMapping};

/// Simple in-memory store for tests and local runs. The check-and-insert in
/// `save` happens under a single guard, so duplicates are rejected atomically.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    by_alias: BTreeMap<String, UrlMapping>,
    last_id: MappingId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                by_alias: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }

    /// Number of mappings currently stored.
    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.inner.lock().map_err(poisoned)?.by_alias.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> CoreError {
    CoreError::StoreUnavailable("mutex poisoned".into())
}

impl AliasStore for InMemoryStore {
    fn save(&self, target_url: &str, alias: &Alias) -> Result<MappingId, CoreError> {
        let mut inner = self.inner.lock().map_err(poisoned)?;
        if inner.by_alias.contains_key(alias.as_str()) {
            return Err(CoreError::AliasConflict);
        }
        inner.last_id += 1;
        let id = inner.last_id;
        inner.by_alias.insert(
            alias.as_str().to_string(),
            UrlMapping {
                id,
                alias: alias.clone(),
                target_url: target_url.to_string(),
            },
        );
        Ok(id)
    }

    fn lookup(&self, alias: &Alias) -> Result<String, CoreError> {
        let inner = self.inner.lock().map_err(poisoned)?;
        inner
            .by_alias
            .get(alias.as_str())
            .map(|m| m.target_url.clone())
            .ok_or(CoreError::NotFound)
    }

    fn delete(&self, alias: &Alias) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().map_err(poisoned)?;
        inner.by_alias.remove(alias.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn alias(s: &str) -> Alias {
        Alias::new(s).unwrap()
    }

    #[test]
    fn save_then_lookup() {
        let store = InMemoryStore::new();
        let id = store.save("https://example.com", &alias("abc123")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.lookup(&alias("abc123")).unwrap(), "https://example.com");
    }

    #[test]
    fn duplicate_alias_conflicts_and_keeps_original() {
        let store = InMemoryStore::new();
        store.save("https://example.com", &alias("abc123")).unwrap();
        let err = store.save("https://other.com", &alias("abc123")).unwrap_err();
        assert!(matches!(err, CoreError::AliasConflict));
        assert_eq!(store.lookup(&alias("abc123")).unwrap(), "https://example.com");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn ids_increase() {
        let store = InMemoryStore::new();
        let a = store.save("https://a.com", &alias("a")).unwrap();
        let b = store.save("https://b.com", &alias("b")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn lookup_unknown_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.lookup(&alias("never-seen")),
            Err(CoreError::NotFound)
        ));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryStore::new();
        store.save("https://example.com", &alias("gone")).unwrap();
        store.delete(&alias("gone")).unwrap();
        store.delete(&alias("gone")).unwrap();
        store.delete(&alias("never-there")).unwrap();
        assert!(matches!(store.lookup(&alias("gone")), Err(CoreError::NotFound)));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn poisoned_lock_is_unavailable() {
        let store = Arc::new(InMemoryStore::new());
        let holder = Arc::clone(&store);
        let _ = thread::spawn(move || {
            let _guard = holder.inner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(matches!(store.len(), Err(CoreError::StoreUnavailable(_))));
        assert!(matches!(store.is_empty(), Err(CoreError::StoreUnavailable(_))));
        assert!(matches!(
            store.lookup(&alias("x")),
            Err(CoreError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn concurrent_saves_of_same_alias_admit_one() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.save(&format!("https://e/{i}"), &alias("race")))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(CoreError::AliasConflict)))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }
}
