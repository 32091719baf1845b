use tracing::{debug, info, warn};

use crate::{
    error::StoreError,
    model::{Entity, RatesPayload, TrackedSet},
    store::KeyValueStore,
};

/// Storage slot holding the JSON-serialized tracked set.
pub const TRACKED_SET_KEY: &str = "selectedCurrencies";

/// The entities the user follows, mirrored into a [`KeyValueStore`].
#[derive(Debug)]
pub struct Registry<S> {
    store: S,
    entities: TrackedSet,
    seeded: bool,
}

impl<S: KeyValueStore> Registry<S> {
    /// Restores the persisted set. A missing, unreadable or corrupt slot is
    /// replaced by a single default entity, which is persisted right away.
    pub fn load(store: S) -> Self {
        let restored = match store.get(TRACKED_SET_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<TrackedSet>(&raw) {
                Ok(set) => Some(set),
                Err(err) => {
                    warn!(error = %err, "persisted tracked set is malformed, reseeding");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read tracked set, reseeding");
                None
            }
        };

        match restored {
            Some(entities) => {
                debug!(count = entities.len(), "restored tracked set");
                Self {
                    store,
                    entities,
                    seeded: false,
                }
            }
            None => {
                let mut registry = Self {
                    store,
                    entities: vec![Self::default_entity()],
                    seeded: true,
                };
                info!("first run, seeding tracked set with default entity");
                if let Err(err) = registry.persist() {
                    warn!(error = %err, "failed to persist seeded tracked set");
                }
                registry
            }
        }
    }

    /// The entity a fresh install starts with: the rates fallback's own base.
    pub fn default_entity() -> Entity {
        Entity::rates(RatesPayload::fallback().base)
    }

    /// `true` when nothing usable was persisted and the default seed was used.
    pub fn is_first_run(&self) -> bool {
        self.seeded
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entities.iter().any(|e| e.key == key)
    }

    /// Appends `entity` and persists the full set. Returns `false` without
    /// touching storage when the key is already tracked. On a failed write
    /// the in-memory set is left as it was.
    pub fn add(&mut self, entity: Entity) -> Result<bool, StoreError> {
        if self.contains(&entity.key) {
            debug!(key = %entity.key, "entity already tracked");
            return Ok(false);
        }

        let mut next = self.entities.clone();
        next.push(entity);
        self.commit(next)?;
        Ok(true)
    }

    /// Drops the entity with `key` and persists the full set. On a failed
    /// write the entity stays tracked.
    pub fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        if !self.contains(key) {
            return Ok(false);
        }

        let next: TrackedSet = self
            .entities
            .iter()
            .filter(|e| e.key != key)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Rewrites the whole ordered set under [`TRACKED_SET_KEY`].
    pub fn persist(&mut self) -> Result<(), StoreError> {
        Self::write(&mut self.store, &self.entities)
    }

    /// Writes `next` and adopts it only once storage accepted it.
    fn commit(&mut self, next: TrackedSet) -> Result<(), StoreError> {
        Self::write(&mut self.store, &next)?;
        self.entities = next;
        Ok(())
    }

    fn write(store: &mut S, entities: &[Entity]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entities)?;
        store.set(TRACKED_SET_KEY, json)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use crate::store::MemoryStore;
    use std::cell::Cell;
    use std::path::PathBuf;

    fn persisted<S: KeyValueStore>(store: &S) -> TrackedSet {
        let raw = store.get(TRACKED_SET_KEY).unwrap().expect("slot written");
        serde_json::from_str(&raw).unwrap()
    }

    /// A memory store whose next `failures` writes are refused.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failures: Cell<usize>,
    }

    impl FlakyStore {
        fn fail_next_writes(&self, count: usize) {
            self.failures.set(count);
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            let failures = self.failures.get();
            if failures > 0 {
                self.failures.set(failures - 1);
                return Err(StoreError::Write {
                    path: PathBuf::from("cards.json"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn empty_store_seeds_and_persists_default() {
        let registry = Registry::load(MemoryStore::new());

        assert!(registry.is_first_run());
        assert_eq!(registry.entities(), &[Entity::rates("USD")]);
        assert_eq!(persisted(registry.store()), vec![Entity::rates("USD")]);
    }

    #[test]
    fn restores_legacy_persisted_form() {
        let mut store = MemoryStore::new();
        store
            .set(TRACKED_SET_KEY, r#"[{"key":"EUR"},{"key":"GBP"}]"#.to_string())
            .unwrap();

        let registry = Registry::load(store);
        assert!(!registry.is_first_run());
        assert_eq!(
            registry.entities(),
            &[Entity::rates("EUR"), Entity::rates("GBP")]
        );
    }

    #[test]
    fn malformed_state_falls_back_to_seed() {
        let mut store = MemoryStore::new();
        store.set(TRACKED_SET_KEY, "{not json".to_string()).unwrap();

        let registry = Registry::load(store);
        assert!(registry.is_first_run());
        assert_eq!(persisted(registry.store()), vec![Entity::rates("USD")]);
    }

    #[test]
    fn add_persists_full_set_in_order() {
        let mut registry = Registry::load(MemoryStore::new());

        assert!(registry.add(Entity::rates("EUR")).unwrap());
        assert!(
            registry
                .add(Entity::forecast("2459115", Some("New York, NY".into())))
                .unwrap()
        );

        let set = persisted(registry.store());
        let keys: Vec<_> = set.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["USD", "EUR", "2459115"]);
        assert_eq!(set[2].kind, EntityKind::Forecast);
    }

    #[test]
    fn add_ignores_duplicate_key() {
        let mut registry = Registry::load(MemoryStore::new());

        assert!(!registry.add(Entity::rates("USD")).unwrap());
        assert_eq!(registry.entities().len(), 1);
    }

    #[test]
    fn remove_persists_and_reports() {
        let mut registry = Registry::load(MemoryStore::new());
        registry.add(Entity::rates("EUR")).unwrap();

        assert!(registry.remove("USD").unwrap());
        assert!(!registry.remove("USD").unwrap());
        assert_eq!(persisted(registry.store()), vec![Entity::rates("EUR")]);
    }

    #[test]
    fn persisted_set_round_trips_through_reload() {
        let mut registry = Registry::load(MemoryStore::new());
        registry.add(Entity::forecast("2487956", None)).unwrap();
        registry.add(Entity::rates("JPY")).unwrap();
        let expected = registry.entities().to_vec();

        let reloaded = Registry::load(registry.store().clone());
        assert!(!reloaded.is_first_run());
        assert_eq!(reloaded.entities(), expected.as_slice());
    }

    #[test]
    fn failed_add_leaves_set_unchanged_and_can_be_retried() {
        let mut registry = Registry::load(FlakyStore::default());
        registry.store().fail_next_writes(1);

        assert!(matches!(
            registry.add(Entity::rates("EUR")),
            Err(StoreError::Write { .. })
        ));
        assert!(!registry.contains("EUR"));
        assert_eq!(persisted(registry.store()), vec![Entity::rates("USD")]);

        assert!(registry.add(Entity::rates("EUR")).unwrap());
        assert_eq!(
            persisted(registry.store()),
            vec![Entity::rates("USD"), Entity::rates("EUR")]
        );
    }

    #[test]
    fn failed_remove_keeps_entity_tracked() {
        let mut registry = Registry::load(FlakyStore::default());
        registry.add(Entity::rates("EUR")).unwrap();
        registry.store().fail_next_writes(1);

        assert!(registry.remove("USD").is_err());
        assert_eq!(
            registry.entities(),
            &[Entity::rates("USD"), Entity::rates("EUR")]
        );

        assert!(registry.remove("USD").unwrap());
        assert_eq!(persisted(registry.store()), vec![Entity::rates("EUR")]);
    }
}
