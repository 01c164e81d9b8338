//! Per-class identifier allocation.

use crate::db::Gateway;
use crate::error::StoreResult;
use crate::types::EntityClass;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Where a class's starting value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    /// Highest sequence number already in the store.
    Store,
    /// Configured base, used when the class is empty.
    Base,
}

/// State of one class's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassSequence {
    pub seed: u64,
    pub source: SeedSource,
    /// Last value handed out (equals `seed` until the first allocation).
    pub current: u64,
    /// Persisted counter after the last allocation, if any happened.
    pub counter: Option<u64>,
}

/// Hands out strictly increasing identifiers per entity class.
///
/// Single sequential writer only: the in-memory value is the source of
/// truth for the run, and every allocation also increments the persisted
/// counter through the gateway.
#[derive(Debug, Clone, Default)]
pub struct SequenceAllocator {
    classes: BTreeMap<EntityClass, ClassSequence>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting value of a class. The first `next` returns `value + 1`.
    pub fn seed(&mut self, class: EntityClass, value: u64) {
        self.seed_from(class, value, SeedSource::Store);
    }

    fn seed_from(&mut self, class: EntityClass, value: u64, source: SeedSource) {
        self.classes.insert(
            class,
            ClassSequence {
                seed: value,
                source,
                current: value,
                counter: None,
            },
        );
    }

    /// Seed a class from the store's high-water mark, or `base` if it has none.
    pub fn seed_from_store<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        class: EntityClass,
        base: u64,
    ) -> StoreResult<u64> {
        match gateway.highest_sequence_number(class)? {
            Some(highest) => {
                info!(class = %class, highest, "Seeding sequence from store");
                self.seed_from(class, highest, SeedSource::Store);
                Ok(highest)
            }
            None => {
                info!(class = %class, base, "No existing items, seeding sequence from base");
                self.seed_from(class, base, SeedSource::Base);
                Ok(base)
            }
        }
    }

    /// Allocate the next identifier of a class and persist the counter increment.
    ///
    /// An unseeded class starts from zero.
    pub fn next<G: Gateway + ?Sized>(&mut self, gateway: &G, class: EntityClass) -> StoreResult<u64> {
        let counter = gateway.increment_counter(class)?;
        let entry = self.classes.entry(class).or_insert(ClassSequence {
            seed: 0,
            source: SeedSource::Base,
            current: 0,
            counter: None,
        });
        entry.current += 1;
        entry.counter = Some(counter);
        debug!(class = %class, value = entry.current, counter, "Allocated sequence value");
        Ok(entry.current)
    }

    /// Last value handed out for the class (the seed before any allocation).
    pub fn current(&self, class: EntityClass) -> Option<u64> {
        self.classes.get(&class).map(|s| s.current)
    }

    pub fn sequence(&self, class: EntityClass) -> Option<&ClassSequence> {
        self.classes.get(&class)
    }

    /// Every seeded class with its state.
    pub fn snapshot(&self) -> BTreeMap<EntityClass, ClassSequence> {
        self.classes.clone()
    }
}
