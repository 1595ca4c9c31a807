/// Per-unit root-zone storage and the simulation clock.
///
/// Units enter the store the first time they are seen and are never removed.
/// - `storage`: root-zone water of each unit [mm]
/// - `step`: number of completed steps, shared by all units
use std::collections::BTreeMap;

use crate::error::RootZoneError;
use crate::UnitId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitStore {
    storage: BTreeMap<UnitId, f64>,
    step: u64,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage of `id`, or `None` if the unit has never been seen.
    pub fn get(&self, id: UnitId) -> Option<f64> {
        self.storage.get(&id).copied()
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.storage.contains_key(&id)
    }

    /// Storage of `id`, seeding it with `initial` on first sight.
    ///
    /// Returns the storage and whether the unit was just created.
    pub fn get_or_seed(&mut self, id: UnitId, initial: f64) -> (f64, bool) {
        let mut created = false;
        let value = *self.storage.entry(id).or_insert_with(|| {
            created = true;
            initial
        });
        (value, created)
    }

    /// Seed or overwrite the storage of `id` with an imported initial condition.
    pub fn seed(&mut self, id: UnitId, storage: f64) -> Result<(), RootZoneError> {
        if !storage.is_finite() || storage < 0.0 {
            return Err(RootZoneError::config(
                "storage",
                storage,
                format!("initial storage of unit {id} must be finite and non-negative"),
            ));
        }
        self.storage.insert(id, storage);
        Ok(())
    }

    /// Replace the storage of `id` with the result of a completed step.
    pub fn commit(&mut self, id: UnitId, storage: f64) {
        self.storage.insert(id, storage);
    }

    /// Storage divided by `max_storage` for every known unit.
    pub fn saturation_degrees(&self, max_storage: f64) -> BTreeMap<UnitId, f64> {
        self.iter().map(|(id, s)| (id, s / max_storage)).collect()
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.storage.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, f64)> + '_ {
        self.storage.iter().map(|(&id, &s)| (id, s))
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of completed steps.
    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Advance the clock by one step.
    pub fn advance(&mut self) {
        self.step += 1;
    }
}
