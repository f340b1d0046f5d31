//! Stable, reversible mapping from real record ids to synthetic ids
//!
//! Each `(kind, id)` pair gets a random synthetic id from a kind-specific range
//! the first time it is seen and keeps it for the lifetime of the cache. The
//! reverse map spans all kinds, so a synthetic id is never handed out twice.

use crate::error::{Error, Result};
use rand::Rng;
use std::collections::HashMap;

pub const USER_KIND: &str = "User";
pub const PATIENT_KIND: &str = "Patient";
pub const OBSERVATION_KIND: &str = "Observation";

/// Number of values above `start` in each range (the range is inclusive).
pub const RANGE_WIDTH: i64 = 10_000;

/// Random draws before falling back to a scan for a free slot.
const RANDOM_ATTEMPTS: usize = 64;

/// Inclusive range synthetic ids are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: i64,
    pub end: i64,
}

impl IdRange {
    pub const fn starting_at(start: i64) -> Self {
        Self {
            start,
            end: start + RANGE_WIDTH,
        }
    }

    /// Range for a record kind. Kinds other than users and observations
    /// (patients, and whatever else a reference may point at) share the
    /// patient range.
    pub fn for_kind(kind: &str) -> Self {
        match kind {
            USER_KIND => Self::starting_at(10_000),
            OBSERVATION_KIND => Self::starting_at(60_000),
            _ => Self::starting_at(40_000),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        (self.start..=self.end).contains(&id)
    }

    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Debug, Default)]
pub struct IdCache {
    forward: HashMap<(String, i64), i64>,
    reverse: HashMap<i64, (String, i64)>,
}

impl IdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthetic id already assigned to `(kind, id)`, if any.
    pub fn get(&self, kind: &str, id: i64) -> Option<i64> {
        self.forward.get(&(kind.to_string(), id)).copied()
    }

    /// Synthetic id for `(kind, id)`, assigning one from the kind's range on
    /// first use.
    pub fn assign<R: Rng + ?Sized>(&mut self, kind: &str, id: i64, rng: &mut R) -> Result<i64> {
        self.assign_in(kind, id, IdRange::for_kind(kind), rng)
    }

    /// Like [`IdCache::assign`] with an explicit range.
    pub fn assign_in<R: Rng + ?Sized>(
        &mut self,
        kind: &str,
        id: i64,
        range: IdRange,
        rng: &mut R,
    ) -> Result<i64> {
        if let Some(synthetic) = self.get(kind, id) {
            return Ok(synthetic);
        }

        let synthetic = self.free_id(kind, id, range, rng)?;
        self.forward.insert((kind.to_string(), id), synthetic);
        self.reverse.insert(synthetic, (kind.to_string(), id));
        tracing::trace!(kind, id, synthetic, "assigned synthetic id");
        Ok(synthetic)
    }

    /// An unused id in `range` other than `real` itself.
    fn free_id<R: Rng + ?Sized>(
        &self,
        kind: &str,
        real: i64,
        range: IdRange,
        rng: &mut R,
    ) -> Result<i64> {
        let exhausted = || Error::IdRangeExhausted {
            kind: kind.to_string(),
            start: range.start,
            end: range.end,
        };
        if range.is_empty() {
            return Err(exhausted());
        }
        let free = |candidate: &i64| *candidate != real && !self.reverse.contains_key(candidate);

        for _ in 0..RANDOM_ATTEMPTS {
            let candidate = rng.gen_range(range.start..=range.end);
            if free(&candidate) {
                return Ok(candidate);
            }
        }

        // Crowded range: walk it from a random offset.
        let offset = rng.gen_range(0..range.len());
        (0..range.len())
            .map(|i| range.start + (offset + i) % range.len())
            .find(free)
            .ok_or_else(exhausted)
    }

    /// The `(kind, original id)` a synthetic id was assigned to.
    pub fn original(&self, synthetic: i64) -> Option<(&str, i64)> {
        self.reverse
            .get(&synthetic)
            .map(|(kind, id)| (kind.as_str(), *id))
    }

    /// Original id for a synthetic id; ids the cache never produced are
    /// returned unchanged.
    pub fn deanonymize(&self, id: i64) -> i64 {
        self.original(id).map(|(_, original)| original).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut cache = IdCache::new();
        let mut rng = rng();
        let first = cache.assign(PATIENT_KIND, 45439, &mut rng).unwrap();
        let second = cache.assign(PATIENT_KIND, 45439, &mut rng).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_assign_uses_kind_range() {
        let mut cache = IdCache::new();
        let mut rng = rng();
        for (kind, start) in [
            (USER_KIND, 10_000),
            (PATIENT_KIND, 40_000),
            (OBSERVATION_KIND, 60_000),
            ("Group", 40_000),
        ] {
            let synthetic = cache.assign(kind, 1, &mut rng).unwrap();
            assert!(
                IdRange::starting_at(start).contains(synthetic),
                "{kind}: {synthetic}"
            );
        }
    }

    #[test]
    fn test_same_id_different_kinds_are_distinct() {
        let mut cache = IdCache::new();
        let mut rng = rng();
        let patient = cache.assign(PATIENT_KIND, 5, &mut rng).unwrap();
        let group = cache.assign("Group", 5, &mut rng).unwrap();
        assert_ne!(patient, group);
        assert_eq!(cache.original(patient), Some((PATIENT_KIND, 5)));
        assert_eq!(cache.original(group), Some(("Group", 5)));
    }

    #[test]
    fn test_reverse_lookup() {
        let mut cache = IdCache::new();
        let mut rng = rng();
        for real in [1, 2, 3, 45439, 19259] {
            let synthetic = cache.assign(USER_KIND, real, &mut rng).unwrap();
            assert_eq!(cache.deanonymize(synthetic), real);
        }
    }

    #[test]
    fn test_unknown_id_passes_through() {
        let cache = IdCache::new();
        assert_eq!(cache.deanonymize(45439), 45439);
        assert_eq!(cache.original(45439), None);
    }

    #[test]
    fn test_small_range_fills_then_reports_exhaustion() {
        let mut cache = IdCache::new();
        let mut rng = rng();
        let range = IdRange { start: 1, end: 3 };

        let mut assigned: Vec<i64> = (0..3)
            .map(|real| cache.assign_in("Tiny", 100 + real, range, &mut rng).unwrap())
            .collect();
        assigned.sort();
        assert_eq!(assigned, vec![1, 2, 3]);

        // an existing pair still resolves
        assert!(cache.assign_in("Tiny", 100, range, &mut rng).is_ok());

        let err = cache.assign_in("Tiny", 99, range, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            Error::IdRangeExhausted { start: 1, end: 3, .. }
        ));
    }

    #[test]
    fn test_synthetic_never_equals_real() {
        let mut cache = IdCache::new();
        let mut rng = rng();
        let range = IdRange { start: 5, end: 6 };
        assert_eq!(cache.assign_in("Tiny", 5, range, &mut rng).unwrap(), 6);
        assert_eq!(cache.assign_in("Tiny", 6, range, &mut rng).unwrap(), 5);
        assert!(matches!(
            cache.assign_in("Tiny", 7, range, &mut rng),
            Err(Error::IdRangeExhausted { .. })
        ));
    }

    #[test]
    fn test_range_len() {
        let range = IdRange::starting_at(40_000);
        assert_eq!(range.len(), 10_001);
        assert!(range.contains(50_000));
        assert!(!range.contains(50_001));
        assert!(!range.is_empty());
    }
}
