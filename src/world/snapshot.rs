//! Per-tick combat snapshot
//!
//! Built once per tick from whatever the host stores, then dropped. Dead
//! entities never enter it, so a unit that died last tick is simply absent.

use ahash::AHashMap;

use crate::core::types::{EntityId, Vec2};
use crate::spatial::sparse_hash::SparseHashGrid;
use crate::world::{EntityIndex, EntityQuery, EntityView};

const BUCKET_SIZE: f32 = 128.0;

#[derive(Debug, Clone)]
pub struct CombatSnapshot {
    /// Sorted by id
    entities: Vec<EntityView>,
    by_id: AHashMap<EntityId, usize>,
    buckets: SparseHashGrid,
}

impl CombatSnapshot {
    /// Capture live entities (health > 0)
    pub fn capture(source: impl IntoIterator<Item = EntityView>) -> Self {
        let mut entities: Vec<EntityView> =
            source.into_iter().filter(|e| e.health > 0.0).collect();
        entities.sort_by_key(|e| e.id);
        entities.dedup_by_key(|e| e.id);

        let by_id = entities.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
        let mut buckets = SparseHashGrid::new(BUCKET_SIZE);
        buckets.rebuild(entities.iter().map(|e| (e.id, e.position)));

        Self { entities, by_id, buckets }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityView> {
        self.entities.iter()
    }

    fn radius_candidates(&self, center: Vec2, radius: f32) -> Vec<EntityView> {
        let mut ids = self.buckets.query_radius(center, radius);
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.by_id.get(&id).map(|&i| self.entities[i]))
            .collect()
    }
}

impl EntityIndex for CombatSnapshot {
    fn query(&self, query: &EntityQuery) -> Vec<EntityView> {
        match query.within {
            Some((center, radius)) => self
                .radius_candidates(center, radius)
                .into_iter()
                .filter(|e| query.matches(e))
                .collect(),
            None => self.entities.iter().filter(|e| query.matches(e)).copied().collect(),
        }
    }

    fn get(&self, id: EntityId) -> Option<EntityView> {
        self.by_id.get(&id).map(|&i| self.entities[i])
    }
}
