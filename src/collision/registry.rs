//! Step-scoped store of collision detections.
//!
//! Records live in an arena and refer to each other by [`DetectionId`]. A
//! detection against a movable body gets a conjugate record seen from the
//! other side; the pair points at each other through `conjugate`.

use std::collections::HashMap;

use crate::math::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectionId(usize);

impl DetectionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The object a moving c-vertex was tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counterpart {
    Fixed(usize),
    Movable(usize),
}

impl Counterpart {
    pub fn is_fixed(self) -> bool {
        matches!(self, Counterpart::Fixed(_))
    }
}

/// Sweep endpoints and the effective point, in the counterpart's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPoints {
    pub pre: Vec2,
    pub post: Vec2,
    pub eff: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionDetection {
    /// Movable body that owns the c-vertex.
    pub moving: usize,
    pub other: Counterpart,
    /// Index of the c-vertex within `moving`'s shape.
    pub vertex: usize,
    pub points: CollisionPoints,
    /// Global surface normal, pointing towards `moving`.
    pub normal: Vec2,
    pub eff_global: Vec2,
    /// Detection pass of `moving` that produced the record, starting at 1.
    pub pass: usize,
    pub conjugate: Option<DetectionId>,
    /// Set on conjugate records. Mirrors never receive a response of their own.
    pub mirror: bool,
}

#[derive(Debug, Default)]
pub struct DetectionRegistry {
    records: Vec<CollisionDetection>,
    // Unordered movable pair -> body whose pass resolves the pair this step.
    pair_owners: HashMap<(usize, usize), usize>,
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DetectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.pair_owners.clear();
    }

    pub fn record(&mut self, detection: CollisionDetection) -> DetectionId {
        let id = DetectionId(self.records.len());
        self.records.push(detection);
        id
    }

    /// Adds the record seen from the movable counterpart of `id` and links
    /// both records. Points of the mirror are taken in `moving`'s frame via
    /// `to_moving_local`. Returns `None` for detections against fixed bodies.
    pub fn conjugate(
        &mut self,
        id: DetectionId,
        to_moving_local: impl Fn(Vec2) -> Vec2,
    ) -> Option<DetectionId> {
        let source = self.records.get(id.0)?;
        let Counterpart::Movable(other) = source.other else {
            return None;
        };
        if let Some(existing) = source.conjugate {
            return Some(existing);
        }
        let mirror = CollisionDetection {
            moving: other,
            other: Counterpart::Movable(source.moving),
            vertex: source.vertex,
            points: CollisionPoints {
                pre: to_moving_local(source.eff_global),
                post: to_moving_local(source.eff_global),
                eff: to_moving_local(source.eff_global),
            },
            normal: -source.normal,
            eff_global: source.eff_global,
            pass: source.pass,
            conjugate: Some(id),
            mirror: true,
        };
        let mirror_id = self.record(mirror);
        self.records[id.0].conjugate = Some(mirror_id);
        Some(mirror_id)
    }

    pub fn get(&self, id: DetectionId) -> Option<&CollisionDetection> {
        self.records.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DetectionId, &CollisionDetection)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (DetectionId(i), record))
    }

    /// Primary (non-mirror) records of one moving body.
    pub fn for_body(&self, moving: usize) -> impl Iterator<Item = &CollisionDetection> {
        self.records
            .iter()
            .filter(move |record| record.moving == moving && !record.mirror)
    }

    /// Splits the given records into (against fixed, against movable).
    pub fn partition(&self, ids: &[DetectionId]) -> (Vec<DetectionId>, Vec<DetectionId>) {
        ids.iter()
            .copied()
            .filter(|id| self.get(*id).is_some())
            .partition(|id| self.records[id.0].other.is_fixed())
    }

    /// Marks `owner`'s pass as the one resolving the pair `(owner, other)`.
    /// The first claim wins.
    pub fn claim_pair(&mut self, owner: usize, other: usize) -> usize {
        *self.pair_owners.entry(pair_key(owner, other)).or_insert(owner)
    }

    pub fn pair_owner(&self, a: usize, b: usize) -> Option<usize> {
        self.pair_owners.get(&pair_key(a, b)).copied()
    }
}
