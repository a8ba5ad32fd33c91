//! Authoritative world state as last reported by the server.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::models::{ActorId, Facing, GridPos, SpriteSet};

pub fn plugin(app: &mut App) {
    app.init_resource::<SnapshotStore>();
}

/// Precomputed movement and visibility data the server ships with each
/// summary, so the client never pathfinds.
#[derive(Debug, Clone, Default)]
pub struct Senses {
    /// Reachable cells mapped to the step sequence that reaches them
    /// (origin excluded).
    pub paths: HashMap<GridPos, Vec<GridPos>>,
    /// Actors this one currently sees.
    pub visible: HashSet<ActorId>,
}

/// One actor's server-reported state. Replaced wholesale on every summary,
/// never mutated piecemeal by the client.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub id: ActorId,
    pub pos: GridPos,
    pub hp: i32,
    pub max_hp: i32,
    pub sprite: SpriteSet,
    pub facing: Facing,
    pub senses: Senses,
}

/// Client-side cache of server summaries, keyed by actor.
///
/// While a movement interpolation is in flight for an actor, the position
/// stored here is stale; the presenter reads the interpolated
/// [`VisualPos`](crate::models::VisualPos) instead.
#[derive(Resource, Default)]
pub struct SnapshotStore {
    actors: HashMap<ActorId, EntitySnapshot>,
}

impl SnapshotStore {
    pub fn get(&self, id: ActorId) -> Option<&EntitySnapshot> {
        self.actors.get(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.actors.values()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Swap in a fresh summary. Actors absent from it are gone.
    pub fn replace(&mut self, summary: Vec<EntitySnapshot>) {
        self.actors = summary.into_iter().map(|s| (s.id, s)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: u64, pos: GridPos) -> EntitySnapshot {
        EntitySnapshot {
            id: ActorId(id),
            pos,
            hp: 10,
            max_hp: 10,
            sprite: SpriteSet::Knight,
            facing: Facing::South,
            senses: Senses::default(),
        }
    }

    #[test]
    fn replace_drops_absent_actors() {
        let mut store = SnapshotStore::default();
        store.replace(vec![
            snapshot(1, GridPos::new(0, 0)),
            snapshot(2, GridPos::new(3, 1)),
        ]);
        assert_eq!(store.len(), 2);

        store.replace(vec![snapshot(2, GridPos::new(4, 1))]);
        assert!(!store.contains(ActorId(1)));
        assert_eq!(store.get(ActorId(2)).map(|s| s.pos), Some(GridPos::new(4, 1)));
    }
}
