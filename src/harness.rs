//! Deterministic app harness for integration tests: manual time plus a
//! scripted server endpoint.

use bevy::prelude::*;
use std::time::Duration;

use crate::models::{ActorId, GridPos, SpriteSet};
use crate::networking::loopback::straight_paths;
use crate::networking::{ServerEndpoint, ServerLink, ServerMessage};
use crate::snapshot::{EntitySnapshot, Senses};

/// App with the full crate plugin, manual `Time`, and the far end of the
/// transport handed back for scripting.
pub fn app() -> (App, ServerEndpoint) {
    let mut app = App::new();
    let (link, endpoint) = ServerLink::pair();
    app.init_resource::<Time>().insert_resource(link);
    app.add_plugins(crate::plugin);
    (app, endpoint)
}

/// Advance the app by `secs` in a single tick.
pub fn tick(app: &mut App, secs: f32) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(secs));
    app.update();
}

pub fn push_summary(endpoint: &ServerEndpoint, actors: Vec<EntitySnapshot>) {
    endpoint
        .replies
        .send(ServerMessage::Summaries(actors))
        .ok();
}

/// Snapshot with straight-line paths and everyone visible; enough for
/// scripted tests.
pub fn snapshot(id: ActorId, pos: GridPos) -> EntitySnapshot {
    EntitySnapshot {
        id,
        pos,
        hp: 10,
        max_hp: 10,
        sprite: SpriteSet::Knight,
        facing: default(),
        senses: Senses {
            paths: straight_paths(pos, 8),
            visible: (0..16u64).map(ActorId).collect(),
        },
    }
}
