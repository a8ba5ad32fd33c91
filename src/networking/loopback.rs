//! In-process stand-in server for demos and tests: approves every move,
//! resolves attacks with simple dice, optionally sits on replies for a few
//! ticks to fake latency.

use bevy::prelude::*;
use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::models::{ActorId, GridPos, SpriteSet};
use crate::snapshot::{EntitySnapshot, Senses};

use super::{AttackOutcome, ClientRequest, ServerEndpoint, ServerLink, ServerMessage};

/// How far an actor can walk per command.
const MOVE_RANGE: i32 = 6;

pub fn plugin(app: &mut App) {
    let (link, endpoint) = ServerLink::pair();
    app.insert_resource(link)
        .insert_resource(LoopbackServer::new(endpoint))
        .add_systems(PreUpdate, serve);
}

/// World state plus the far end of the transport. Lives inside the client
/// app but only talks through the channel boundary, like the real server.
#[derive(Resource)]
pub struct LoopbackServer {
    endpoint: ServerEndpoint,
    actors: HashMap<ActorId, EntitySnapshot>,
    /// Ticks each reply sits in the queue before delivery.
    pub latency_ticks: u32,
    delayed: Vec<(u32, ServerMessage)>,
    dirty: bool,
}

impl LoopbackServer {
    fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            actors: HashMap::new(),
            latency_ticks: 0,
            delayed: Vec::new(),
            dirty: false,
        }
    }

    /// Add an actor to the server world. The next tick's summary carries it.
    pub fn spawn_actor(&mut self, id: ActorId, pos: GridPos, sprite: SpriteSet, hp: i32) {
        self.actors.insert(
            id,
            EntitySnapshot {
                id,
                pos,
                hp,
                max_hp: hp,
                sprite,
                facing: default(),
                senses: Senses::default(),
            },
        );
        self.dirty = true;
    }

    fn queue(&mut self, message: ServerMessage) {
        self.delayed.push((self.latency_ticks, message));
    }

    fn refresh_senses(&mut self) {
        let ids: HashSet<ActorId> = self.actors.keys().copied().collect();
        for snapshot in self.actors.values_mut() {
            snapshot.senses.paths = straight_paths(snapshot.pos, MOVE_RANGE);
            snapshot.senses.visible = ids.iter().copied().filter(|i| *i != snapshot.id).collect();
        }
    }

    fn summary(&self) -> Vec<EntitySnapshot> {
        self.actors.values().cloned().collect()
    }
}

fn serve(mut server: ResMut<LoopbackServer>) {
    while let Ok(request) = server.endpoint.requests.try_recv() {
        match request {
            ClientRequest::Move { actor, target } => {
                let reply = match server.actors.get(&actor) {
                    None => ServerMessage::Failure {
                        actor,
                        detail: "unknown actor".into(),
                    },
                    Some(snapshot) => match snapshot.senses.paths.get(&target) {
                        Some(steps) => {
                            let path = steps.clone();
                            ServerMessage::MoveOutcome {
                                actor,
                                approved: true,
                                path,
                            }
                        }
                        None => ServerMessage::MoveOutcome {
                            actor,
                            approved: false,
                            path: Vec::new(),
                        },
                    },
                };
                if let ServerMessage::MoveOutcome { approved: true, .. } = &reply {
                    if let Some(snapshot) = server.actors.get_mut(&actor) {
                        snapshot.pos = target;
                    }
                    server.dirty = true;
                }
                server.queue(reply);
            }
            ClientRequest::Attack {
                attacker, target, ..
            } => {
                let mut rng = rand::rng();
                let outcome = if server.actors.contains_key(&target) {
                    let critical = rng.random::<f32>() < 0.15;
                    let base = rng.random_range(2..=5);
                    AttackOutcome {
                        target,
                        hit: rng.random::<f32>() < 0.85,
                        damage: if critical { base * 2 } else { base },
                        critical,
                    }
                } else {
                    AttackOutcome {
                        target,
                        hit: false,
                        damage: 0,
                        critical: false,
                    }
                };
                if outcome.hit {
                    if let Some(snapshot) = server.actors.get_mut(&target) {
                        snapshot.hp = (snapshot.hp - outcome.damage).max(0);
                    }
                    server.dirty = true;
                }
                server.queue(ServerMessage::AttackOutcome { attacker, outcome });
            }
        }
    }

    if server.dirty {
        server.dirty = false;
        server.refresh_senses();
        let summary = server.summary();
        server.queue(ServerMessage::Summaries(summary));
    }

    // Deliver matured replies in order.
    let mut ready = Vec::new();
    for (ticks, message) in server.delayed.drain(..).collect::<Vec<_>>() {
        if ticks == 0 {
            ready.push(message);
        } else {
            server.delayed.push((ticks - 1, message));
        }
    }
    for message in ready {
        if server.endpoint.replies.send(message).is_err() {
            warn!("loopback client went away");
            return;
        }
    }
}

/// L-shaped walk paths (x leg first, then y) to every cell within `range`
/// Manhattan distance. Steps exclude the origin.
pub fn straight_paths(from: GridPos, range: i32) -> HashMap<GridPos, Vec<GridPos>> {
    let mut paths = HashMap::new();
    for dx in -range..=range {
        for dy in -range..=range {
            if (dx == 0 && dy == 0) || dx.abs() + dy.abs() > range {
                continue;
            }
            let mut steps = Vec::with_capacity((dx.abs() + dy.abs()) as usize);
            for i in 1..=dx.abs() {
                steps.push(GridPos::new(from.x + dx.signum() * i, from.y));
            }
            for j in 1..=dy.abs() {
                steps.push(GridPos::new(from.x + dx, from.y + dy.signum() * j));
            }
            paths.insert(GridPos::new(from.x + dx, from.y + dy), steps);
        }
    }
    paths
}
