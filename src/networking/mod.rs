//! Server boundary: channel transport, message drain, entity reconciliation.
//!
//! The real API layer lives outside this crate; everything here talks to it
//! through a [`ServerLink`] channel pair. [`loopback`] provides an in-process
//! stand-in for demos and tests.

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::HashSet;

pub mod loopback;


use crate::animation::events::{Died, TransportFailed};
use crate::animation::registry::{AnimationKind, AnimationRegistry};
use crate::animation::ClientTick;
use crate::combat::{Health, PendingAttacks};
use crate::models::{ActionError, ActorId, Facing, GridPos, VisualPos, WeaponSlot};
use crate::movement::ActiveMoves;
use crate::presenter::SpriteAnimator;
use crate::snapshot::SnapshotStore;

pub fn plugin(app: &mut App) {
    app.init_resource::<ActorIndex>().add_systems(
        Update,
        (drain_server_messages, reconcile)
            .chain()
            .in_set(ClientTick::StoreSync),
    );
}

// =============================================================================
// Wire types
// =============================================================================

/// Requests the client fires at the server.
#[derive(Debug, Clone)]
pub enum ClientRequest {
    Move {
        actor: ActorId,
        target: GridPos,
    },
    Attack {
        attacker: ActorId,
        target: ActorId,
        slot: WeaponSlot,
    },
}

/// Replies and pushes coming back from the server.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// Full visible-world refresh. Replaces the snapshot store wholesale.
    Summaries(Vec<crate::snapshot::EntitySnapshot>),
    /// Move verdict. `path` holds the approved steps (may diverge from the
    /// predicted ones); empty on rejection.
    MoveOutcome {
        actor: ActorId,
        approved: bool,
        path: Vec<GridPos>,
    },
    AttackOutcome {
        attacker: ActorId,
        outcome: AttackOutcome,
    },
    /// Transport-level failure for a request that never resolved.
    Failure { actor: ActorId, detail: String },
}

/// Server-resolved result of a swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    pub target: ActorId,
    pub hit: bool,
    pub damage: i32,
    pub critical: bool,
}

// ── Verdict events routed to the movement/combat handlers ───────────

#[derive(Event, Debug, Clone)]
pub struct MoveVerdict {
    pub actor: ActorId,
    pub approved: bool,
    pub path: Vec<GridPos>,
}

#[derive(Event, Debug, Clone)]
pub struct AttackVerdict {
    pub attacker: ActorId,
    pub outcome: AttackOutcome,
}

// =============================================================================
// Resources & components
// =============================================================================

/// Client side of the transport. Insert one (e.g. via [`loopback::plugin`])
/// before adding the crate plugin.
#[derive(Resource)]
pub struct ServerLink {
    outbound: Sender<ClientRequest>,
    inbound: Receiver<ServerMessage>,
}

/// The other end of the transport, held by whatever plays server.
pub struct ServerEndpoint {
    pub requests: Receiver<ClientRequest>,
    pub replies: Sender<ServerMessage>,
}

impl ServerLink {
    /// Build a connected link/endpoint pair.
    pub fn pair() -> (Self, ServerEndpoint) {
        let (req_tx, req_rx) = unbounded();
        let (reply_tx, reply_rx) = unbounded();
        (
            Self {
                outbound: req_tx,
                inbound: reply_rx,
            },
            ServerEndpoint {
                requests: req_rx,
                replies: reply_tx,
            },
        )
    }

    /// Fire-and-forget from the tick loop's perspective; the only way this
    /// fails synchronously is a dead transport.
    pub fn send(&self, request: ClientRequest) -> Result<(), ActionError> {
        self.outbound
            .try_send(request)
            .map_err(|e| ActionError::NetworkFailure(e.to_string()))
    }
}

/// Links an ECS mirror entity to a server actor.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerId(pub ActorId);

/// Actor → mirror-entity lookup.
#[derive(Resource, Default)]
pub struct ActorIndex(pub(crate) std::collections::HashMap<ActorId, Entity>);

impl ActorIndex {
    pub fn get(&self, actor: ActorId) -> Option<Entity> {
        self.0.get(&actor).copied()
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Drain whatever the server pushed since last tick. Summaries land in the
/// store directly; verdicts and failures are routed as events so their
/// observers run before [`reconcile`].
fn drain_server_messages(
    link: Res<ServerLink>,
    mut store: ResMut<SnapshotStore>,
    mut commands: Commands,
) {
    for message in link.inbound.try_iter() {
        match message {
            ServerMessage::Summaries(summary) => store.replace(summary),
            ServerMessage::MoveOutcome {
                actor,
                approved,
                path,
            } => {
                commands.trigger(MoveVerdict {
                    actor,
                    approved,
                    path,
                });
            }
            ServerMessage::AttackOutcome { attacker, outcome } => {
                commands.trigger(AttackVerdict { attacker, outcome });
            }
            ServerMessage::Failure { actor, detail } => {
                warn!("transport failure for {actor:?}: {detail}");
                commands.trigger(TransportFailed { actor, detail });
            }
        }
    }
}

/// One system that diffs the snapshot store against the ECS each tick.
/// Spawns, patches, or despawns mirror entities to match server state.
fn reconcile(
    store: Res<SnapshotStore>,
    moves: Res<ActiveMoves>,
    mut registry: ResMut<AnimationRegistry>,
    mut pending: ResMut<PendingAttacks>,
    mut index: ResMut<ActorIndex>,
    mut mirrors: Query<(Entity, &ServerId, &mut VisualPos, &mut Health, &mut Facing)>,
    mut commands: Commands,
) {
    let mut seen = HashSet::new();

    // ── Patch or despawn existing mirrors ──────────────
    for (entity, id, mut visual, mut health, mut facing) in &mut mirrors {
        let actor = id.0;
        let Some(snapshot) = store.get(actor) else {
            commands.entity(entity).despawn();
            index.0.remove(&actor);
            registry.remove(actor);
            pending.0.remove(&actor);
            continue;
        };
        seen.insert(actor);

        // Deaths are server-driven; the edge check keeps prediction from
        // double-firing. The predicted hp gets overwritten by stale summaries,
        // so a running death animation also counts as "already dead".
        let dying = matches!(
            registry.get_active(actor).map(|a| a.kind),
            Some(AnimationKind::Death)
        );
        if snapshot.hp <= 0 && health.current > 0 && !dying {
            commands.trigger(Died { actor });
        }
        health.current = snapshot.hp;
        health.max = snapshot.max_hp;

        // While a move interpolates, the stored position is stale; leave
        // the visual position to the movement handler.
        if !moves.is_moving(actor) {
            visual.0 = snapshot.pos.as_vec2();
            if registry.is_ready(actor) && *facing != snapshot.facing {
                *facing = snapshot.facing;
            }
        }
    }

    // ── Spawn new mirrors ──────────────────────────────
    for snapshot in store.iter() {
        if seen.contains(&snapshot.id) || index.0.contains_key(&snapshot.id) {
            continue;
        }
        let entity = commands
            .spawn((
                Name::new(format!("Actor_{}", snapshot.id.0)),
                ServerId(snapshot.id),
                VisualPos(snapshot.pos.as_vec2()),
                Health::new(snapshot.hp, snapshot.max_hp),
                snapshot.facing,
                SpriteAnimator::new(snapshot.sprite),
            ))
            .id();
        index.0.insert(snapshot.id, entity);
    }
}
