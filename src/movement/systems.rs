use bevy::prelude::*;
use std::collections::HashMap;

use crate::animation::controller::advance_registry;
use crate::animation::events::{
    CommandFailed, MoveCommand, MovementRejected, MovementStarted, PathAdopted, TransportFailed,
};
use crate::animation::registry::{Animation, AnimationData, AnimationKind, AnimationRegistry};
use crate::animation::ClientTick;
use crate::models::{ActionError, ActorId, Facing, Settings, VisualPos};
use crate::networking::{ActorIndex, ClientRequest, MoveVerdict, ServerLink};
use crate::snapshot::SnapshotStore;

use super::state::{MovementState, Step};

pub fn plugin(app: &mut App) {
    app.init_resource::<ActiveMoves>()
        .add_observer(on_move_command)
        .add_observer(on_move_verdict)
        .add_observer(on_transport_failure)
        .add_systems(
            Update,
            tick_moves
                .in_set(ClientTick::Animate)
                .after(advance_registry),
        );
}

/// Interpolation states keyed by actor. Module-owned; the rest of the crate
/// only sees the `VisualPos` these states publish.
#[derive(Resource, Default)]
pub struct ActiveMoves(pub(crate) HashMap<ActorId, MovementState>);

impl ActiveMoves {
    pub fn get(&self, actor: ActorId) -> Option<&MovementState> {
        self.0.get(&actor)
    }

    pub fn is_moving(&self, actor: ActorId) -> bool {
        self.0.contains_key(&actor)
    }
}

/// Optimistic start: interpolation begins this tick, the server hears about
/// it in parallel.
fn on_move_command(
    on: On<MoveCommand>,
    settings: Res<Settings>,
    store: Res<SnapshotStore>,
    link: Res<ServerLink>,
    index: Res<ActorIndex>,
    mut registry: ResMut<AnimationRegistry>,
    mut moves: ResMut<ActiveMoves>,
    mut facings: Query<&mut Facing>,
    mut commands: Commands,
) {
    let MoveCommand { actor, target } = *on.event();

    let Some(snapshot) = store.get(actor) else {
        commands.trigger(CommandFailed {
            actor,
            error: ActionError::StaleEntity(actor),
        });
        return;
    };
    let Some(steps) = snapshot.senses.paths.get(&target) else {
        commands.trigger(CommandFailed {
            actor,
            error: ActionError::Unreachable(target),
        });
        return;
    };

    // Origin-prepended so interpolation starts from the authoritative cell.
    let mut path = Vec::with_capacity(steps.len() + 1);
    path.push(snapshot.pos);
    path.extend(steps.iter().copied().skip_while(|c| *c == snapshot.pos));
    if path.len() < 2 {
        debug!("{actor:?} is already at {target:?}");
        return;
    }

    let speed = settings.movement.speed;
    let duration = (path.len() - 1) as f32 / speed;
    let animation = Animation::new(
        actor,
        AnimationKind::Move,
        duration,
        true,
        AnimationData::Path(path.clone()),
    );
    if let Err(error) = registry.start(animation) {
        debug!("{actor:?} busy, move to {target:?} dropped");
        commands.trigger(CommandFailed { actor, error });
        return;
    }

    if let Some(entity) = index.get(actor) {
        if let Ok(mut facing) = facings.get_mut(entity) {
            *facing = Facing::toward(path[0], path[1]);
        }
    }

    moves.0.insert(actor, MovementState::new(path.clone(), speed));

    if let Err(error) = link.send(ClientRequest::Move { actor, target }) {
        // Never leave the actor stuck: fold the walk immediately.
        moves.0.remove(&actor);
        registry.complete(actor);
        commands.trigger(TransportFailed {
            actor,
            detail: error.to_string(),
        });
        return;
    }

    commands.trigger(MovementStarted { actor, path });
}

fn on_move_verdict(on: On<MoveVerdict>, mut moves: ResMut<ActiveMoves>, mut commands: Commands) {
    let verdict = on.event();
    let Some(state) = moves.0.get_mut(&verdict.actor) else {
        // Resolved before the reply came back, or the actor is gone.
        // Summaries win either way.
        debug!("verdict for {:?} with no active move", verdict.actor);
        return;
    };

    if verdict.approved {
        let mut path = verdict.path.clone();
        if path.first() != Some(&state.origin()) {
            path.insert(0, state.origin());
        }
        if state.adopt(&path) {
            debug!("{:?} rerouted onto server path", verdict.actor);
        }
        commands.trigger(PathAdopted {
            actor: verdict.actor,
            path,
        });
    } else {
        state.reject();
    }
}

/// A move whose request died in transit ends where it stands; the next
/// summary corrects the cell.
fn on_transport_failure(
    on: On<TransportFailed>,
    mut moves: ResMut<ActiveMoves>,
    mut registry: ResMut<AnimationRegistry>,
) {
    let actor = on.event().actor;
    if moves.0.remove(&actor).is_some() {
        registry.complete(actor);
    }
}

pub fn tick_moves(
    time: Res<Time>,
    store: Res<SnapshotStore>,
    index: Res<ActorIndex>,
    mut moves: ResMut<ActiveMoves>,
    mut registry: ResMut<AnimationRegistry>,
    mut mirrors: Query<(&mut VisualPos, &mut Facing)>,
    mut commands: Commands,
) {
    let dt = time.delta_secs();
    let mut resolved: Vec<(ActorId, Step)> = Vec::new();

    for (&actor, state) in moves.0.iter_mut() {
        let step = state.advance(dt);
        let pos = match step {
            Step::Moving | Step::Waiting => state.visual_pos(),
            // The adopted path's end is the server position; one final copy.
            Step::Arrived => state.destination().as_vec2(),
            // Single corrective snap to wherever the server says we are.
            Step::Halted => store
                .get(actor)
                .map(|s| s.pos.as_vec2())
                .unwrap_or_else(|| state.visual_pos()),
        };

        if let Some(entity) = index.get(actor) {
            if let Ok((mut visual, mut facing)) = mirrors.get_mut(entity) {
                visual.0 = pos;
                if step == Step::Moving {
                    if let Some(heading) = state.heading() {
                        if *facing != heading {
                            *facing = heading;
                        }
                    }
                }
            }
        }

        if matches!(step, Step::Arrived | Step::Halted) {
            resolved.push((actor, step));
        }
    }

    for (actor, step) in resolved {
        moves.0.remove(&actor);
        registry.complete(actor);
        if step == Step::Halted {
            let resync_to = store.get(actor).map(|s| s.pos).unwrap_or_default();
            warn!("{}", ActionError::NetworkRejection(actor));
            commands.trigger(MovementRejected { actor, resync_to });
        }
    }
}
