use bevy::prelude::*;
use std::collections::HashMap;

use crate::animation::controller::advance_registry;
use crate::animation::events::{
    AttackCommand, AttackImpactFrame, CommandFailed, DamageDealt, Died, HitLanded, TransportFailed,
};
use crate::animation::registry::{
    Animation, AnimationData, AnimationKind, AnimationRegistry,
};
use crate::animation::ClientTick;
use crate::models::{ActionError, ActorId, Facing, Settings, WeaponSlot};
use crate::movement::ActiveMoves;
use crate::networking::{ActorIndex, AttackOutcome, AttackVerdict, ClientRequest, ServerLink};
use crate::snapshot::SnapshotStore;

use super::Health;

pub fn plugin(app: &mut App) {
    app.init_resource::<PendingAttacks>()
        .add_observer(on_attack_command)
        .add_observer(on_impact_frame)
        .add_observer(on_attack_verdict)
        .add_observer(on_transport_failure)
        .add_observer(on_damage)
        .add_observer(on_hit_flinch)
        .add_observer(on_died)
        .add_systems(
            Update,
            tick_swings
                .in_set(ClientTick::Animate)
                .after(advance_registry),
        );
}

/// In-flight swings keyed by attacker. Damage resolves once both the impact
/// frame and the server outcome are in, in either arrival order.
#[derive(Resource, Default)]
pub struct PendingAttacks(pub(crate) HashMap<ActorId, AttackMetadata>);

#[derive(Debug, Clone)]
pub struct AttackMetadata {
    pub target: ActorId,
    pub slot: WeaponSlot,
    pub outcome: Option<AttackOutcome>,
    pub impact_seen: bool,
}

fn on_attack_command(
    on: On<AttackCommand>,
    settings: Res<Settings>,
    store: Res<SnapshotStore>,
    link: Res<ServerLink>,
    index: Res<ActorIndex>,
    mut registry: ResMut<AnimationRegistry>,
    mut pending: ResMut<PendingAttacks>,
    mut facings: Query<&mut Facing>,
    mut commands: Commands,
) {
    let AttackCommand {
        attacker,
        target,
        slot,
    } = *on.event();

    let Some(snapshot) = store.get(attacker) else {
        commands.trigger(CommandFailed {
            actor: attacker,
            error: ActionError::StaleEntity(attacker),
        });
        return;
    };
    let Some(target_snapshot) = store.get(target) else {
        commands.trigger(CommandFailed {
            actor: attacker,
            error: ActionError::StaleEntity(target),
        });
        return;
    };
    if !snapshot.senses.visible.contains(&target) {
        commands.trigger(CommandFailed {
            actor: attacker,
            error: ActionError::NotVisible(target),
        });
        return;
    }

    let animation = Animation::new(
        attacker,
        AnimationKind::Attack(slot),
        settings.combat.swing_duration,
        true,
        AnimationData::Target(target),
    );
    if let Err(error) = registry.start(animation) {
        debug!("{attacker:?} busy, swing at {target:?} dropped");
        commands.trigger(CommandFailed {
            actor: attacker,
            error,
        });
        return;
    }

    // Facing commits now, before the presenter sees the swing's first
    // frame, so the sprite never swings while pointed the wrong way.
    if let Some(entity) = index.get(attacker) {
        if let Ok(mut facing) = facings.get_mut(entity) {
            *facing = Facing::toward(snapshot.pos, target_snapshot.pos);
        }
    }

    pending.0.insert(
        attacker,
        AttackMetadata {
            target,
            slot,
            outcome: None,
            impact_seen: false,
        },
    );

    if let Err(error) = link.send(ClientRequest::Attack {
        attacker,
        target,
        slot,
    }) {
        pending.0.remove(&attacker);
        registry.complete(attacker);
        commands.trigger(TransportFailed {
            actor: attacker,
            detail: error.to_string(),
        });
    }
}

/// Damage fires once both halves are in; whichever half arrives second
/// triggers resolution.
fn try_resolve(attacker: ActorId, meta: &AttackMetadata, commands: &mut Commands) -> bool {
    if !meta.impact_seen {
        return false;
    }
    let Some(outcome) = meta.outcome else {
        return false;
    };
    if outcome.hit && outcome.damage > 0 {
        commands.trigger(DamageDealt {
            attacker,
            target: meta.target,
            damage: outcome.damage,
            critical: outcome.critical,
        });
    } else {
        debug!("{attacker:?} missed {:?}", meta.target);
    }
    true
}

fn on_impact_frame(
    on: On<AttackImpactFrame>,
    mut pending: ResMut<PendingAttacks>,
    mut commands: Commands,
) {
    let attacker = on.event().actor;
    let Some(meta) = pending.0.get_mut(&attacker) else {
        return;
    };
    meta.impact_seen = true;
    if try_resolve(attacker, meta, &mut commands) {
        pending.0.remove(&attacker);
    }
}

fn on_attack_verdict(
    on: On<AttackVerdict>,
    mut pending: ResMut<PendingAttacks>,
    mut commands: Commands,
) {
    let AttackVerdict { attacker, outcome } = *on.event();
    let Some(meta) = pending.0.get_mut(&attacker) else {
        debug!("verdict for {attacker:?} with no pending swing");
        return;
    };
    meta.outcome = Some(outcome);
    if try_resolve(attacker, meta, &mut commands) {
        pending.0.remove(&attacker);
    }
}

/// A swing whose request died in transit completes immediately, as if it
/// had missed.
fn on_transport_failure(
    on: On<TransportFailed>,
    mut pending: ResMut<PendingAttacks>,
    mut registry: ResMut<AnimationRegistry>,
) {
    let actor = on.event().actor;
    if pending.0.remove(&actor).is_some() {
        registry.complete(actor);
    }
}

/// Optimistic hp prediction plus feedback fan-out. The authoritative value
/// arrives with the next summary and overwrites whatever we guess here.
fn on_damage(
    on: On<DamageDealt>,
    index: Res<ActorIndex>,
    mut healths: Query<&mut Health>,
    mut commands: Commands,
) {
    let event = on.event().clone();
    let mut predicted_kill = false;
    if let Some(entity) = index.get(event.target) {
        if let Ok(mut health) = healths.get_mut(entity) {
            let was_alive = health.current > 0;
            health.current -= event.damage;
            predicted_kill = was_alive && health.is_dead();
        }
    }
    commands.trigger(HitLanded {
        attacker: event.attacker,
        target: event.target,
        damage: event.damage,
        critical: event.critical,
    });
    if predicted_kill {
        commands.trigger(Died {
            actor: event.target,
        });
    }
}

/// Flinch keys off the feedback event rather than the summary so it lands
/// in sync with the impact. Busy targets (mid-swing, mid-walk) don't flinch.
fn on_hit_flinch(
    on: On<HitLanded>,
    settings: Res<Settings>,
    mut registry: ResMut<AnimationRegistry>,
) {
    let target = on.event().target;
    let flinch = Animation::new(
        target,
        AnimationKind::Hit,
        settings.combat.hit_duration,
        false,
        AnimationData::None,
    );
    if registry.start(flinch).is_err() {
        debug!("{target:?} too busy to flinch");
    }
}

/// Death supersedes whatever the actor was doing and clears anything still
/// in flight for it.
fn on_died(
    on: On<Died>,
    settings: Res<Settings>,
    mut registry: ResMut<AnimationRegistry>,
    mut moves: ResMut<ActiveMoves>,
    mut pending: ResMut<PendingAttacks>,
) {
    let actor = on.event().actor;
    info!("{actor:?} died");
    registry.supersede(Animation::new(
        actor,
        AnimationKind::Death,
        settings.combat.death_duration,
        false,
        AnimationData::None,
    ));
    moves.0.remove(&actor);
    pending.0.remove(&actor);
}

/// The swing always plays its full duration, even when the reply lands
/// early; completion is strictly time-based.
pub fn tick_swings(mut registry: ResMut<AnimationRegistry>, mut pending: ResMut<PendingAttacks>) {
    let done: Vec<ActorId> = registry
        .iter()
        .filter(|a| matches!(a.kind, AnimationKind::Attack(_)))
        .filter(|a| a.is_playing() && a.elapsed >= a.duration)
        .map(|a| a.actor)
        .collect();
    for actor in done {
        registry.complete(actor);
    }

    // A reply that never arrives stops mattering once the swing's registry
    // entry is swept; drop the bookkeeping with it.
    pending.0.retain(|actor, _| {
        registry
            .get_active(*actor)
            .is_some_and(|a| matches!(a.kind, AnimationKind::Attack(_)))
    });
}
