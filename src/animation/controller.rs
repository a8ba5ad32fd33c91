//! Tick orchestration: phase ordering, registry advancement, transition
//! fan-out.

use bevy::prelude::*;

use crate::animation::events::{AnimationCompleted, RegistryChanged};
use crate::animation::registry::{AnimationKind, AnimationRegistry, Transition};
use crate::models::ActorId;

/// Update-schedule phases, chained. Events emitted while animating reach
/// every observer before server messages are drained, so within one tick
/// the order is always: commands, animation, store sync, sweep.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientTick {
    /// Player-facing command entry points.
    Command,
    /// Interpolation, sprite frames, threshold events.
    Animate,
    /// Drain server messages, update the store, reconcile mirrors.
    StoreSync,
    /// Retire completed registry entries.
    Sweep,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<AnimationRegistry>()
        .configure_sets(
            Update,
            (
                ClientTick::Command,
                ClientTick::Animate,
                ClientTick::StoreSync,
                ClientTick::Sweep,
            )
                .chain(),
        )
        .add_systems(Update, advance_registry.in_set(ClientTick::Animate))
        .add_systems(
            Update,
            (fan_out_transitions, sweep_registry)
                .chain()
                .in_set(ClientTick::Sweep),
        );
}

/// Advance playing animations and complete the purely timed kinds. Move and
/// Attack are completed by their own handlers.
pub fn advance_registry(time: Res<Time>, mut registry: ResMut<AnimationRegistry>) {
    registry.advance(time.delta_secs());

    let timed_out: Vec<ActorId> = registry
        .iter()
        .filter(|a| matches!(a.kind, AnimationKind::Hit | AnimationKind::Death))
        .filter(|a| a.is_playing() && a.elapsed >= a.duration)
        .map(|a| a.actor)
        .collect();
    for actor in timed_out {
        registry.complete(actor);
    }
}

fn fan_out_transitions(mut registry: ResMut<AnimationRegistry>, mut commands: Commands) {
    for transition in registry.drain_transitions() {
        match transition {
            Transition::Started(actor, kind) => {
                debug!("{actor:?} started {kind:?}");
                commands.trigger(RegistryChanged { actor });
            }
            Transition::Completed(actor, kind) => {
                debug!("{actor:?} completed {kind:?}");
                commands.trigger(RegistryChanged { actor });
                commands.trigger(AnimationCompleted { actor, kind });
            }
        }
    }
}

fn sweep_registry(mut registry: ResMut<AnimationRegistry>) {
    registry.sweep();
}
