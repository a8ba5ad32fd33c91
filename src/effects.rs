//! Reactive visual feedback. Every instance is an independently timed,
//! self-retiring entity; overlap per actor is expected and uncoordinated.

use bevy::prelude::*;
use rand::Rng;

use crate::animation::events::{AttackImpactFrame, HitLanded};
use crate::models::VisualPos;
use crate::networking::ActorIndex;

pub fn plugin(app: &mut App) {
    app.add_observer(on_swing_arc)
        .add_observer(on_hit_effects)
        .add_systems(Update, (tick_floaters, tick_flashes, tick_arcs));
}

// ── Damage Floaters ─────────────────────────────────────────────────

const FLOATER_DURATION: f32 = 0.8;
const FLOATER_RISE: f32 = 0.6;

/// A damage number drifting up from the target, in tile space.
#[derive(Component, Debug)]
pub struct DamageFloater {
    pub amount: i32,
    pub critical: bool,
    pub world_pos: Vec2,
    pub offset: Vec2,
    pub timer: f32,
}

// ── Hit Flash ───────────────────────────────────────────────────────

/// Brief white-out on the struck mirror entity.
#[derive(Component, Debug)]
pub struct HitFlash {
    pub remaining: f32,
}

impl HitFlash {
    pub const DURATION: f32 = 0.12;
}

// ── Swing Arc ───────────────────────────────────────────────────────

/// Slash arc at the attacker, spawned on the impact frame.
#[derive(Component, Debug)]
pub struct SwingArc {
    pub at: Vec2,
    pub timer: f32,
}

impl SwingArc {
    pub const DURATION: f32 = 0.25;
}

// ── Observers ───────────────────────────────────────────────────────

fn on_swing_arc(
    on: On<AttackImpactFrame>,
    index: Res<ActorIndex>,
    positions: Query<&VisualPos>,
    mut commands: Commands,
) {
    let Some(entity) = index.get(on.event().actor) else {
        return;
    };
    let Ok(pos) = positions.get(entity) else {
        return;
    };
    commands.spawn(SwingArc {
        at: pos.0,
        timer: 0.0,
    });
}

fn on_hit_effects(
    on: On<HitLanded>,
    index: Res<ActorIndex>,
    positions: Query<&VisualPos>,
    mut commands: Commands,
) {
    let event = on.event().clone();
    let Some(entity) = index.get(event.target) else {
        return;
    };
    let Ok(pos) = positions.get(entity) else {
        return;
    };

    let mut rng = rand::rng();
    let offset = Vec2::new(
        rng.random_range(-0.25..0.25),
        rng.random_range(-0.15..0.15),
    );
    commands.spawn(DamageFloater {
        amount: event.damage,
        critical: event.critical,
        world_pos: pos.0,
        offset,
        timer: 0.0,
    });
    commands.entity(entity).insert(HitFlash {
        remaining: HitFlash::DURATION,
    });
}

// ── Tick systems ────────────────────────────────────────────────────

fn tick_floaters(
    time: Res<Time>,
    mut floaters: Query<(Entity, &mut DamageFloater)>,
    mut commands: Commands,
) {
    let dt = time.delta_secs();
    for (entity, mut floater) in floaters.iter_mut() {
        floater.timer += dt;
        let t = floater.timer / FLOATER_DURATION;
        if t >= 1.0 {
            commands.entity(entity).despawn();
            continue;
        }
        // Rises fastest right after the pop, easing out.
        floater.offset.y -= FLOATER_RISE * dt * (1.0 - t).max(0.3);
    }
}

fn tick_flashes(
    time: Res<Time>,
    mut flashes: Query<(Entity, &mut HitFlash)>,
    mut commands: Commands,
) {
    for (entity, mut flash) in flashes.iter_mut() {
        flash.remaining -= time.delta_secs();
        if flash.remaining <= 0.0 {
            commands.entity(entity).remove::<HitFlash>();
        }
    }
}

fn tick_arcs(time: Res<Time>, mut arcs: Query<(Entity, &mut SwingArc)>, mut commands: Commands) {
    for (entity, mut arc) in arcs.iter_mut() {
        arc.timer += time.delta_secs();
        if arc.timer >= SwingArc::DURATION {
            commands.entity(entity).despawn();
        }
    }
}
