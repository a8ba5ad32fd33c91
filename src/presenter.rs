//! Sprite frame selection. Frame indices exist only here; the rest of the
//! crate talks in animation progress. The drawing boundary consumes
//! (`VisualPos`, `Facing`, [`SpriteAnimator::frame`]) per mirror entity.

use bevy::prelude::*;

use crate::animation::events::AttackImpactFrame;
use crate::animation::registry::{AnimationKind, AnimationRegistry};
use crate::animation::ClientTick;
use crate::models::{Settings, SpriteSet};
use crate::movement::tick_moves;
use crate::networking::ServerId;

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        advance_sprites
            .in_set(ClientTick::Animate)
            .after(tick_moves),
    );
}

/// Per-mirror sprite playback state.
#[derive(Component, Debug)]
pub struct SpriteAnimator {
    pub sheet: SpriteSet,
    pub frame: u32,
    idle_clock: f32,
    /// Animation instance the impact frame already fired for.
    fired_impact: Option<u64>,
}

impl SpriteAnimator {
    pub fn new(sheet: SpriteSet) -> Self {
        Self {
            sheet,
            frame: 0,
            idle_clock: 0.0,
            fired_impact: None,
        }
    }
}

/// Frames per clip. All sheets share the layout.
fn frame_count(kind: AnimationKind) -> u32 {
    match kind {
        AnimationKind::Idle => 4,
        AnimationKind::Move => 8,
        AnimationKind::Attack(_) => 6,
        AnimationKind::Hit => 3,
        AnimationKind::Death => 7,
    }
}

/// Map animation progress to frames, loop the idle clip when nothing is
/// registered, and fire the impact frame exactly once per swing when
/// progress crosses the configured fraction, even if a tick straddles it.
pub fn advance_sprites(
    time: Res<Time>,
    settings: Res<Settings>,
    registry: Res<AnimationRegistry>,
    mut sprites: Query<(&ServerId, &mut SpriteAnimator)>,
    mut commands: Commands,
) {
    let dt = time.delta_secs();
    for (id, mut animator) in sprites.iter_mut() {
        match registry.get_active(id.0) {
            Some(animation) => {
                let frames = frame_count(animation.kind);
                let progress = animation.progress();
                animator.frame = ((progress * frames as f32) as u32).min(frames - 1);
                animator.idle_clock = 0.0;

                // No playing check: a giant tick can complete the swing in
                // the same frame it crosses the threshold, and the entry
                // stays queryable until the sweep.
                if let AnimationKind::Attack(_) = animation.kind {
                    if progress >= settings.presenter.impact_fraction
                        && animator.fired_impact != Some(animation.instance)
                    {
                        animator.fired_impact = Some(animation.instance);
                        commands.trigger(AttackImpactFrame { actor: id.0 });
                    }
                }
            }
            None => {
                // Free-running idle loop.
                animator.idle_clock += dt;
                let frames = frame_count(AnimationKind::Idle);
                animator.frame =
                    (animator.idle_clock * settings.presenter.frame_rate) as u32 % frames;
            }
        }
    }
}
