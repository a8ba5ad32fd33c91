//! Audio cue records. The core is headless: cues are data entities for a
//! platform audio backend to drain, and they retire themselves if nobody
//! does.

use bevy::prelude::*;
use rand::Rng;

use crate::animation::events::{AttackImpactFrame, Died, HitLanded};
use crate::models::Settings;

pub fn plugin(app: &mut App) {
    app.add_observer(swing_sound)
        .add_observer(punch_sound)
        .add_observer(death_sound)
        .add_systems(Update, tick_sound_cues);
}

/// Which sample bank a cue draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSample {
    Whoosh,
    Punch,
    CritPunch,
    Death,
}

#[derive(Component, Debug)]
pub struct SoundCue {
    pub sample: SoundSample,
    pub volume: f32,
    /// Playback rate around 1.0.
    pub pitch: f32,
    pub ttl: Timer,
}

fn spawn_cue(commands: &mut Commands, settings: &Settings, sample: SoundSample) {
    if settings.sound.muted {
        return;
    }
    let mut rng = rand::rng();
    // Volume variation: ±15%, pitch: ±8%
    let volume = settings.sfx() * rng.random_range(0.85..1.15);
    let pitch = rng.random_range(0.92..1.08);
    commands.spawn(SoundCue {
        sample,
        volume,
        pitch,
        ttl: Timer::from_seconds(1.0, TimerMode::Once),
    });
}

fn swing_sound(_on: On<AttackImpactFrame>, settings: Res<Settings>, mut commands: Commands) {
    spawn_cue(&mut commands, &settings, SoundSample::Whoosh);
}

fn punch_sound(on: On<HitLanded>, settings: Res<Settings>, mut commands: Commands) {
    let sample = if on.event().critical {
        SoundSample::CritPunch
    } else {
        SoundSample::Punch
    };
    spawn_cue(&mut commands, &settings, sample);
}

fn death_sound(_on: On<Died>, settings: Res<Settings>, mut commands: Commands) {
    spawn_cue(&mut commands, &settings, SoundSample::Death);
}

fn tick_sound_cues(
    time: Res<Time>,
    mut cues: Query<(Entity, &mut SoundCue)>,
    mut commands: Commands,
) {
    for (entity, mut cue) in cues.iter_mut() {
        if cue.ttl.tick(time.delta()).finished() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::events::HitLanded;
    use crate::harness;
    use crate::models::ActorId;

    const KNIGHT: ActorId = ActorId(1);
    const GHOUL: ActorId = ActorId(2);

    fn scenario(muted: bool) -> App {
        let (mut app, _endpoint) = harness::app();
        app.world_mut().resource_mut::<Settings>().sound.muted = muted;
        app
    }

    fn cue_count(app: &mut App) -> usize {
        app.world_mut().query::<&SoundCue>().iter(app.world()).count()
    }

    #[test]
    fn muted_settings_emit_no_cues() {
        let mut app = scenario(true);
        app.world_mut().trigger(HitLanded {
            attacker: KNIGHT,
            target: GHOUL,
            damage: 3,
            critical: true,
        });
        app.world_mut().trigger(AttackImpactFrame { actor: KNIGHT });
        assert_eq!(cue_count(&mut app), 0);
    }

    #[test]
    fn cues_carry_jitter_and_retire() {
        let mut app = scenario(false);
        app.world_mut().trigger(AttackImpactFrame { actor: KNIGHT });
        app.world_mut().flush();

        let sfx = app.world().resource::<Settings>().sfx();
        {
            let mut cues = app.world_mut().query::<&SoundCue>();
            let cue = cues.iter(app.world()).next().expect("whoosh cue");
            assert_eq!(cue.sample, SoundSample::Whoosh);
            assert!(cue.volume >= sfx * 0.85 && cue.volume <= sfx * 1.15);
            assert!(cue.pitch >= 0.92 && cue.pitch <= 1.08);
        }

        harness::tick(&mut app, 1.05);
        assert_eq!(cue_count(&mut app), 0);
    }
}
