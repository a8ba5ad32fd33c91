//! Headless demo: a knight and a ghoul on a loopback server. The knight
//! walks across the grid, swings at the ghoul, and the log shows what the
//! feedback layers would render.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::{app::App, log, prelude::*};

use wasm_tactics::ClientTick;
use wasm_tactics::animation::events::{AttackCommand, HitLanded, MoveCommand, MovementRejected};
use wasm_tactics::animation::registry::AnimationRegistry;
use wasm_tactics::models::{ActorId, GridPos, SpriteSet, WeaponSlot};
use wasm_tactics::networking::loopback::{self, LoopbackServer};

const KNIGHT: ActorId = ActorId(1);
const GHOUL: ActorId = ActorId(2);

fn main() {
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(16))),
        log::LogPlugin {
            level: log::Level::DEBUG,
            filter: "info,wasm_tactics=debug".to_string(),
            ..Default::default()
        },
    ));

    // The loopback transport must land before the client plugin reads it.
    app.add_plugins((loopback::plugin, wasm_tactics::plugin));

    app.init_resource::<Director>()
        .add_systems(Startup, seed_world)
        .add_systems(Update, director.in_set(ClientTick::Command))
        .add_observer(|on: On<HitLanded>| {
            info!(
                "hit landed on {:?} for {}{}",
                on.event().target,
                on.event().damage,
                if on.event().critical { " (crit!)" } else { "" },
            );
        })
        .add_observer(|on: On<MovementRejected>| {
            info!("move rejected, snapping to {:?}", on.event().resync_to);
        });

    app.run();
}

fn seed_world(mut server: ResMut<LoopbackServer>) {
    server.spawn_actor(KNIGHT, GridPos::new(0, 0), SpriteSet::Knight, 20);
    server.spawn_actor(GHOUL, GridPos::new(4, 0), SpriteSet::Ghoul, 10);
}

/// Scripted input: walk, then keep swinging until the ghoul drops.
#[derive(Resource, Default)]
struct Director {
    clock: f32,
    stage: u8,
    done_at: f32,
}

fn director(
    time: Res<Time>,
    registry: Res<AnimationRegistry>,
    store: Res<wasm_tactics::snapshot::SnapshotStore>,
    mut d: ResMut<Director>,
    mut commands: Commands,
    mut exit: MessageWriter<AppExit>,
) {
    d.clock += time.delta_secs();
    match d.stage {
        0 if d.clock > 0.2 => {
            commands.trigger(MoveCommand {
                actor: KNIGHT,
                target: GridPos::new(3, 0),
            });
            d.stage = 1;
        }
        1 if d.clock > 1.5 && registry.is_ready(KNIGHT) => {
            commands.trigger(AttackCommand {
                attacker: KNIGHT,
                target: GHOUL,
                slot: WeaponSlot::Main,
            });
            d.stage = 2;
        }
        2 if registry.is_ready(KNIGHT) => {
            let ghoul_down = store.get(GHOUL).map(|s| s.hp <= 0).unwrap_or(true);
            if ghoul_down || d.clock > 10.0 {
                // Leave the death animation a moment on screen.
                d.done_at = d.clock + 1.5;
                d.stage = 3;
            } else {
                d.stage = 1;
            }
        }
        3 if d.clock > d.done_at => {
            exit.write(AppExit::Success);
        }
        _ => {}
    }
}
