use bevy::prelude::*;

pub mod attack;
mod components;
pub mod sound;


pub use attack::{AttackMetadata, PendingAttacks, tick_swings};
pub use components::*;
pub use sound::{SoundCue, SoundSample};

pub fn plugin(app: &mut App) {
    app.add_plugins((attack::plugin, sound::plugin));
}
