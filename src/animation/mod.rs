use bevy::prelude::*;

pub mod controller;
pub mod events;
pub mod registry;


pub use controller::{ClientTick, advance_registry};
pub use events::*;
pub use registry::*;

pub fn plugin(app: &mut App) {
    app.add_plugins(controller::plugin);
}
