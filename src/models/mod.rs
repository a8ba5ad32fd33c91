use bevy::prelude::*;

mod errors;
mod primitives;
mod settings;

pub use errors::*;
pub use primitives::*;
pub use settings::*;

pub fn plugin(app: &mut App) {
    app.add_plugins(settings::plugin);
}
