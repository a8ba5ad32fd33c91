//! Grid-tactics client core: optimistic movement prediction, per-actor
//! animation reconciliation, synchronous combat feedback fan-out.
//!
//! The server is an external collaborator behind
//! [`networking::ServerLink`]; insert one (for example via
//! [`networking::loopback::plugin`]) before adding [`plugin`].

use bevy::prelude::*;

pub mod animation;
pub mod combat;
pub mod effects;
pub mod models;
pub mod movement;
pub mod networking;
pub mod presenter;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod harness;

pub use animation::ClientTick;

pub fn plugin(app: &mut App) {
    app.add_plugins((
        models::plugin,
        snapshot::plugin,
        animation::plugin,
        movement::plugin,
        combat::plugin,
        effects::plugin,
        presenter::plugin,
        networking::plugin,
    ));
}
