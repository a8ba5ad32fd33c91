mod state;
mod systems;

#[cfg(test)]
mod tests;

pub use state::{MovementState, Step, Verdict};
pub use systems::{ActiveMoves, plugin, tick_moves};
