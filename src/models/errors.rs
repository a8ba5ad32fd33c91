use thiserror::Error;

use super::{ActorId, GridPos};

/// Everything that can go wrong between a player command and its resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// A non-cancelable animation is still playing for this actor.
    /// Recovered locally: the command is dropped, the original animation
    /// keeps running.
    #[error("actor {0:?} is busy with another animation")]
    Conflict(ActorId),

    /// The target cell is not in the actor's precomputed path map.
    #[error("no path to {0:?}")]
    Unreachable(GridPos),

    /// The server declined the action; local prediction rolls back.
    #[error("server rejected the action for actor {0:?}")]
    NetworkRejection(ActorId),

    /// The request never reached the server.
    #[error("transport failure: {0}")]
    NetworkFailure(String),

    /// The actor disappeared from the snapshot store mid-flight.
    #[error("actor {0:?} no longer exists")]
    StaleEntity(ActorId),

    /// The target exists but is outside the attacker's visibility set.
    #[error("actor {0:?} is out of sight")]
    NotVisible(ActorId),
}
