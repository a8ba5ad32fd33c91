//! Animation lifecycle events: the bus between movement, combat, and the
//! feedback layers.
//!
//! Movement chain: [`MoveCommand`] → [`MovementStarted`] →
//!                 ([`PathAdopted`] | [`MovementRejected`]) → [`AnimationCompleted`]
//! Attack chain:   [`AttackCommand`] → [`AttackImpactFrame`] → [`DamageDealt`]
//!                 → [`HitLanded`]
//! Death chain:    [`DamageDealt`] → [`Died`] (summaries can kill too)
//!
//! Convention: commands use imperative form (hasn't happened yet), the rest
//! past tense (it happened). The tense tells you the event's role.

use bevy::prelude::*;

use crate::animation::registry::AnimationKind;
use crate::models::{ActionError, ActorId, GridPos, WeaponSlot};

// ── Commands ────────────────────────────────────────────────────────

/// Command: the player asked an actor to walk to `target`.
#[derive(Event, Clone, Debug)]
pub struct MoveCommand {
    pub actor: ActorId,
    pub target: GridPos,
}

/// Command: the player asked `attacker` to swing at `target`.
#[derive(Event, Clone, Debug)]
pub struct AttackCommand {
    pub attacker: ActorId,
    pub target: ActorId,
    pub slot: WeaponSlot,
}

/// A command was dropped before anything became visible.
#[derive(Event, Clone, Debug)]
pub struct CommandFailed {
    pub actor: ActorId,
    pub error: ActionError,
}

// ── Mutations ───────────────────────────────────────────────────────

/// Mutation: optimistic movement began along `path` (origin first).
#[derive(Event, Clone, Debug)]
pub struct MovementStarted {
    pub actor: ActorId,
    pub path: Vec<GridPos>,
}

/// Mutation: the server approved movement; `path` is now authoritative.
#[derive(Event, Clone, Debug)]
pub struct PathAdopted {
    pub actor: ActorId,
    pub path: Vec<GridPos>,
}

/// Mutation: the server rejected movement; the actor finishes its tile and
/// snaps to `resync_to`.
#[derive(Event, Clone, Debug)]
pub struct MovementRejected {
    pub actor: ActorId,
    pub resync_to: GridPos,
}

/// Mutation: damage resolved against `target`: the impact frame was seen
/// and the server outcome is in.
#[derive(Event, Clone, Debug)]
pub struct DamageDealt {
    pub attacker: ActorId,
    pub target: ActorId,
    pub damage: i32,
    pub critical: bool,
}

/// Cross-domain mutation: an actor's hp reached zero.
#[derive(Event, Clone, Debug)]
pub struct Died {
    pub actor: ActorId,
}

// ── Timing & feedback ───────────────────────────────────────────────

/// Timing: the swing crossed its impact fraction. Fired once per swing by
/// the presenter, which is the only place frame timing is visible.
#[derive(Event, Clone, Debug)]
pub struct AttackImpactFrame {
    pub actor: ActorId,
}

/// Feedback: a hit visually landed and the feedback layers should react.
#[derive(Event, Clone, Debug)]
pub struct HitLanded {
    pub attacker: ActorId,
    pub target: ActorId,
    pub damage: i32,
    pub critical: bool,
}

/// An animation finished and is leaving the registry.
#[derive(Event, Clone, Debug)]
pub struct AnimationCompleted {
    pub actor: ActorId,
    pub kind: AnimationKind,
}

/// Something in the registry changed; cheap repaint hint for UI layers.
#[derive(Event, Clone, Debug)]
pub struct RegistryChanged {
    pub actor: ActorId,
}

/// Transport-level failure, surfaced as a transient UI message. The
/// affected animation completes immediately rather than hanging.
#[derive(Event, Clone, Debug)]
pub struct TransportFailed {
    pub actor: ActorId,
    pub detail: String,
}
