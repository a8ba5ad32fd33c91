//! Per-actor animation slots with conflict detection.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::models::{ActionError, ActorId, GridPos, WeaponSlot};

/// What an actor is visually doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Idle,
    Move,
    Attack(WeaponSlot),
    Hit,
    Death,
}

impl AnimationKind {
    /// Cancelable kinds yield to a new animation instead of conflicting.
    pub fn is_cancelable(self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Playing,
    Completed,
}

/// Kind-specific payload.
#[derive(Debug, Clone, Default)]
pub enum AnimationData {
    #[default]
    None,
    Path(Vec<GridPos>),
    Target(ActorId),
}

/// One scheduled animation. At most one exists per actor.
#[derive(Debug, Clone)]
pub struct Animation {
    pub actor: ActorId,
    pub kind: AnimationKind,
    pub status: AnimationStatus,
    pub elapsed: f32,
    pub duration: f32,
    /// False for server-driven animations (hit reaction, death).
    pub client_initiated: bool,
    pub data: AnimationData,
    /// Monotonic id assigned on registration; fired-once guards key off it.
    pub instance: u64,
    swept: bool,
}

impl Animation {
    pub fn new(
        actor: ActorId,
        kind: AnimationKind,
        duration: f32,
        client_initiated: bool,
        data: AnimationData,
    ) -> Self {
        Self {
            actor,
            kind,
            status: AnimationStatus::Playing,
            elapsed: 0.0,
            duration,
            client_initiated,
            data,
            instance: 0,
            swept: false,
        }
    }

    /// Fraction of the animation played, clamped to [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == AnimationStatus::Playing
    }
}

/// Lifecycle notifications, drained by the controller once per tick.
#[derive(Debug, Clone)]
pub enum Transition {
    Started(ActorId, AnimationKind),
    Completed(ActorId, AnimationKind),
}

#[derive(Resource, Default)]
pub struct AnimationRegistry {
    entries: HashMap<ActorId, Animation>,
    transitions: Vec<Transition>,
    next_instance: u64,
}

impl AnimationRegistry {
    /// Register `animation` for its actor. Fails while a non-cancelable
    /// animation is still playing; replaces cancelable or completed ones.
    pub fn start(&mut self, animation: Animation) -> Result<(), ActionError> {
        if !self.is_ready(animation.actor) {
            return Err(ActionError::Conflict(animation.actor));
        }
        self.insert(animation);
        Ok(())
    }

    /// Register `animation` even over a playing one. Server-driven kinds
    /// (hit reaction, death) use this; the displaced animation completes.
    pub fn supersede(&mut self, animation: Animation) {
        if let Some(old) = self.entries.get(&animation.actor) {
            if old.is_playing() {
                self.transitions
                    .push(Transition::Completed(old.actor, old.kind));
            }
        }
        self.insert(animation);
    }

    fn insert(&mut self, mut animation: Animation) {
        self.next_instance += 1;
        animation.instance = self.next_instance;
        self.transitions
            .push(Transition::Started(animation.actor, animation.kind));
        self.entries.insert(animation.actor, animation);
    }

    /// Mark the actor's animation completed. The entry stays queryable until
    /// the sweep after next, so observers late in the tick still see it.
    pub fn complete(&mut self, actor: ActorId) {
        let Some(entry) = self.entries.get_mut(&actor) else {
            return;
        };
        if entry.status == AnimationStatus::Completed {
            return;
        }
        entry.status = AnimationStatus::Completed;
        self.transitions.push(Transition::Completed(actor, entry.kind));
    }

    pub fn get_active(&self, actor: ActorId) -> Option<&Animation> {
        self.entries.get(&actor)
    }

    /// Drop the entry without a completion transition. Despawn path only.
    pub fn remove(&mut self, actor: ActorId) -> Option<Animation> {
        self.entries.remove(&actor)
    }

    /// Whether the actor can accept a new command.
    pub fn is_ready(&self, actor: ActorId) -> bool {
        match self.entries.get(&actor) {
            Some(a) => !a.is_playing() || a.kind.is_cancelable(),
            None => true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.entries.values()
    }

    /// Advance every playing animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        for animation in self.entries.values_mut() {
            if animation.is_playing() {
                animation.elapsed += dt;
            }
        }
    }

    /// Retire entries that were already completed when the previous sweep
    /// ran. Freshly completed ones survive exactly one more tick.
    pub fn sweep(&mut self) {
        self.entries.retain(|_, animation| {
            if animation.status != AnimationStatus::Completed {
                return true;
            }
            if animation.swept {
                false
            } else {
                animation.swept = true;
                true
            }
        });
    }

    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }
}
