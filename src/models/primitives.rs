use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Server-assigned identifier for a combat actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Integer cell on the combat grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Linear blend toward `other` in tile space.
    pub fn lerp(self, other: Self, t: f32) -> Vec2 {
        self.as_vec2().lerp(other.as_vec2(), t)
    }
}

/// Four-way sprite facing. `y` grows toward the bottom of the screen.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    South,
    North,
    East,
    West,
}

impl Facing {
    /// Dominant-axis facing from one cell toward another.
    pub fn toward(from: GridPos, to: GridPos) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx.abs() >= dy.abs() {
            if dx >= 0 { Self::East } else { Self::West }
        } else if dy > 0 {
            Self::South
        } else {
            Self::North
        }
    }
}

/// Which equipped weapon a swing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponSlot {
    #[default]
    Main,
    Off,
}

/// Which sprite sheet a combatant renders with. Sheets share a clip layout,
/// so the presenter only needs the kind to pick frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpriteSet {
    #[default]
    Knight,
    Archer,
    Ghoul,
}

impl SpriteSet {
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Knight => "knight",
            Self::Archer => "archer",
            Self::Ghoul => "ghoul",
        }
    }
}

/// Tile-space position actually rendered. Decoupled from the snapshot store
/// so movement can interpolate while the stored position is stale.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct VisualPos(pub Vec2);
