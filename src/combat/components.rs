use bevy::prelude::*;

/// Mirror of the server-reported hit points. Predicted downward when damage
/// resolves locally; the next summary overwrites the guess.
#[derive(Component, Debug, Clone)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            self.current.max(0) as f32 / self.max as f32
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }
}
