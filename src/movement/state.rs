//! Interpolation state machine for one walking actor.

use bevy::prelude::*;

use crate::models::{Facing, GridPos};

/// Where the server stands on an optimistic move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Pending,
    Adopted,
    Rejected,
}

/// What one tick of interpolation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moving,
    /// Path exhausted under an approved verdict.
    Arrived,
    /// Current tile finished under a rejected verdict; snap once.
    Halted,
    /// Path exhausted while the verdict is still pending; hold the cell.
    Waiting,
}

/// Per-actor interpolation state. Owned exclusively by the movement module;
/// everyone else reads the `VisualPos` it publishes.
#[derive(Debug, Clone)]
pub struct MovementState {
    /// Cells from origin (inclusive) to destination.
    path: Vec<GridPos>,
    /// Segment being walked: path[index] → path[index + 1].
    index: usize,
    /// Position within the segment, in [0, 1).
    progress: f32,
    /// Tiles per second.
    speed: f32,
    pub verdict: Verdict,
    /// Divergent server path waiting for the next segment boundary.
    pending_reroute: Option<Vec<GridPos>>,
}

impl MovementState {
    /// `path` must hold at least origin plus one step.
    pub fn new(path: Vec<GridPos>, speed: f32) -> Self {
        debug_assert!(path.len() >= 2);
        Self {
            path,
            index: 0,
            progress: 0.0,
            speed,
            verdict: Verdict::Pending,
            pending_reroute: None,
        }
    }

    pub fn origin(&self) -> GridPos {
        self.path[0]
    }

    pub fn destination(&self) -> GridPos {
        self.path[self.path.len() - 1]
    }

    pub fn path(&self) -> &[GridPos] {
        &self.path
    }

    /// Interpolated position in tile space.
    pub fn visual_pos(&self) -> Vec2 {
        let from = self.path[self.index];
        match self.path.get(self.index + 1) {
            Some(to) => from.lerp(*to, self.progress),
            None => from.as_vec2(),
        }
    }

    /// Facing along the current segment, if one remains.
    pub fn heading(&self) -> Option<Facing> {
        let from = self.path[self.index];
        self.path
            .get(self.index + 1)
            .map(|to| Facing::toward(from, *to))
    }

    fn finished(&self) -> bool {
        self.index + 1 >= self.path.len()
    }

    /// Advance by `dt` seconds. Remainders carry across segment boundaries,
    /// so the total walk time stays segments/speed regardless of tick size.
    pub fn advance(&mut self, dt: f32) -> Step {
        let mut budget = dt * self.speed;
        loop {
            // A rejected move finishes the tile it is on, nothing further.
            if self.verdict == Verdict::Rejected && self.progress == 0.0 {
                return Step::Halted;
            }
            if self.finished() {
                return match self.verdict {
                    Verdict::Pending => Step::Waiting,
                    Verdict::Adopted => Step::Arrived,
                    Verdict::Rejected => Step::Halted,
                };
            }
            self.progress += budget;
            if self.progress < 1.0 {
                return Step::Moving;
            }
            budget = self.progress - 1.0;
            self.progress = 0.0;
            self.index += 1;
            self.apply_reroute();
        }
    }

    /// Server approved the move. Identical paths adopt seamlessly; divergent
    /// ones splice at the next segment boundary so the visual never jumps.
    /// Returns whether the path diverged.
    pub fn adopt(&mut self, server_path: &[GridPos]) -> bool {
        self.verdict = Verdict::Adopted;
        if server_path == &self.path[..] {
            return false;
        }
        if self.progress == 0.0 {
            self.splice(server_path);
        } else {
            self.pending_reroute = Some(server_path.to_vec());
        }
        true
    }

    /// Server declined the move; the walk ends at the next tile boundary.
    pub fn reject(&mut self) {
        self.verdict = Verdict::Rejected;
        self.pending_reroute = None;
    }

    fn apply_reroute(&mut self) {
        if let Some(server_path) = self.pending_reroute.take() {
            self.splice(&server_path);
        }
    }

    /// Keep every traversed cell, then continue along the part of the server
    /// path not walked yet. Non-adjacent junctions get bridged with
    /// intermediate cells (x leg first) so every segment stays one tile long
    /// and the crossing speed never exceeds `speed`. Index and progress are
    /// untouched, so there is no backward motion and no visual jump.
    fn splice(&mut self, server_path: &[GridPos]) {
        let traversed = &self.path[..=self.index];
        let mut new_path = traversed.to_vec();
        for cell in server_path
            .iter()
            .copied()
            .skip_while(|c| traversed.contains(c))
        {
            let mut last = new_path[new_path.len() - 1];
            while last.manhattan(cell) > 1 {
                if last.x != cell.x {
                    last.x += (cell.x - last.x).signum();
                } else {
                    last.y += (cell.y - last.y).signum();
                }
                new_path.push(last);
            }
            new_path.push(cell);
        }
        self.path = new_path;
    }
}
