use glam::Vec2;
use std::collections::VecDeque;

/// Integrates planar deltas into a cursor position and keeps the trail.
#[derive(Debug, Clone)]
pub struct StrokeAccumulator {
    cursor: Vec2,
    path: VecDeque<Vec2>,
    scale: f32,
    max_len: Option<usize>,
}

impl StrokeAccumulator {
    pub fn new(scale: f32, max_len: Option<usize>) -> Self {
        Self {
            cursor: Vec2::ZERO,
            path: VecDeque::with_capacity(max_len.unwrap_or(0)),
            scale,
            max_len,
        }
    }

    /// `cursor += delta * scale`, then append the new cursor to the path.
    pub fn advance(&mut self, delta: Vec2) -> Vec2 {
        self.cursor += delta * self.scale;
        self.path.push_back(self.cursor);
        if let Some(max) = self.max_len {
            while self.path.len() > max {
                self.path.pop_front();
            }
        }
        self.cursor
    }

    /// Empty the path and return the cursor to the origin.
    pub fn reset(&mut self) {
        self.cursor = Vec2::ZERO;
        self.path.clear();
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Path points, oldest first.
    pub fn current_path(&self) -> Vec<Vec2> {
        self.path.iter().copied().collect()
    }
}
