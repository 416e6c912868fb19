// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, LatLon};

/// Progress of a single stage of a route calculation, as a share of its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct SubProgress {
    start: Option<LatLon>,
    finish: Option<LatLon>,
    full_distance: f64,
    forward_distance: f64,
    backward_distance: f64,
    contribution: f64,
    current: f64,
}

impl SubProgress {
    /// Progress of a search between two points, which contributes
    /// `contribution` of its parent's progress.
    pub fn new(start: LatLon, finish: LatLon, contribution: f64) -> Self {
        let full_distance = earth_distance(start, finish);
        Self {
            start: Some(start),
            finish: Some(finish),
            full_distance,
            forward_distance: full_distance,
            backward_distance: full_distance,
            contribution,
            current: 0.0,
        }
    }

    /// A container stage without its own geometry, advanced only by
    /// [SubProgress::flush]-ing its children.
    pub fn plain(contribution: f64) -> Self {
        Self {
            start: None,
            finish: None,
            full_distance: 0.0,
            forward_distance: 0.0,
            backward_distance: 0.0,
            contribution,
            current: 0.0,
        }
    }

    pub fn contribution(&self) -> f64 {
        self.contribution
    }

    /// Records that a search has settled a vertex at `current`, heading towards `target`.
    /// Returns the progress of this stage, in `[0, contribution]`.
    ///
    /// Targets equal to the finish advance the forward front, any other target
    /// advances the backward one. The progress never decreases.
    pub fn update(&mut self, current: LatLon, target: LatLon) -> f64 {
        let (Some(finish), Some(_)) = (self.finish, self.start) else {
            return self.current;
        };
        if self.full_distance <= 0.0 {
            return self.current;
        }

        let dist = earth_distance(current, target);
        if target == finish {
            self.forward_distance = self.forward_distance.min(dist);
        } else {
            self.backward_distance = self.backward_distance.min(dist);
        }

        let part = (2.0 - (self.forward_distance + self.backward_distance) / self.full_distance).clamp(0.0, 1.0);
        self.current = self.current.max(self.contribution * part);
        return self.current;
    }

    /// Progress of this stage if a child stage has reached `v` of its own progress.
    pub fn nested(&self, v: f64) -> f64 {
        self.current + self.contribution * v
    }

    /// Permanently adds a finished child stage, which reached `v` of this stage.
    pub fn flush(&mut self, v: f64) {
        self.current += self.contribution * v;
    }
}

/// A stack of nested stages, whose root spans the whole calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    stack: Vec<SubProgress>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stack: vec![SubProgress::plain(1.0)],
        }
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sub: SubProgress) {
        self.stack.push(sub);
    }

    /// Removes the innermost stage and credits its whole contribution to its parent.
    pub fn pop_and_flush(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(child) = self.stack.pop() {
            if let Some(parent) = self.stack.last_mut() {
                parent.flush(child.contribution);
            }
        }
    }

    /// Removes the innermost stage without crediting it.
    pub fn drop_last(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Advances the innermost stage and returns the overall progress, in `[0, 1]`.
    pub fn update(&mut self, current: LatLon, target: LatLon) -> f64 {
        let Some(last) = self.stack.last_mut() else {
            return 0.0;
        };
        let mut v = last.update(current, target);
        for parent in self.stack.iter().rev().skip(1) {
            v = parent.nested(v);
        }
        return v.clamp(0.0, 1.0);
    }

    /// Overall progress without advancing anything.
    pub fn last_value(&self) -> f64 {
        let mut v = 0.0;
        for sub in self.stack.iter().rev() {
            v = sub.nested(v);
        }
        return v.clamp(0.0, 1.0);
    }
}
