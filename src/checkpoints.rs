// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::LatLon;

/// Ordered waypoints of a route, with the number of already passed legs.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoints {
    points: Vec<LatLon>,
    passed_idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckpointsError {
    #[error("at least two checkpoints are required, got {0}")]
    TooFew(usize),

    #[error("passed index {passed} out of range for {len} checkpoints")]
    PassedOutOfRange { passed: usize, len: usize },
}

impl Checkpoints {
    pub fn new(points: Vec<LatLon>) -> Result<Self, CheckpointsError> {
        if points.len() < 2 {
            return Err(CheckpointsError::TooFew(points.len()));
        }
        Ok(Self {
            points,
            passed_idx: 0,
        })
    }

    /// Marks the first `passed_idx` legs as already driven.
    pub fn with_passed_idx(mut self, passed_idx: usize) -> Result<Self, CheckpointsError> {
        if passed_idx >= self.points.len().saturating_sub(1) {
            return Err(CheckpointsError::PassedOutOfRange {
                passed: passed_idx,
                len: self.points.len(),
            });
        }
        self.passed_idx = passed_idx;
        Ok(self)
    }

    pub fn passed_idx(&self) -> usize {
        self.passed_idx
    }

    /// The current position: the last passed checkpoint.
    pub fn start(&self) -> LatLon {
        self.points[self.passed_idx]
    }

    pub fn finish(&self) -> LatLon {
        self.points[self.points.len() - 1]
    }

    pub fn point(&self, i: usize) -> Option<LatLon> {
        self.points.get(i).copied()
    }

    pub fn points(&self) -> &[LatLon] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of legs between consecutive checkpoints, passed ones included.
    pub fn num_subroutes(&self) -> usize {
        self.points.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: LatLon = LatLon::new(0.0, 0.0);
    const B: LatLon = LatLon::new(0.0, 0.01);
    const C: LatLon = LatLon::new(0.01, 0.01);

    #[test]
    fn needs_two_points() {
        assert_eq!(Checkpoints::new(vec![A]), Err(CheckpointsError::TooFew(1)));
        let c = Checkpoints::new(vec![A, B]).unwrap();
        assert_eq!(c.start(), A);
        assert_eq!(c.finish(), B);
        assert_eq!(c.num_subroutes(), 1);
    }

    #[test]
    fn passed_index() {
        let c = Checkpoints::new(vec![A, B, C]).unwrap().with_passed_idx(1).unwrap();
        assert_eq!(c.start(), B);
        assert_eq!(c.finish(), C);
        assert_eq!(c.point(0), Some(A));

        assert_eq!(
            Checkpoints::new(vec![A, B]).unwrap().with_passed_idx(1),
            Err(CheckpointsError::PassedOutOfRange { passed: 1, len: 2 }),
        );
        assert_eq!(
            Checkpoints::new(vec![A, B]).unwrap().with_passed_idx(usize::MAX),
            Err(CheckpointsError::PassedOutOfRange { passed: usize::MAX, len: 2 }),
        );
    }
}
