//! Acceptance statistics of a sampling run.
//!
//! [`SamplingStats`] holds only counts, so two runs with the same inputs
//! compare equal. Wall-clock time lives on
//! [`SampledPoseSet`](crate::SampledPoseSet).

use serde::{Deserialize, Serialize};

use crate::predicates::Rejection;

// ---------------------------------------------------------------------------
// RejectionCounts
// ---------------------------------------------------------------------------

/// Discarded candidates per reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub collision: usize,
    pub out_of_bounds: usize,
    pub self_collision: usize,
}

impl RejectionCounts {
    pub const fn record(&mut self, reason: Rejection) {
        match reason {
            Rejection::Collision => self.collision += 1,
            Rejection::OutOfBounds => self.out_of_bounds += 1,
            Rejection::SelfCollision => self.self_collision += 1,
        }
    }

    pub const fn get(&self, reason: Rejection) -> usize {
        match reason {
            Rejection::Collision => self.collision,
            Rejection::OutOfBounds => self.out_of_bounds,
            Rejection::SelfCollision => self.self_collision,
        }
    }

    pub const fn total(&self) -> usize {
        self.collision + self.out_of_bounds + self.self_collision
    }

    pub const fn merge(&mut self, other: &Self) {
        self.collision += other.collision;
        self.out_of_bounds += other.out_of_bounds;
        self.self_collision += other.self_collision;
    }
}

// ---------------------------------------------------------------------------
// SamplingStats
// ---------------------------------------------------------------------------

/// Attempt and acceptance counts. `attempts == accepted + rejections.total()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SamplingStats {
    pub attempts: usize,
    pub accepted: usize,
    pub rejections: RejectionCounts,
}

impl SamplingStats {
    pub const fn new() -> Self {
        Self {
            attempts: 0,
            accepted: 0,
            rejections: RejectionCounts {
                collision: 0,
                out_of_bounds: 0,
                self_collision: 0,
            },
        }
    }

    pub const fn record_accept(&mut self) {
        self.attempts += 1;
        self.accepted += 1;
    }

    pub const fn record_reject(&mut self, reason: Rejection) {
        self.attempts += 1;
        self.rejections.record(reason);
    }

    /// `accepted / attempts`, or 0 when nothing was attempted.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.attempts as f64
    }

    /// `1 - success_rate`: every rejected attempt, whatever the reason.
    pub fn collision_rate(&self) -> f64 {
        1.0 - self.success_rate()
    }

    pub const fn merge(&mut self, other: &Self) {
        self.attempts += other.attempts;
        self.accepted += other.accepted;
        self.rejections.merge(&other.rejections);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
