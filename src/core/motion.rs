//! Piecewise-linear surface motion.
//!
//! A schedule is a sorted run of contiguous constant-velocity segments. Before
//! the first segment the surface sits at its base position; after the last it
//! stays wherever the last segment left it.

use crate::core::particle::{add_scaled, DIM};
use crate::error::{Error, Result};

/// Constant-velocity stretch of a motion schedule over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub velocity: [f64; DIM],
}

/// State of a schedule from time `t` until the next breakpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    /// Displacement from the base geometry at the query time.
    pub displacement: [f64; DIM],
    /// Velocity held until `end`.
    pub velocity: [f64; DIM],
    /// Time at which the velocity next changes (`f64::INFINITY` once static for good).
    pub end: f64,
}

/// Immutable motion schedule attached to a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSchedule {
    /// Segment boundaries: `breaks[i]..breaks[i + 1]` is segment `i`.
    breaks: Vec<f64>,
    velocities: Vec<[f64; DIM]>,
    /// Displacement accumulated at each break (same length as `breaks`).
    offsets: Vec<[f64; DIM]>,
}

impl MotionSchedule {
    /// Build a schedule starting at `start_time` from parallel velocity and duration lists.
    ///
    /// Errors: `Error::InvalidMotion` if the lists are empty or of different lengths, or any
    /// duration is not finite and > 0, or any velocity component is not finite.
    pub fn new(start_time: f64, velocities: &[[f64; DIM]], durations: &[f64]) -> Result<Self> {
        if velocities.is_empty() {
            return Err(Error::InvalidMotion("at least one segment is required".into()));
        }
        if velocities.len() != durations.len() {
            return Err(Error::InvalidMotion(format!(
                "{} velocities but {} durations",
                velocities.len(),
                durations.len()
            )));
        }
        if !start_time.is_finite() {
            return Err(Error::InvalidMotion("start time must be finite".into()));
        }

        let mut breaks = Vec::with_capacity(durations.len() + 1);
        let mut offsets = Vec::with_capacity(durations.len() + 1);
        breaks.push(start_time);
        offsets.push([0.0; DIM]);
        for (k, (v, &d)) in velocities.iter().zip(durations).enumerate() {
            if !d.is_finite() || d <= 0.0 {
                return Err(Error::InvalidMotion(format!(
                    "duration of segment {k} must be finite and > 0"
                )));
            }
            if !v.iter().all(|x| x.is_finite()) {
                return Err(Error::InvalidMotion(format!(
                    "velocity of segment {k} must be finite"
                )));
            }
            let last = breaks[k];
            let offset = offsets[k];
            breaks.push(last + d);
            offsets.push(add_scaled(&offset, v, d));
        }

        Ok(Self {
            breaks,
            velocities: velocities.to_vec(),
            offsets,
        })
    }

    /// Time the first segment starts.
    pub fn start_time(&self) -> f64 {
        self.breaks[0]
    }

    /// Time the last segment ends.
    pub fn end_time(&self) -> f64 {
        self.breaks[self.breaks.len() - 1]
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.velocities.len()
    }

    /// Always false for a constructed schedule.
    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }

    /// Segment `k`, if any.
    pub fn segment(&self, k: usize) -> Option<Segment> {
        let velocity = *self.velocities.get(k)?;
        Some(Segment {
            start: self.breaks[k],
            end: self.breaks[k + 1],
            velocity,
        })
    }

    /// Index of the segment containing `t` (half-open), or `None` outside the schedule.
    pub fn segment_index(&self, t: f64) -> Option<usize> {
        let k = self.breaks.partition_point(|&b| b <= t);
        if k == 0 || k >= self.breaks.len() {
            None
        } else {
            Some(k - 1)
        }
    }

    /// Displacement from the base geometry at time `t`.
    pub fn displacement(&self, t: f64) -> [f64; DIM] {
        self.piece(t).displacement
    }

    /// Velocity at time `t` (zero outside the schedule).
    pub fn velocity(&self, t: f64) -> [f64; DIM] {
        self.piece(t).velocity
    }

    /// Displacement, velocity, and next breakpoint at time `t`.
    pub fn piece(&self, t: f64) -> Piece {
        if t < self.start_time() {
            return Piece {
                displacement: [0.0; DIM],
                velocity: [0.0; DIM],
                end: self.start_time(),
            };
        }
        match self.segment_index(t) {
            Some(k) => {
                let v = self.velocities[k];
                Piece {
                    displacement: add_scaled(&self.offsets[k], &v, t - self.breaks[k]),
                    velocity: v,
                    end: self.breaks[k + 1],
                }
            }
            None => Piece {
                displacement: self.offsets[self.offsets.len() - 1],
                velocity: [0.0; DIM],
                end: f64::INFINITY,
            },
        }
    }
}
