use crate::core::handle::{LatticeId, SurfaceId};
use crate::core::EPS_COINCIDENT;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Things that can end a straight-line flight.
///
/// `level` is the depth in the location stack (0 = root universe) whose frame the
/// boundary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Crossing a surface bounding the cell at `level`.
    Surface { level: usize, surface: SurfaceId },
    /// Leaving the lattice element that holds the universe at `level`.
    LatticeEdge { level: usize, lattice: LatticeId },
    /// Reaching a census time.
    Census { time: NotNan<f64> },
}

impl EventKind {
    /// Tie-breaking key: shallower frames first, then surfaces before lattice edges,
    /// then lower ids; census loses to every spatial event.
    #[inline]
    fn order_key(&self) -> (usize, u8, u32) {
        match *self {
            EventKind::Surface { level, surface } => (level, 0, surface.0),
            EventKind::LatticeEdge { level, lattice } => (level, 1, lattice.0),
            EventKind::Census { .. } => (usize::MAX, 2, 0),
        }
    }
}

/// Candidate boundary event at a path-length `distance` ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub distance: NotNan<f64>,
    pub kind: EventKind,
}

impl Event {
    /// Create a new event, validating that the distance is finite and non-negative.
    pub fn new(distance: f64, kind: EventKind) -> Result<Self> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::InvalidParam(format!(
                "event distance must be finite and >= 0, got {distance}"
            )));
        }
        let distance = NotNan::new(distance)
            .map_err(|_| Error::InvalidParam("event distance cannot be NaN".into()))?;
        Ok(Self { distance, kind })
    }

    /// Census event for `time`, `distance` ahead.
    pub fn census(distance: f64, time: f64) -> Result<Self> {
        let time = NotNan::new(time)
            .map_err(|_| Error::InvalidParam("census time cannot be NaN".into()))?;
        Self::new(distance, EventKind::Census { time })
    }

    /// Returns the raw f64 distance.
    #[inline]
    pub fn distance_f64(&self) -> f64 {
        self.distance.into_inner()
    }

    /// Whether `self` happens before `other`.
    ///
    /// Distances within `EPS_COINCIDENT` of each other are ties, settled by the kind's
    /// order key so coincident boundaries resolve the same way every time.
    pub fn precedes(&self, other: &Event) -> bool {
        let (a, b) = (self.distance_f64(), other.distance_f64());
        if (a - b).abs() <= EPS_COINCIDENT {
            self.kind.order_key().cmp(&other.kind.order_key()) == Ordering::Less
        } else {
            a < b
        }
    }

    /// Earliest of `candidates` under [`Event::precedes`].
    pub fn earliest<I: IntoIterator<Item = Event>>(candidates: I) -> Option<Event> {
        candidates.into_iter().fold(None, |best, e| match best {
            Some(b) if !e.precedes(&b) => Some(b),
            _ => Some(e),
        })
    }
}
