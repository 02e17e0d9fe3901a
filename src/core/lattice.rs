//! Structured grids of universes.
//!
//! Index convention: element `[ix, iy, iz]` covers
//! `origin + i * pitch <= coordinate < origin + (i + 1) * pitch` on every bounded axis,
//! with `ix`, `iy`, `iz` increasing with geometric x, y, z. Explicit arrays are written
//! the way input decks list them: `[z][row][x]` with the *first row at the largest y*,
//! so rows are flipped on construction. Element-local coordinates are centered on the
//! element; an unbounded axis passes its coordinate through unchanged.

use crate::core::handle::UniverseId;
use crate::core::particle::DIM;
use crate::core::{widen, EPS_COINCIDENT};
use crate::error::{Error, Result};

/// Regular spacing along one lattice axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeAxis {
    /// Lower edge of element 0.
    pub origin: f64,
    /// Element width (> 0).
    pub pitch: f64,
    /// Number of elements (> 0).
    pub count: usize,
}

impl LatticeAxis {
    pub fn new(origin: f64, pitch: f64, count: usize) -> Result<Self> {
        if !origin.is_finite() {
            return Err(Error::InvalidLattice("axis origin must be finite".into()));
        }
        if !pitch.is_finite() || pitch <= 0.0 {
            return Err(Error::InvalidLattice("axis pitch must be finite and > 0".into()));
        }
        if count == 0 {
            return Err(Error::InvalidLattice("axis count must be > 0".into()));
        }
        Ok(Self {
            origin,
            pitch,
            count,
        })
    }

    /// Axis of `count` elements centered on zero.
    pub fn centered(pitch: f64, count: usize) -> Result<Self> {
        Self::new(-0.5 * pitch * count as f64, pitch, count)
    }

    /// Raw (possibly out-of-range) element index of coordinate `x`.
    ///
    /// With a direction component, a coordinate on a grid line belongs to the element
    /// the direction points into. The grid-line tolerance grows with the coordinate
    /// magnitude and never exceeds a quarter pitch.
    fn index(&self, x: f64, u: Option<f64>) -> i64 {
        let f = (x - self.origin) / self.pitch;
        if let Some(u) = u {
            let line = f.round();
            let tol = widen(EPS_COINCIDENT, x.abs().max(self.origin.abs())).min(0.25 * self.pitch);
            if ((f - line) * self.pitch).abs() <= tol {
                return if u < 0.0 { line as i64 - 1 } else { line as i64 };
            }
        }
        f.floor() as i64
    }

    fn center(&self, i: usize) -> f64 {
        self.origin + (i as f64 + 0.5) * self.pitch
    }
}

/// Element selected by a lattice lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeHit {
    /// `[ix, iy, iz]`
    pub index: [usize; DIM],
    pub universe: UniverseId,
    /// Coordinates relative to the element center.
    pub local: [f64; DIM],
}

/// Element index outside the lattice extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub index: [i64; DIM],
}

/// Rectangular array of universes on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    axes: [Option<LatticeAxis>; DIM],
    /// x fastest, then y, then z, all ascending.
    universes: Vec<UniverseId>,
}

impl Lattice {
    /// Build from a flat array in x-fastest, ascending-y, ascending-z order.
    pub fn new(axes: [Option<LatticeAxis>; DIM], universes: Vec<UniverseId>) -> Result<Self> {
        let expected: usize = axes.iter().map(|a| a.map_or(1, |a| a.count)).product();
        if universes.len() != expected {
            return Err(Error::InvalidLattice(format!(
                "{expected} universes needed, got {}",
                universes.len()
            )));
        }
        Ok(Self { axes, universes })
    }

    /// Every element holds the same universe.
    pub fn uniform(axes: [Option<LatticeAxis>; DIM], universe: UniverseId) -> Result<Self> {
        let n: usize = axes.iter().map(|a| a.map_or(1, |a| a.count)).product();
        Self::new(axes, vec![universe; n])
    }

    /// Build from deck-ordered layers `[z][row][x]`, first row at the largest y.
    pub fn from_layers(
        axes: [Option<LatticeAxis>; DIM],
        layers: Vec<Vec<Vec<UniverseId>>>,
    ) -> Result<Self> {
        let shape = axes.map(|a| a.map_or(1, |a| a.count));
        if layers.len() != shape[2] {
            return Err(Error::InvalidLattice(format!(
                "{} layers needed, got {}",
                shape[2],
                layers.len()
            )));
        }
        let mut flat = Vec::with_capacity(shape.iter().product());
        for (iz, rows) in layers.into_iter().enumerate() {
            if rows.len() != shape[1] {
                return Err(Error::InvalidLattice(format!(
                    "layer {iz} needs {} rows, got {}",
                    shape[1],
                    rows.len()
                )));
            }
            for (k, row) in rows.into_iter().rev().enumerate() {
                if row.len() != shape[0] {
                    return Err(Error::InvalidLattice(format!(
                        "layer {iz} row {} needs {} columns, got {}",
                        shape[1] - 1 - k,
                        shape[0],
                        row.len()
                    )));
                }
                flat.extend(row);
            }
        }
        Self::new(axes, flat)
    }

    /// 2-D lattice in x and y from deck-ordered rows (first row at the largest y).
    pub fn from_rows(x: LatticeAxis, y: LatticeAxis, rows: Vec<Vec<UniverseId>>) -> Result<Self> {
        Self::from_layers([Some(x), Some(y), None], vec![rows])
    }

    pub fn axes(&self) -> &[Option<LatticeAxis>; DIM] {
        &self.axes
    }

    /// Every universe referenced by the lattice (with repeats).
    pub fn universes(&self) -> &[UniverseId] {
        &self.universes
    }

    /// Universe stored at an in-range index.
    pub fn universe_at(&self, index: [usize; DIM]) -> Option<UniverseId> {
        let shape = self.axes.map(|a| a.map_or(1, |a| a.count));
        if index.iter().zip(shape.iter()).any(|(i, n)| i >= n) {
            return None;
        }
        let flat = (index[2] * shape[1] + index[1]) * shape[0] + index[0];
        self.universes.get(flat).copied()
    }

    /// Center of an element in the lattice frame (0 on unbounded axes).
    pub fn element_center(&self, index: [usize; DIM]) -> [f64; DIM] {
        let mut c = [0.0; DIM];
        for (k, axis) in self.axes.iter().enumerate() {
            if let Some(a) = axis {
                c[k] = a.center(index[k]);
            }
        }
        c
    }

    /// Element under `local` by floor indexing.
    pub fn element_at(&self, local: &[f64; DIM]) -> std::result::Result<LatticeHit, OutOfRange> {
        self.element_along(local, None)
    }

    /// Element under `local`; with a direction, grid-line ties go to the element ahead.
    pub fn element_along(
        &self,
        local: &[f64; DIM],
        direction: Option<&[f64; DIM]>,
    ) -> std::result::Result<LatticeHit, OutOfRange> {
        let mut raw = [0_i64; DIM];
        for (k, axis) in self.axes.iter().enumerate() {
            if let Some(a) = axis {
                raw[k] = a.index(local[k], direction.map(|u| u[k]));
            }
        }

        let mut index = [0_usize; DIM];
        for (k, axis) in self.axes.iter().enumerate() {
            let n = axis.map_or(1, |a| a.count) as i64;
            if raw[k] < 0 || raw[k] >= n {
                return Err(OutOfRange { index: raw });
            }
            index[k] = raw[k] as usize;
        }

        let universe = self.universe_at(index).ok_or(OutOfRange { index: raw })?;
        let center = self.element_center(index);
        let mut element_local = *local;
        for (k, axis) in self.axes.iter().enumerate() {
            if axis.is_some() {
                element_local[k] -= center[k];
            }
        }
        Ok(LatticeHit {
            index,
            universe,
            local: element_local,
        })
    }

    /// Distance along `u` from element-local `local` to the edge of its element.
    ///
    /// `None` when the direction never meets a bounded face (e.g. a 2-D lattice and a
    /// purely axial flight).
    pub fn distance_to_edge(&self, local: &[f64; DIM], u: &[f64; DIM]) -> Option<f64> {
        let mut best = f64::INFINITY;
        for (k, axis) in self.axes.iter().enumerate() {
            let Some(a) = axis else { continue };
            let half = 0.5 * a.pitch;
            let d = if u[k] > 0.0 {
                (half - local[k]) / u[k]
            } else if u[k] < 0.0 {
                (-half - local[k]) / u[k]
            } else {
                continue;
            };
            best = best.min(d.max(0.0));
        }
        best.is_finite().then_some(best)
    }
}
