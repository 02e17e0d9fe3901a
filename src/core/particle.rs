use crate::core::geometry::Boundary;
use crate::error::{Error, Result};

/// Fixed spatial dimension (3D).
pub const DIM: usize = 3;

/// Straight-line track state of a particle as seen by the geometry kernel.
///
/// Fields:
/// - `r`: position [x, y, z]
/// - `u`: unit direction of flight
/// - `time`: simulation time
/// - `speed`: flight speed (> 0), converts path length to elapsed time
/// - `crossings`: number of boundary events applied to this track
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position (x, y, z).
    pub r: [f64; DIM],
    /// Unit direction (ux, uy, uz).
    pub u: [f64; DIM],
    /// Simulation time.
    pub time: f64,
    /// Speed (> 0).
    pub speed: f64,
    /// Boundary events applied so far.
    pub crossings: u64,
}

impl Particle {
    /// Create a particle after validating invariants; `u` is normalized.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if any component is NaN/inf, `u` is zero, or `speed` is not > 0.
    pub fn new(r: [f64; DIM], u: [f64; DIM], time: f64, speed: f64) -> Result<Self> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !time.is_finite() {
            return Err(Error::InvalidParam("time must be finite".into()));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidParam("speed must be finite and > 0".into()));
        }
        Ok(Self {
            r,
            u: unit(u)?,
            time,
            speed,
            crossings: 0,
        })
    }

    /// Move along the current direction by `distance`, advancing time accordingly.
    #[inline]
    pub fn advance(&mut self, distance: f64) {
        self.r = add_scaled(&self.r, &self.u, distance);
        self.time += distance / self.speed;
    }

    /// Fly to a boundary returned by
    /// [`Geometry::distance_to_boundary`](crate::core::Geometry::distance_to_boundary)
    /// and take the post-crossing direction (specular for reflective surfaces).
    pub fn move_to_boundary(&mut self, boundary: &Boundary) -> Result<()> {
        if !boundary.distance.is_finite() {
            return Err(Error::InvalidParam(
                "cannot move to an unbounded boundary".into(),
            ));
        }
        self.advance(boundary.distance);
        self.u = boundary.direction;
        self.crossings = self.crossings.saturating_add(1);
        Ok(())
    }

    /// Set direction (validated and normalized).
    pub fn set_direction(&mut self, u: [f64; DIM]) -> Result<()> {
        self.u = unit(u)?;
        Ok(())
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, r: [f64; DIM]) -> Result<()> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.r = r;
        Ok(())
    }
}

// ============ Vector helpers ============

#[inline]
pub(crate) fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub(crate) fn sub(a: &[f64; DIM], b: &[f64; DIM]) -> [f64; DIM] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// `a + s * b`
#[inline]
pub(crate) fn add_scaled(a: &[f64; DIM], b: &[f64; DIM], s: f64) -> [f64; DIM] {
    [a[0] + s * b[0], a[1] + s * b[1], a[2] + s * b[2]]
}

/// Mirror `u` about the plane with normal `n` (any length, non-zero).
#[inline]
pub(crate) fn reflect(u: &[f64; DIM], n: &[f64; DIM]) -> [f64; DIM] {
    let nn = dot(n, n);
    if nn <= 0.0 {
        return *u;
    }
    add_scaled(u, n, -2.0 * dot(u, n) / nn)
}

fn unit(u: [f64; DIM]) -> Result<[f64; DIM]> {
    if !u.iter().all(|x| x.is_finite()) {
        return Err(Error::InvalidParam("direction must be finite".into()));
    }
    let norm = dot(&u, &u).sqrt();
    if norm <= f64::EPSILON {
        return Err(Error::InvalidParam("direction must be non-zero".into()));
    }
    Ok([u[0] / norm, u[1] / norm, u[2] / norm])
}
