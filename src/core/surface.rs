use crate::core::motion::MotionSchedule;
use crate::core::particle::{add_scaled, dot, sub, DIM};
use crate::core::EPS_DIST;
use crate::error::{Error, Result};
use serde::Deserialize;

/// Below this |n·w| a ray is treated as parallel to a plane.
const EPS_PARALLEL: f64 = 1e-14;

/// Which of a surface's two half-spaces a point lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// Implicit value >= 0.
    Positive,
    /// Implicit value < 0.
    Negative,
}

impl Sense {
    /// Sense of an implicit-function value.
    #[inline]
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Sense::Positive
        } else {
            Sense::Negative
        }
    }

    /// The other half-space.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Sense::Positive => Sense::Negative,
            Sense::Negative => Sense::Positive,
        }
    }
}

/// Behavior applied when a particle crosses the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    /// Ordinary interface between cells.
    #[default]
    #[serde(alias = "none")]
    Interior,
    /// Particle leaves the modeled domain.
    Vacuum,
    /// Specular reflection about the surface normal.
    Reflective,
}

impl BoundaryCondition {
    /// Lowercase deck name.
    pub fn label(&self) -> &'static str {
        match self {
            BoundaryCondition::Interior => "interior",
            BoundaryCondition::Vacuum => "vacuum",
            BoundaryCondition::Reflective => "reflective",
        }
    }
}

/// Implicit-function shape of a surface, in the surface's base (unmoved) position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceKind {
    /// x - x0
    PlaneX { x: f64 },
    /// y - y0
    PlaneY { y: f64 },
    /// z - z0
    PlaneZ { z: f64 },
    /// Ax + By + Cz + D
    Plane { a: f64, b: f64, c: f64, d: f64 },
    /// (y - y0)² + (z - z0)² - R²
    CylinderX {
        #[serde(default)]
        center: [f64; 2],
        radius: f64,
    },
    /// (x - x0)² + (z - z0)² - R²
    CylinderY {
        #[serde(default)]
        center: [f64; 2],
        radius: f64,
    },
    /// (x - x0)² + (y - y0)² - R²
    CylinderZ {
        #[serde(default)]
        center: [f64; 2],
        radius: f64,
    },
    /// |r - c|² - R²
    Sphere {
        #[serde(default)]
        center: [f64; DIM],
        radius: f64,
    },
    /// Ax² + By² + Cz² + Dxy + Eyz + Fxz + Gx + Hy + Iz + J
    Quadric { coefficients: [f64; 10] },
}

impl SurfaceKind {
    /// Short kind label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceKind::PlaneX { .. } => "plane-x",
            SurfaceKind::PlaneY { .. } => "plane-y",
            SurfaceKind::PlaneZ { .. } => "plane-z",
            SurfaceKind::Plane { .. } => "plane",
            SurfaceKind::CylinderX { .. } => "cylinder-x",
            SurfaceKind::CylinderY { .. } => "cylinder-y",
            SurfaceKind::CylinderZ { .. } => "cylinder-z",
            SurfaceKind::Sphere { .. } => "sphere",
            SurfaceKind::Quadric { .. } => "quadric",
        }
    }

    fn validate(&self) -> Result<()> {
        let bad = |reason: &str| {
            Err(Error::InvalidSurface {
                kind: self.label(),
                reason: reason.to_string(),
            })
        };
        let finite = |xs: &[f64]| xs.iter().all(|x| x.is_finite());
        match self {
            SurfaceKind::PlaneX { x: v } | SurfaceKind::PlaneY { y: v } | SurfaceKind::PlaneZ { z: v } => {
                if !v.is_finite() {
                    return bad("position must be finite");
                }
            }
            SurfaceKind::Plane { a, b, c, d } => {
                if !finite(&[*a, *b, *c, *d]) {
                    return bad("coefficients must be finite");
                }
                if a * a + b * b + c * c <= 0.0 {
                    return bad("normal (A, B, C) must be non-zero");
                }
            }
            SurfaceKind::CylinderX { center, radius }
            | SurfaceKind::CylinderY { center, radius }
            | SurfaceKind::CylinderZ { center, radius } => {
                if !finite(center) {
                    return bad("center must be finite");
                }
                if !radius.is_finite() || *radius <= 0.0 {
                    return bad("radius must be finite and > 0");
                }
            }
            SurfaceKind::Sphere { center, radius } => {
                if !finite(center) {
                    return bad("center must be finite");
                }
                if !radius.is_finite() || *radius <= 0.0 {
                    return bad("radius must be finite and > 0");
                }
            }
            SurfaceKind::Quadric { coefficients } => {
                if !finite(coefficients) {
                    return bad("coefficients must be finite");
                }
                if coefficients.iter().all(|&c| c == 0.0) {
                    return bad("at least one coefficient must be non-zero");
                }
            }
        }
        Ok(())
    }

    /// Implicit value at base-frame point `q`.
    pub fn evaluate(&self, q: &[f64; DIM]) -> f64 {
        match *self {
            SurfaceKind::PlaneX { x } => q[0] - x,
            SurfaceKind::PlaneY { y } => q[1] - y,
            SurfaceKind::PlaneZ { z } => q[2] - z,
            SurfaceKind::Plane { a, b, c, d } => a * q[0] + b * q[1] + c * q[2] + d,
            SurfaceKind::CylinderX { center, radius } => {
                let (dy, dz) = (q[1] - center[0], q[2] - center[1]);
                dy * dy + dz * dz - radius * radius
            }
            SurfaceKind::CylinderY { center, radius } => {
                let (dx, dz) = (q[0] - center[0], q[2] - center[1]);
                dx * dx + dz * dz - radius * radius
            }
            SurfaceKind::CylinderZ { center, radius } => {
                let (dx, dy) = (q[0] - center[0], q[1] - center[1]);
                dx * dx + dy * dy - radius * radius
            }
            SurfaceKind::Sphere { center, radius } => {
                let d = sub(q, &center);
                dot(&d, &d) - radius * radius
            }
            SurfaceKind::Quadric { coefficients: k } => {
                let [x, y, z] = *q;
                k[0] * x * x
                    + k[1] * y * y
                    + k[2] * z * z
                    + k[3] * x * y
                    + k[4] * y * z
                    + k[5] * x * z
                    + k[6] * x
                    + k[7] * y
                    + k[8] * z
                    + k[9]
            }
        }
    }

    /// Gradient of the implicit function at `q` (points toward the positive side).
    pub fn gradient(&self, q: &[f64; DIM]) -> [f64; DIM] {
        match *self {
            SurfaceKind::PlaneX { .. } => [1.0, 0.0, 0.0],
            SurfaceKind::PlaneY { .. } => [0.0, 1.0, 0.0],
            SurfaceKind::PlaneZ { .. } => [0.0, 0.0, 1.0],
            SurfaceKind::Plane { a, b, c, .. } => [a, b, c],
            SurfaceKind::CylinderX { center, .. } => {
                [0.0, 2.0 * (q[1] - center[0]), 2.0 * (q[2] - center[1])]
            }
            SurfaceKind::CylinderY { center, .. } => {
                [2.0 * (q[0] - center[0]), 0.0, 2.0 * (q[2] - center[1])]
            }
            SurfaceKind::CylinderZ { center, .. } => {
                [2.0 * (q[0] - center[0]), 2.0 * (q[1] - center[1]), 0.0]
            }
            SurfaceKind::Sphere { center, .. } => {
                let d = sub(q, &center);
                [2.0 * d[0], 2.0 * d[1], 2.0 * d[2]]
            }
            SurfaceKind::Quadric { coefficients: k } => {
                let [x, y, z] = *q;
                [
                    2.0 * k[0] * x + k[3] * y + k[5] * z + k[6],
                    2.0 * k[1] * y + k[3] * x + k[4] * z + k[7],
                    2.0 * k[2] * z + k[4] * y + k[5] * x + k[8],
                ]
            }
        }
    }

    /// Coefficients `(a, b, c)` of `f(q + s w) = a s² + b s + c`.
    ///
    /// Exact for every kind since all are at most quadratic; `w` need not be unit length.
    fn along(&self, q: &[f64; DIM], w: &[f64; DIM]) -> (f64, f64, f64) {
        let c = self.evaluate(q);
        match *self {
            SurfaceKind::PlaneX { .. }
            | SurfaceKind::PlaneY { .. }
            | SurfaceKind::PlaneZ { .. }
            | SurfaceKind::Plane { .. } => (0.0, dot(&self.gradient(q), w), c),
            SurfaceKind::CylinderX { .. } => (w[1] * w[1] + w[2] * w[2], dot(&self.gradient(q), w), c),
            SurfaceKind::CylinderY { .. } => (w[0] * w[0] + w[2] * w[2], dot(&self.gradient(q), w), c),
            SurfaceKind::CylinderZ { .. } => (w[0] * w[0] + w[1] * w[1], dot(&self.gradient(q), w), c),
            SurfaceKind::Sphere { .. } => (dot(w, w), dot(&self.gradient(q), w), c),
            SurfaceKind::Quadric { coefficients: k } => {
                let a = k[0] * w[0] * w[0]
                    + k[1] * w[1] * w[1]
                    + k[2] * w[2] * w[2]
                    + k[3] * w[0] * w[1]
                    + k[4] * w[1] * w[2]
                    + k[5] * w[0] * w[2];
                (a, dot(&self.gradient(q), w), c)
            }
        }
    }

    /// Smallest root `s` of `f(q + s w) = 0` with `s_min < s <= s_max`.
    ///
    /// Tangent rays (two roots closer than `EPS_DIST` along the path) have no intersection.
    fn first_root(&self, q: &[f64; DIM], w: &[f64; DIM], s_min: f64, s_max: f64) -> Option<f64> {
        let (a, b, c) = self.along(q, w);
        let accept = |s: f64| (s > s_min && s <= s_max).then_some(s);

        if a == 0.0 {
            // Linear (planes, or rays along a cylinder's axis direction)
            if b.abs() < EPS_PARALLEL {
                return None;
            }
            return accept(-c / b);
        }

        let disc = b * b - 4.0 * a * c;
        if disc <= 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        if sqrt_disc <= EPS_DIST * a.abs() {
            return None;
        }
        // Stable quadratic roots
        let h = -0.5 * (b + b.signum() * sqrt_disc);
        let (x1, x2) = (h / a, c / h);
        let (r1, r2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        accept(r1).or_else(|| accept(r2))
    }

    /// Root of `f(q + s w) = 0` other than `s = 0`, for `q` on the surface.
    ///
    /// With `f(q) = 0` the path is `s (a s + b)`; planes have no other root and a
    /// grazing path (far root inside the dead zone) has none either.
    fn far_root(&self, q: &[f64; DIM], w: &[f64; DIM], s_max: f64) -> Option<f64> {
        let (a, b, _) = self.along(q, w);
        if a == 0.0 {
            return None;
        }
        let s = -b / a;
        (s > EPS_DIST && s <= s_max).then_some(s)
    }
}

/// Implicit surface with an optional boundary condition and motion schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    kind: SurfaceKind,
    boundary: BoundaryCondition,
    motion: Option<MotionSchedule>,
}

impl Surface {
    /// Create a static interior surface after validating its parameters.
    ///
    /// Errors: `Error::InvalidSurface` for non-finite values, non-positive radii, or a zero normal.
    pub fn new(kind: SurfaceKind) -> Result<Self> {
        kind.validate()?;
        Ok(Self {
            kind,
            boundary: BoundaryCondition::Interior,
            motion: None,
        })
    }

    /// Set the boundary condition.
    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundary = boundary;
        self
    }

    /// Attach a motion schedule.
    pub fn with_motion(mut self, motion: MotionSchedule) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    pub fn boundary(&self) -> BoundaryCondition {
        self.boundary
    }

    pub fn motion(&self) -> Option<&MotionSchedule> {
        self.motion.as_ref()
    }

    /// Point `r` expressed in the surface's base frame at time `t`.
    #[inline]
    fn base_frame(&self, r: &[f64; DIM], t: f64) -> [f64; DIM] {
        match &self.motion {
            Some(m) => sub(r, &m.displacement(t)),
            None => *r,
        }
    }

    /// Signed implicit value at `(r, t)`.
    pub fn evaluate(&self, r: &[f64; DIM], t: f64) -> f64 {
        self.kind.evaluate(&self.base_frame(r, t))
    }

    /// Half-space containing `(r, t)`.
    #[inline]
    pub fn sense(&self, r: &[f64; DIM], t: f64) -> Sense {
        Sense::of(self.evaluate(r, t))
    }

    /// Unit normal at `(r, t)`, pointing toward the positive side.
    pub fn normal(&self, r: &[f64; DIM], t: f64) -> [f64; DIM] {
        let g = self.kind.gradient(&self.base_frame(r, t));
        let norm = dot(&g, &g).sqrt();
        if norm > 0.0 {
            [g[0] / norm, g[1] / norm, g[2] / norm]
        } else {
            g
        }
    }

    /// Sense a particle at `r` on the surface is moving into.
    ///
    /// Uses the direction relative to the moving surface; a grazing path keeps the
    /// positive side, matching [`Sense::of`] at zero.
    pub fn entering_sense(&self, r: &[f64; DIM], u: &[f64; DIM], t: f64, speed: f64) -> Sense {
        let g = self.kind.gradient(&self.base_frame(r, t));
        let w = match &self.motion {
            Some(m) => add_scaled(u, &m.velocity(t), -1.0 / speed),
            None => *u,
        };
        Sense::of(dot(&g, &w))
    }

    /// Distance along `u` from `(r, t)` to the first crossing, for a particle flying at `speed`.
    ///
    /// Returns the smallest root beyond the `EPS_DIST` dead zone, or `None` when the path
    /// never crosses (including tangent grazes). For a moving surface the flight is split
    /// at every motion breakpoint; within each piece the surface translates at constant
    /// velocity, so the relative path is a straight line with direction `u - v / speed`.
    pub fn distance_to(&self, r: &[f64; DIM], u: &[f64; DIM], t: f64, speed: f64) -> Option<f64> {
        self.next_crossing(r, u, t, speed, false)
    }

    /// Like [`Surface::distance_to`] for a particle known to sit on this surface.
    ///
    /// The implicit value at the start is taken as exactly zero, so the departure root
    /// is dropped however far round-off has pushed `r` off the surface. Only a second
    /// crossing of a curved surface, or a later crossing of a moving one, remains.
    pub fn distance_leaving(
        &self,
        r: &[f64; DIM],
        u: &[f64; DIM],
        t: f64,
        speed: f64,
    ) -> Option<f64> {
        self.next_crossing(r, u, t, speed, true)
    }

    fn next_crossing(
        &self,
        r: &[f64; DIM],
        u: &[f64; DIM],
        t: f64,
        speed: f64,
        on_surface: bool,
    ) -> Option<f64> {
        let Some(motion) = &self.motion else {
            return if on_surface {
                self.kind.far_root(r, u, f64::INFINITY)
            } else {
                self.kind.first_root(r, u, EPS_DIST, f64::INFINITY)
            };
        };

        let mut travelled = 0.0;
        let mut r_now = *r;
        let mut t_now = t;
        loop {
            let piece = motion.piece(t_now);
            let q = sub(&r_now, &piece.displacement);
            let w = add_scaled(u, &piece.velocity, -1.0 / speed);
            let s_max = if piece.end.is_finite() {
                (piece.end - t_now) * speed
            } else {
                f64::INFINITY
            };
            let root = if travelled > 0.0 {
                self.kind.first_root(&q, &w, 0.0, s_max)
            } else if on_surface {
                self.kind.far_root(&q, &w, s_max)
            } else {
                self.kind.first_root(&q, &w, EPS_DIST, s_max)
            };
            if let Some(s) = root {
                return Some(travelled + s);
            }
            if !piece.end.is_finite() {
                return None;
            }
            travelled += s_max;
            r_now = add_scaled(&r_now, u, s_max);
            t_now = piece.end;
        }
    }
}
