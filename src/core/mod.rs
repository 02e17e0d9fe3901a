//! Geometry kernel: implicit surfaces, boolean regions, cells, universes, lattices,
//! surface motion, and the resolver that answers point-location and
//! distance-to-boundary queries.
//!
//! Everything here is immutable once a [`Geometry`] is built; queries take `&self`
//! and keep their scratch state on the caller's side.

pub mod census;
pub mod cell;
pub mod event;
pub mod geometry;
pub mod handle;
pub mod lattice;
pub mod motion;
pub mod particle;
pub mod region;
pub mod surface;
pub mod universe;

pub use census::Census;
pub use cell::{Cell, Fill};
pub use event::{Event, EventKind};
pub use geometry::{
    Boundary, BoundaryKind, Geometry, GeometryBuilder, LatticeElement, Level, Location,
};
pub use handle::{CellId, LatticeId, MaterialId, SurfaceId, UniverseId};
pub use lattice::{Lattice, LatticeAxis, LatticeHit};
pub use motion::MotionSchedule;
pub use particle::{Particle, DIM};
pub use region::Region;
pub use surface::{BoundaryCondition, Sense, Surface, SurfaceKind};

/// Dead zone for ray/surface roots: intersections closer than this are the surface
/// the particle is sitting on.
pub const EPS_DIST: f64 = 1e-10;

/// Two boundary events closer than this are coincident and ordered by kind.
pub const EPS_COINCIDENT: f64 = 1e-9;

/// Round-off allowance per unit of coordinate magnitude.
pub const EPS_REL: f64 = 1e-13;

/// Absolute tolerance `eps`, widened to cover round-off in coordinates of size `magnitude`.
#[inline]
pub fn widen(eps: f64, magnitude: f64) -> f64 {
    eps.max(EPS_REL * magnitude.abs())
}
