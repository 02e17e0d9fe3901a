//! Constructive solid geometry kernel for Monte Carlo particle transport.
//!
//! Build a [`core::Geometry`] from surfaces, cells, universes and lattices (directly
//! through [`core::GeometryBuilder`] or from a JSON [`deck::GeometryDeck`]), then ask it
//! where a point is and how far a particle can fly before something changes.
//!
//! With the `python` feature the crate also builds the `mcgeom` extension module.

pub mod core;
pub mod deck;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use crate::core::{Boundary, BoundaryKind, Geometry, GeometryBuilder, Location, Particle};
pub use crate::deck::{GeometryDeck, Names};
pub use crate::error::{Error, Result};
