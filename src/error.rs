use crate::core::{CellId, LatticeId, SurfaceId, UniverseId};
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for geometry construction and point/ray queries.
///
/// Construction-time variants are reported before any particle is tracked.
/// `LostParticle` and `OutsideLattice` are runtime resolution failures and carry
/// the global position and time of the failed query.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Malformed surface parameters (negative radius, zero normal, non-finite value).
    #[error("invalid {kind} surface: {reason}")]
    InvalidSurface { kind: &'static str, reason: String },

    /// Malformed motion schedule.
    #[error("invalid motion schedule: {0}")]
    InvalidMotion(String),

    /// Malformed lattice grid or universe array.
    #[error("invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("unknown {0}")]
    UnknownSurface(SurfaceId),

    #[error("unknown {0}")]
    UnknownCell(CellId),

    #[error("unknown {0}")]
    UnknownUniverse(UniverseId),

    #[error("unknown {0}")]
    UnknownLattice(LatticeId),

    /// A translation was attached to a cell filled with a material.
    #[error("{0} is filled with a material and cannot carry a translation")]
    TranslationOnMaterial(CellId),

    /// A universe contains itself through cell or lattice fills.
    #[error("{0} contains itself through its fills")]
    CyclicGeometry(UniverseId),

    /// The root universe would have no cells.
    #[error("root universe has no cells")]
    EmptyRoot,

    /// A deck refers to a name that was never declared.
    #[error("unknown {kind} name '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// A deck declares the same name twice.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// No cell of a universe contains the point (gap in the geometry).
    #[error("lost particle: no cell of {universe} contains position {position:?} at time {time}")]
    LostParticle {
        universe: UniverseId,
        position: [f64; 3],
        time: f64,
    },

    /// Lattice element index outside the declared extent.
    #[error("position {position:?} at time {time} falls outside {lattice} (element {index:?})")]
    OutsideLattice {
        lattice: LatticeId,
        index: [i64; 3],
        position: [f64; 3],
        time: f64,
    },

    /// Propagated I/O errors (reading geometry decks).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed geometry deck.
    #[error("geometry deck: {0}")]
    Deck(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a runtime resolution failure (the history is lost)
    /// rather than a construction-time defect.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::LostParticle { .. } | Error::OutsideLattice { .. })
    }
}
