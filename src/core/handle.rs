//! Integer handles into the geometry arena.
//!
//! Entities reference each other by index, never by ownership, so a universe
//! reused by hundreds of lattice elements is stored once.

use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the entity in its arena table.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " {}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a [`Surface`](crate::core::Surface).
    SurfaceId,
    "surface"
);
handle!(
    /// Handle of a [`Cell`](crate::core::Cell).
    CellId,
    "cell"
);
handle!(
    /// Handle of a [`Universe`](crate::core::Universe).
    UniverseId,
    "universe"
);
handle!(
    /// Handle of a [`Lattice`](crate::core::Lattice).
    LatticeId,
    "lattice"
);
handle!(
    /// Opaque material reference owned by the caller (cross-section lookup key).
    MaterialId,
    "material"
);
