use crate::core::handle::{CellId, LatticeId, MaterialId, SurfaceId, UniverseId};
use crate::core::particle::{sub, DIM};
use crate::core::region::Region;
use crate::error::{Error, Result};

/// What occupies a cell's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Terminal: the point resolves to this material.
    Material(MaterialId),
    /// Descend into a nested universe.
    Universe(UniverseId),
    /// Descend into the lattice element under the point.
    Lattice(LatticeId),
}

/// A region paired with its fill.
///
/// The region is tested in the parent universe's frame; the translation only moves
/// coordinates into the child frame before descending.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: CellId,
    region: Region,
    fill: Fill,
    translation: Option<[f64; DIM]>,
    /// Surfaces of `region`, cached for boundary searches.
    surfaces: Vec<SurfaceId>,
}

impl Cell {
    /// Create a cell. A translation is only allowed on universe or lattice fills.
    pub fn new(
        id: CellId,
        region: Region,
        fill: Fill,
        translation: Option<[f64; DIM]>,
    ) -> Result<Self> {
        if let Some(t) = translation {
            if matches!(fill, Fill::Material(_)) {
                return Err(Error::TranslationOnMaterial(id));
            }
            if !t.iter().all(|x| x.is_finite()) {
                return Err(Error::InvalidParam(format!(
                    "translation of {id} must be finite"
                )));
            }
        }
        let surfaces = region.surfaces();
        Ok(Self {
            id,
            region,
            fill,
            translation,
            surfaces,
        })
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn fill(&self) -> Fill {
        self.fill
    }

    pub fn translation(&self) -> Option<[f64; DIM]> {
        self.translation
    }

    /// Surfaces bounding this cell.
    pub fn surfaces(&self) -> &[SurfaceId] {
        &self.surfaces
    }

    /// Parent-frame coordinates moved into the fill's frame.
    #[inline]
    pub fn to_child(&self, r: &[f64; DIM]) -> [f64; DIM] {
        match &self.translation {
            Some(t) => sub(r, t),
            None => *r,
        }
    }
}
