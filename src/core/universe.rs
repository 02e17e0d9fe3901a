use crate::core::cell::Cell;
use crate::core::handle::{CellId, SurfaceId, UniverseId};
use crate::core::particle::DIM;
use crate::core::region::SenseMemo;
use crate::core::surface::{Sense, Surface};

/// Ordered collection of cells sharing one local frame.
///
/// Cells are tried in declaration order and the first match wins, so overlapping
/// regions are resolved by order rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    id: UniverseId,
    cells: Vec<CellId>,
}

impl Universe {
    pub fn new(id: UniverseId, cells: Vec<CellId>) -> Self {
        Self { id, cells }
    }

    pub fn id(&self) -> UniverseId {
        self.id
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// First cell containing `local` at time `t`, with the point moved into that cell's
    /// child frame. `None` means the universe has a gap at this point.
    pub fn locate(
        &self,
        cells: &[Cell],
        surfaces: &[Surface],
        local: &[f64; DIM],
        t: f64,
    ) -> Option<(CellId, [f64; DIM])> {
        self.find(cells, surfaces, local, t, None)
            .map(|c| (c.id(), c.to_child(local)))
    }

    /// First matching cell; `on_surface` forces the sense of a surface the point lies on.
    pub(crate) fn find<'g>(
        &self,
        cells: &'g [Cell],
        surfaces: &[Surface],
        local: &[f64; DIM],
        t: f64,
        on_surface: Option<(SurfaceId, Sense)>,
    ) -> Option<&'g Cell> {
        // One memo for all siblings: they share the frame and the point.
        let mut memo = match on_surface {
            Some((s, sense)) => SenseMemo::seeded(s, sense),
            None => SenseMemo::default(),
        };
        self.cells
            .iter()
            .filter_map(|id| cells.get(id.index()))
            .find(|c| c.region().contains_with(surfaces, local, t, &mut memo))
    }
}
