//! Geometry arena and resolver.
//!
//! Surfaces, cells, universes and lattices live in flat tables addressed by handle.
//! A [`Geometry`] is validated once by [`GeometryBuilder::build`] and is read-only
//! afterwards, so any number of tracking threads can share it.

use crate::core::census::Census;
use crate::core::cell::{Cell, Fill};
use crate::core::event::{Event, EventKind};
use crate::core::handle::{CellId, LatticeId, MaterialId, SurfaceId, UniverseId};
use crate::core::lattice::Lattice;
use crate::core::particle::{add_scaled, reflect, Particle, DIM};
use crate::core::region::Region;
use crate::core::surface::{BoundaryCondition, Sense, Surface};
use crate::core::universe::Universe;
use crate::error::{Error, Result};
use tracing::{debug, trace, warn};

/// How a universe was entered through a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeElement {
    pub lattice: LatticeId,
    /// `[ix, iy, iz]`
    pub index: [usize; DIM],
}

/// One frame of a resolved location: the cell found in `universe` at `local`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub universe: UniverseId,
    pub cell: CellId,
    /// Query point in `universe`'s frame.
    pub local: [f64; DIM],
    /// Set when `universe` fills a lattice element.
    pub element: Option<LatticeElement>,
}

/// Result of point location: the stack of frames from the root down to the
/// material-filled cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    levels: Vec<Level>,
    cell: CellId,
    material: MaterialId,
    /// Surface the point sits on after a crossing.
    contact: Option<Contact>,
}

impl Location {
    /// Innermost (material-filled) cell.
    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Frames from the root universe (index 0) to the innermost cell.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Whether `cell` appears at any level.
    pub fn passes_through(&self, cell: CellId) -> bool {
        self.levels.iter().any(|l| l.cell == cell)
    }

    /// Surface the location was entered through and the side entered, if any.
    pub fn on_surface(&self) -> Option<(SurfaceId, Sense)> {
        self.contact.map(|c| (c.surface, c.sense))
    }

    fn touches(&self, level: usize, surface: SurfaceId) -> bool {
        self.contact
            .is_some_and(|c| c.surface == surface && (c.first..=c.last).contains(&level))
    }
}

/// What ends a flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryKind {
    /// Crossing of a surface bounding the cell at `level`.
    Surface {
        surface: SurfaceId,
        level: usize,
        condition: BoundaryCondition,
    },
    /// Exit from the lattice element holding the universe at `level`.
    LatticeEdge { lattice: LatticeId, level: usize },
    /// A census time is reached before any spatial boundary.
    Census { time: f64 },
    /// Nothing ahead; the cell extends to infinity along the flight.
    Unbounded,
}

/// Answer to a distance-to-boundary query.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Path length to the event (`+inf` for [`BoundaryKind::Unbounded`]).
    pub distance: f64,
    pub kind: BoundaryKind,
    /// Direction of flight after the event (specular reflection on reflective surfaces).
    pub direction: [f64; DIM],
    /// Location on the far side; `None` on escape through a vacuum surface or when unbounded.
    pub next: Option<Location>,
}

impl Boundary {
    /// Crossed surface, if the event is a surface crossing.
    pub fn surface(&self) -> Option<SurfaceId> {
        match self.kind {
            BoundaryKind::Surface { surface, .. } => Some(surface),
            _ => None,
        }
    }

    /// Whether the history leaves the geometry through a vacuum surface.
    pub fn escapes(&self) -> bool {
        matches!(
            self.kind,
            BoundaryKind::Surface {
                condition: BoundaryCondition::Vacuum,
                ..
            }
        )
    }
}

/// Sense forced on the surface just crossed, at the level it bounds.
#[derive(Debug, Clone, Copy)]
struct SurfaceHint {
    level: usize,
    surface: SurfaceId,
    sense: Sense,
}

/// A crossed surface and the run of levels `first..=last` that share its frame.
///
/// Nested universes entered without a translation or a lattice see the surface at
/// the same place, so the forced sense holds for them too.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Contact {
    surface: SurfaceId,
    sense: Sense,
    first: usize,
    last: usize,
}

/// Incremental construction of a [`Geometry`]. Handles are assigned in insertion
/// order; references are only checked by [`GeometryBuilder::build`], so entities may
/// refer to each other in any order.
#[derive(Debug, Default, Clone)]
pub struct GeometryBuilder {
    surfaces: Vec<Surface>,
    cells: Vec<Cell>,
    universes: Vec<Universe>,
    lattices: Vec<Lattice>,
    root: Option<UniverseId>,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_surface(&mut self, surface: Surface) -> SurfaceId {
        self.surfaces.push(surface);
        SurfaceId(self.surfaces.len() as u32 - 1)
    }

    pub fn add_cell(&mut self, region: Region, fill: Fill) -> Result<CellId> {
        self.add_translated_cell(region, fill, None)
    }

    /// Cell whose child frame is offset by `translation` (universe or lattice fills only).
    pub fn add_translated_cell(
        &mut self,
        region: Region,
        fill: Fill,
        translation: Option<[f64; DIM]>,
    ) -> Result<CellId> {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(Cell::new(id, region, fill, translation)?);
        Ok(id)
    }

    pub fn add_universe(&mut self, cells: Vec<CellId>) -> UniverseId {
        let id = UniverseId(self.universes.len() as u32);
        self.universes.push(Universe::new(id, cells));
        id
    }

    pub fn add_lattice(&mut self, lattice: Lattice) -> LatticeId {
        self.lattices.push(lattice);
        LatticeId(self.lattices.len() as u32 - 1)
    }

    /// Make a new universe from `cells` the root.
    pub fn set_root(&mut self, cells: Vec<CellId>) -> UniverseId {
        let id = self.add_universe(cells);
        self.root = Some(id);
        id
    }

    pub fn set_root_universe(&mut self, universe: UniverseId) {
        self.root = Some(universe);
    }

    /// Validate every reference and freeze the geometry.
    ///
    /// Without an explicit root, the root universe holds every cell that no universe
    /// lists.
    ///
    /// Errors: unknown handles, `TranslationOnMaterial` (already caught when the cell
    /// was added), `CyclicGeometry` when a universe contains itself, `EmptyRoot`.
    pub fn build(mut self) -> Result<Geometry> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let mut listed = vec![false; self.cells.len()];
                for universe in &self.universes {
                    for c in universe.cells() {
                        if let Some(flag) = listed.get_mut(c.index()) {
                            *flag = true;
                        }
                    }
                }
                let free: Vec<CellId> = self
                    .cells
                    .iter()
                    .map(Cell::id)
                    .filter(|c| !listed[c.index()])
                    .collect();
                if free.is_empty() {
                    return Err(Error::EmptyRoot);
                }
                self.add_universe(free)
            }
        };

        let mut geometry = Geometry {
            surfaces: self.surfaces,
            cells: self.cells,
            universes: self.universes,
            lattices: self.lattices,
            root,
            max_depth: 0,
        };
        geometry.validate()?;
        geometry.max_depth = geometry.nesting_depth()?;

        debug!(
            surfaces = geometry.surfaces.len(),
            cells = geometry.cells.len(),
            universes = geometry.universes.len(),
            lattices = geometry.lattices.len(),
            root = %geometry.root,
            max_depth = geometry.max_depth,
            "geometry built"
        );
        Ok(geometry)
    }
}

/// Validated, immutable CSG geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    surfaces: Vec<Surface>,
    cells: Vec<Cell>,
    universes: Vec<Universe>,
    lattices: Vec<Lattice>,
    root: UniverseId,
    max_depth: usize,
}

#[derive(Clone, Copy)]
enum Mark {
    Unvisited,
    Active,
    Done(usize),
}

impl Geometry {
    pub fn builder() -> GeometryBuilder {
        GeometryBuilder::new()
    }

    pub fn root(&self) -> UniverseId {
        self.root
    }

    /// Largest number of levels any location can have.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn universes(&self) -> &[Universe] {
        &self.universes
    }

    pub fn lattices(&self) -> &[Lattice] {
        &self.lattices
    }

    pub fn surface(&self, id: SurfaceId) -> Result<&Surface> {
        self.surfaces.get(id.index()).ok_or(Error::UnknownSurface(id))
    }

    pub fn cell(&self, id: CellId) -> Result<&Cell> {
        self.cells.get(id.index()).ok_or(Error::UnknownCell(id))
    }

    pub fn universe(&self, id: UniverseId) -> Result<&Universe> {
        self.universes.get(id.index()).ok_or(Error::UnknownUniverse(id))
    }

    pub fn lattice(&self, id: LatticeId) -> Result<&Lattice> {
        self.lattices.get(id.index()).ok_or(Error::UnknownLattice(id))
    }

    fn validate(&self) -> Result<()> {
        for cell in &self.cells {
            cell.region().validate(self.surfaces.len())?;
            match cell.fill() {
                Fill::Material(_) => {}
                Fill::Universe(u) => {
                    self.universe(u)?;
                }
                Fill::Lattice(l) => {
                    self.lattice(l)?;
                }
            }
        }
        for universe in &self.universes {
            for &c in universe.cells() {
                self.cell(c)?;
            }
        }
        for lattice in &self.lattices {
            for &u in lattice.universes() {
                self.universe(u)?;
            }
        }
        if self.universe(self.root)?.cells().is_empty() {
            return Err(Error::EmptyRoot);
        }
        Ok(())
    }

    /// Depth of the root universe; rejects any universe that reaches itself.
    fn nesting_depth(&self) -> Result<usize> {
        let mut marks = vec![Mark::Unvisited; self.universes.len()];
        for k in 0..self.universes.len() {
            self.visit(UniverseId(k as u32), &mut marks)?;
        }
        match marks.get(self.root.index()) {
            Some(Mark::Done(depth)) => Ok(*depth),
            _ => Err(Error::UnknownUniverse(self.root)),
        }
    }

    fn visit(&self, id: UniverseId, marks: &mut [Mark]) -> Result<usize> {
        match marks[id.index()] {
            Mark::Done(depth) => return Ok(depth),
            Mark::Active => return Err(Error::CyclicGeometry(id)),
            Mark::Unvisited => {}
        }
        marks[id.index()] = Mark::Active;
        let mut deepest = 0;
        for &c in self.universe(id)?.cells() {
            match self.cell(c)?.fill() {
                Fill::Material(_) => {}
                Fill::Universe(child) => deepest = deepest.max(self.visit(child, marks)?),
                Fill::Lattice(l) => {
                    for &child in self.lattice(l)?.universes() {
                        deepest = deepest.max(self.visit(child, marks)?);
                    }
                }
            }
        }
        marks[id.index()] = Mark::Done(deepest + 1);
        Ok(deepest + 1)
    }

    /// Cell and material containing `r` at time `t`.
    ///
    /// Errors: `LostParticle` when a universe has no cell at the point,
    /// `OutsideLattice` when the point falls outside a lattice's extent.
    pub fn locate(&self, r: &[f64; DIM], t: f64) -> Result<Location> {
        self.resolve(r, t, None, None)
    }

    /// Material at `r` and time `t`.
    pub fn material_at(&self, r: &[f64; DIM], t: f64) -> Result<MaterialId> {
        Ok(self.locate(r, t)?.material())
    }

    /// Depth-first descent from the root.
    ///
    /// `direction` settles lattice grid-line ties in favor of the element ahead;
    /// `hint` pins the sense of the surface just crossed at its level.
    fn resolve(
        &self,
        r: &[f64; DIM],
        t: f64,
        direction: Option<&[f64; DIM]>,
        hint: Option<SurfaceHint>,
    ) -> Result<Location> {
        let mut levels = Vec::with_capacity(self.max_depth);
        let mut universe = self.root;
        let mut local = *r;
        let mut element = None;
        let mut contact: Option<Contact> = None;
        loop {
            let depth = levels.len();
            if let Some(h) = hint.filter(|h| h.level == depth) {
                contact = Some(Contact {
                    surface: h.surface,
                    sense: h.sense,
                    first: depth,
                    last: depth,
                });
            }
            let on_surface = contact
                .filter(|c| c.last == depth)
                .map(|c| (c.surface, c.sense));
            let cell = self
                .universe(universe)?
                .find(&self.cells, &self.surfaces, &local, t, on_surface)
                .ok_or(Error::LostParticle {
                    universe,
                    position: *r,
                    time: t,
                })?;
            levels.push(Level {
                universe,
                cell: cell.id(),
                local,
                element,
            });

            let child = cell.to_child(&local);
            match cell.fill() {
                Fill::Material(material) => {
                    return Ok(Location {
                        levels,
                        cell: cell.id(),
                        material,
                        contact,
                    });
                }
                Fill::Universe(next) => {
                    if cell.translation().is_none() {
                        if let Some(c) = contact.as_mut().filter(|c| c.last == depth) {
                            c.last = depth + 1;
                        }
                    }
                    universe = next;
                    local = child;
                    element = None;
                }
                Fill::Lattice(lattice) => {
                    let hit = self
                        .lattice(lattice)?
                        .element_along(&child, direction)
                        .map_err(|e| Error::OutsideLattice {
                            lattice,
                            index: e.index,
                            position: *r,
                            time: t,
                        })?;
                    universe = hit.universe;
                    local = hit.local;
                    element = Some(LatticeElement {
                        lattice,
                        index: hit.index,
                    });
                }
            }
        }
    }

    /// Locate the particle, then find the first boundary along its flight.
    ///
    /// See [`Geometry::distance_to_boundary_from`].
    pub fn distance_to_boundary(
        &self,
        particle: &Particle,
        census: Option<&Census>,
    ) -> Result<Boundary> {
        let location = self.resolve(&particle.r, particle.time, Some(&particle.u), None)?;
        self.distance_to_boundary_from(&location, particle, census)
    }

    /// First boundary along the particle's flight from a known `location`.
    ///
    /// Candidates are the surfaces of the cell at every level (each in its own frame),
    /// the edges of every lattice element on the way down, and the next `census` time
    /// after the particle's clock. The nearest wins; coincident candidates are ordered by
    /// [`Event::precedes`], so a spatial boundary beats a census at the same distance.
    /// The returned boundary already carries the location on the far side.
    ///
    /// Pass the `next` location of the previous boundary here after a crossing: the
    /// particle sits on a surface and a fresh [`Geometry::locate`] could land on either side.
    /// The surface it sits on contributes only a genuine second crossing, never the one
    /// just made, even when round-off left the particle slightly behind it.
    pub fn distance_to_boundary_from(
        &self,
        location: &Location,
        particle: &Particle,
        census: Option<&Census>,
    ) -> Result<Boundary> {
        let u = &particle.u;
        let mut candidates = Vec::new();
        for (level, frame) in location.levels.iter().enumerate() {
            for &id in self.cell(frame.cell)?.surfaces() {
                let surface = self.surface(id)?;
                let d = if location.touches(level, id) {
                    surface.distance_leaving(&frame.local, u, particle.time, particle.speed)
                } else {
                    surface.distance_to(&frame.local, u, particle.time, particle.speed)
                };
                if let Some(d) = d {
                    candidates.push(Event::new(d, EventKind::Surface { level, surface: id })?);
                }
            }
            if let Some(element) = frame.element {
                let lattice = self.lattice(element.lattice)?;
                if let Some(d) = lattice.distance_to_edge(&frame.local, u) {
                    candidates.push(Event::new(
                        d,
                        EventKind::LatticeEdge {
                            level,
                            lattice: element.lattice,
                        },
                    )?);
                }
            }
        }
        if let Some(tc) = census.and_then(|c| c.next_after(particle.time)) {
            candidates.push(Event::census((tc - particle.time) * particle.speed, tc)?);
        }

        let Some(event) = Event::earliest(candidates) else {
            trace!(cell = %location.cell, "no boundary ahead");
            return Ok(Boundary {
                distance: f64::INFINITY,
                kind: BoundaryKind::Unbounded,
                direction: *u,
                next: None,
            });
        };
        trace!(
            cell = %location.cell,
            distance = event.distance_f64(),
            kind = ?event.kind,
            "boundary event selected"
        );
        self.cross(location, particle, event)
    }

    /// Apply `event` and resolve the location beyond it.
    fn cross(&self, location: &Location, particle: &Particle, event: Event) -> Result<Boundary> {
        let distance = event.distance_f64();
        let u = particle.u;
        let hit = add_scaled(&particle.r, &u, distance);
        let t_hit = particle.time + distance / particle.speed;

        let (kind, direction, next) = match event.kind {
            EventKind::Surface { level, surface } => {
                let s = self.surface(surface)?;
                let frame = location
                    .levels
                    .get(level)
                    .ok_or_else(|| Error::InvalidParam(format!("no level {level} in location")))?;
                let local_hit = add_scaled(&frame.local, &u, distance);
                let condition = s.boundary();
                let kind = BoundaryKind::Surface {
                    surface,
                    level,
                    condition,
                };
                match condition {
                    BoundaryCondition::Vacuum => (kind, u, None),
                    BoundaryCondition::Reflective => {
                        let reflected = reflect(&u, &s.normal(&local_hit, t_hit));
                        let hint = SurfaceHint {
                            level,
                            surface,
                            sense: s.entering_sense(&local_hit, &reflected, t_hit, particle.speed),
                        };
                        let next = self.relocate(&hit, t_hit, &reflected, hint)?;
                        (kind, reflected, Some(next))
                    }
                    BoundaryCondition::Interior => {
                        let hint = SurfaceHint {
                            level,
                            surface,
                            sense: s.entering_sense(&local_hit, &u, t_hit, particle.speed),
                        };
                        let next = self.relocate(&hit, t_hit, &u, hint)?;
                        (kind, u, Some(next))
                    }
                }
            }
            EventKind::LatticeEdge { level, lattice } => {
                let next = self.relocate_along(&hit, t_hit, &u)?;
                (BoundaryKind::LatticeEdge { lattice, level }, u, Some(next))
            }
            EventKind::Census { time } => {
                let time = time.into_inner();
                let next = self.relocate_along(&hit, time, &u)?;
                (BoundaryKind::Census { time }, u, Some(next))
            }
        };
        Ok(Boundary {
            distance,
            kind,
            direction,
            next,
        })
    }

    fn relocate(
        &self,
        r: &[f64; DIM],
        t: f64,
        u: &[f64; DIM],
        hint: SurfaceHint,
    ) -> Result<Location> {
        self.resolve(r, t, Some(u), Some(hint))
            .inspect_err(|e| warn!(position = ?r, time = t, error = %e, "re-location after crossing failed"))
    }

    fn relocate_along(&self, r: &[f64; DIM], t: f64, u: &[f64; DIM]) -> Result<Location> {
        self.resolve(r, t, Some(u), None)
            .inspect_err(|e| warn!(position = ?r, time = t, error = %e, "re-location after crossing failed"))
    }
}
