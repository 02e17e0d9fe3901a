//! Named, serde-deserializable geometry description.
//!
//! A deck refers to entities by name; [`GeometryDeck::build`] resolves the names to
//! handles, validates the graph and returns the frozen [`Geometry`] together with the
//! [`Names`] needed to report results back in deck terms.
//!
//! ```json
//! {
//!   "surfaces": [
//!     { "name": "left",  "type": "plane_x", "x": -1.0, "boundary_condition": "vacuum" },
//!     { "name": "right", "type": "plane_x", "x":  1.0, "boundary_condition": "vacuum" },
//!     { "name": "rod",   "type": "plane_z", "z":  0.0,
//!       "motion": { "velocities": [[0, 0, 1]], "durations": [2.0] } }
//!   ],
//!   "cells": [
//!     { "name": "slab", "region": { "and": [ { "positive": "left" }, { "negative": "right" } ] },
//!       "fill": { "material": 1 } }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::core::{
    BoundaryCondition, CellId, Fill, Geometry, GeometryBuilder, Lattice, LatticeAxis, LatticeId,
    MaterialId, MotionSchedule, Region, Surface, SurfaceId, SurfaceKind, UniverseId, DIM,
};
use crate::error::{Error, Result};

/// Whole geometry deck.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeometryDeck {
    #[serde(default)]
    pub surfaces: Vec<SurfaceCard>,
    #[serde(default)]
    pub cells: Vec<CellCard>,
    #[serde(default)]
    pub universes: Vec<UniverseCard>,
    #[serde(default)]
    pub lattices: Vec<LatticeCard>,
    /// Cells of the root universe; every cell no universe lists when omitted.
    #[serde(default)]
    pub root: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceCard {
    pub name: String,
    #[serde(flatten)]
    pub kind: SurfaceKind,
    #[serde(default)]
    pub boundary_condition: BoundaryCondition,
    #[serde(default)]
    pub motion: Option<MotionCard>,
}

/// `move(velocities, durations)` starting at `start_time`.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionCard {
    #[serde(default)]
    pub start_time: f64,
    pub velocities: Vec<[f64; DIM]>,
    pub durations: Vec<f64>,
}

/// Region tree over surface names.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionCard {
    #[default]
    Everywhere,
    Positive(String),
    Negative(String),
    And(Vec<RegionCard>),
    Or(Vec<RegionCard>),
    Not(Box<RegionCard>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillCard {
    Material(u32),
    Universe(String),
    Lattice(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CellCard {
    pub name: String,
    #[serde(default)]
    pub region: RegionCard,
    pub fill: FillCard,
    #[serde(default)]
    pub translation: Option<[f64; DIM]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniverseCard {
    pub name: String,
    pub cells: Vec<String>,
}

/// Lattice with per-axis `[origin, pitch, count]`; omitted axes are unbounded.
#[derive(Debug, Clone, Deserialize)]
pub struct LatticeCard {
    pub name: String,
    #[serde(default)]
    pub x: Option<(f64, f64, usize)>,
    #[serde(default)]
    pub y: Option<(f64, f64, usize)>,
    #[serde(default)]
    pub z: Option<(f64, f64, usize)>,
    pub universes: LatticeFillCard,
}

/// One universe everywhere, rows (first row at the largest y), or layers of rows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LatticeFillCard {
    Uniform(String),
    Rows(Vec<Vec<String>>),
    Layers(Vec<Vec<Vec<String>>>),
}

/// Name lookup for one entity table; handles are positions in declaration order.
#[derive(Debug, Clone, Default)]
struct NameTable {
    kind: &'static str,
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl NameTable {
    fn new<'a, I>(kind: &'static str, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut table = Self {
            kind,
            ..Self::default()
        };
        for name in names {
            table.push(name)?;
        }
        Ok(table)
    }

    fn push(&mut self, name: &str) -> Result<u32> {
        let id = self.names.len() as u32;
        if self.index.insert(name.to_owned(), id).is_some() {
            return Err(Error::DuplicateName {
                kind: self.kind,
                name: name.to_owned(),
            });
        }
        self.names.push(name.to_owned());
        Ok(id)
    }

    fn get(&self, name: &str) -> Result<u32> {
        self.index.get(name).copied().ok_or_else(|| Error::UnknownName {
            kind: self.kind,
            name: name.to_owned(),
        })
    }

    fn name(&self, k: usize) -> Option<&str> {
        self.names.get(k).map(String::as_str)
    }
}

/// Name <-> handle maps produced by [`GeometryDeck::build`].
#[derive(Debug, Clone, Default)]
pub struct Names {
    surfaces: NameTable,
    cells: NameTable,
    universes: NameTable,
    lattices: NameTable,
}

impl Names {
    pub fn surface(&self, name: &str) -> Result<SurfaceId> {
        self.surfaces.get(name).map(SurfaceId)
    }

    pub fn cell(&self, name: &str) -> Result<CellId> {
        self.cells.get(name).map(CellId)
    }

    pub fn universe(&self, name: &str) -> Result<UniverseId> {
        self.universes.get(name).map(UniverseId)
    }

    pub fn lattice(&self, name: &str) -> Result<LatticeId> {
        self.lattices.get(name).map(LatticeId)
    }

    pub fn surface_name(&self, id: SurfaceId) -> Option<&str> {
        self.surfaces.name(id.index())
    }

    pub fn cell_name(&self, id: CellId) -> Option<&str> {
        self.cells.name(id.index())
    }

    /// `None` for the implicit root universe.
    pub fn universe_name(&self, id: UniverseId) -> Option<&str> {
        self.universes.name(id.index())
    }

    pub fn lattice_name(&self, id: LatticeId) -> Option<&str> {
        self.lattices.name(id.index())
    }
}

impl GeometryDeck {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading geometry deck");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Resolve names, validate, and freeze the geometry.
    ///
    /// Errors: `DuplicateName`/`UnknownName` for naming problems, otherwise whatever
    /// [`GeometryBuilder::build`] or the entity constructors report.
    pub fn build(&self) -> Result<(Geometry, Names)> {
        let names = Names {
            surfaces: NameTable::new("surface", self.surfaces.iter().map(|s| s.name.as_str()))?,
            cells: NameTable::new("cell", self.cells.iter().map(|c| c.name.as_str()))?,
            universes: NameTable::new("universe", self.universes.iter().map(|u| u.name.as_str()))?,
            lattices: NameTable::new("lattice", self.lattices.iter().map(|l| l.name.as_str()))?,
        };

        let mut b = GeometryBuilder::new();
        for card in &self.surfaces {
            b.add_surface(card.to_surface()?);
        }
        for card in &self.cells {
            let region = card.region.resolve(&names)?;
            let fill = match &card.fill {
                FillCard::Material(m) => Fill::Material(MaterialId(*m)),
                FillCard::Universe(u) => Fill::Universe(names.universe(u)?),
                FillCard::Lattice(l) => Fill::Lattice(names.lattice(l)?),
            };
            b.add_translated_cell(region, fill, card.translation)?;
        }
        for card in &self.universes {
            let cells = card
                .cells
                .iter()
                .map(|c| names.cell(c))
                .collect::<Result<Vec<_>>>()?;
            b.add_universe(cells);
        }
        for card in &self.lattices {
            b.add_lattice(card.to_lattice(&names)?);
        }
        if let Some(root) = &self.root {
            let cells = root.iter().map(|c| names.cell(c)).collect::<Result<Vec<_>>>()?;
            b.set_root(cells);
        }

        Ok((b.build()?, names))
    }
}

impl SurfaceCard {
    fn to_surface(&self) -> Result<Surface> {
        let mut surface = Surface::new(self.kind.clone())?.with_boundary(self.boundary_condition);
        if let Some(m) = &self.motion {
            surface = surface.with_motion(MotionSchedule::new(
                m.start_time,
                &m.velocities,
                &m.durations,
            )?);
        }
        Ok(surface)
    }
}

impl RegionCard {
    fn resolve(&self, names: &Names) -> Result<Region> {
        Ok(match self {
            RegionCard::Everywhere => Region::Everywhere,
            RegionCard::Positive(s) => Region::positive(names.surface(s)?),
            RegionCard::Negative(s) => Region::negative(names.surface(s)?),
            RegionCard::And(parts) => Region::intersection(
                parts
                    .iter()
                    .map(|p| p.resolve(names))
                    .collect::<Result<Vec<_>>>()?,
            ),
            RegionCard::Or(parts) => Region::union(
                parts
                    .iter()
                    .map(|p| p.resolve(names))
                    .collect::<Result<Vec<_>>>()?,
            ),
            RegionCard::Not(inner) => inner.resolve(names)?.complement(),
        })
    }
}

impl LatticeCard {
    fn to_lattice(&self, names: &Names) -> Result<Lattice> {
        let axis = |a: Option<(f64, f64, usize)>| {
            a.map(|(origin, pitch, count)| LatticeAxis::new(origin, pitch, count))
                .transpose()
        };
        let axes = [axis(self.x)?, axis(self.y)?, axis(self.z)?];
        let lookup = |row: &Vec<String>| -> Result<Vec<UniverseId>> {
            row.iter().map(|u| names.universe(u)).collect()
        };
        match &self.universes {
            LatticeFillCard::Uniform(u) => Lattice::uniform(axes, names.universe(u)?),
            LatticeFillCard::Rows(rows) => {
                let rows = rows.iter().map(&lookup).collect::<Result<Vec<_>>>()?;
                Lattice::from_layers(axes, vec![rows])
            }
            LatticeFillCard::Layers(layers) => {
                let layers = layers
                    .iter()
                    .map(|rows| rows.iter().map(&lookup).collect::<Result<Vec<_>>>())
                    .collect::<Result<Vec<_>>>()?;
                Lattice::from_layers(axes, layers)
            }
        }
    }
}
