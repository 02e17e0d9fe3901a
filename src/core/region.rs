//! Boolean region algebra over surface half-spaces.

use crate::core::handle::SurfaceId;
use crate::core::particle::DIM;
use crate::core::surface::{Sense, Surface};
use crate::error::{Error, Result};

/// Immutable expression tree over surface senses.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// All of space (a cell with no bounding surfaces).
    Everywhere,
    /// Points on the requested side of one surface.
    Halfspace { surface: SurfaceId, sense: Sense },
    /// AND over sub-regions.
    Intersection(Vec<Region>),
    /// OR over sub-regions.
    Union(Vec<Region>),
    /// NOT of a sub-region.
    Complement(Box<Region>),
}

impl Region {
    /// `+s`
    pub fn positive(surface: SurfaceId) -> Self {
        Region::Halfspace {
            surface,
            sense: Sense::Positive,
        }
    }

    /// `-s`
    pub fn negative(surface: SurfaceId) -> Self {
        Region::Halfspace {
            surface,
            sense: Sense::Negative,
        }
    }

    /// AND over all regions; nested intersections are flattened.
    pub fn intersection<I: IntoIterator<Item = Region>>(regions: I) -> Self {
        let mut parts = Vec::new();
        for r in regions {
            match r {
                Region::Intersection(inner) => parts.extend(inner),
                Region::Everywhere => {}
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Region::Everywhere,
            1 => parts.remove(0),
            _ => Region::Intersection(parts),
        }
    }

    /// OR over all regions; nested unions are flattened.
    pub fn union<I: IntoIterator<Item = Region>>(regions: I) -> Self {
        let mut parts = Vec::new();
        for r in regions {
            match r {
                Region::Union(inner) => parts.extend(inner),
                Region::Everywhere => return Region::Everywhere,
                other => parts.push(other),
            }
        }
        match parts.len() {
            1 => parts.remove(0),
            _ => Region::Union(parts),
        }
    }

    /// `self & other`
    pub fn and(self, other: Region) -> Self {
        Region::intersection([self, other])
    }

    /// `self | other`
    pub fn or(self, other: Region) -> Self {
        Region::union([self, other])
    }

    /// `~self`
    pub fn complement(self) -> Self {
        match self {
            Region::Complement(inner) => *inner,
            Region::Halfspace { surface, sense } => Region::Halfspace {
                surface,
                sense: sense.flip(),
            },
            other => Region::Complement(Box::new(other)),
        }
    }

    /// Distinct surfaces referenced anywhere in the tree, in ascending id order.
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        let mut out = Vec::new();
        self.collect_surfaces(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_surfaces(&self, out: &mut Vec<SurfaceId>) {
        match self {
            Region::Everywhere => {}
            Region::Halfspace { surface, .. } => out.push(*surface),
            Region::Intersection(parts) | Region::Union(parts) => {
                parts.iter().for_each(|p| p.collect_surfaces(out))
            }
            Region::Complement(inner) => inner.collect_surfaces(out),
        }
    }

    /// Check every referenced surface exists in a table of `n_surfaces`.
    pub(crate) fn validate(&self, n_surfaces: usize) -> Result<()> {
        match self.surfaces().into_iter().find(|s| s.index() >= n_surfaces) {
            Some(missing) => Err(Error::UnknownSurface(missing)),
            None => Ok(()),
        }
    }

    /// Membership of `(r, t)`; surfaces are looked up by handle in `surfaces`.
    ///
    /// A handle outside `surfaces` never matches its half-space.
    pub fn contains(&self, surfaces: &[Surface], r: &[f64; DIM], t: f64) -> bool {
        let mut memo = SenseMemo::default();
        self.contains_with(surfaces, r, t, &mut memo)
    }

    /// Membership using (and filling) a per-call sense memo.
    pub(crate) fn contains_with(
        &self,
        surfaces: &[Surface],
        r: &[f64; DIM],
        t: f64,
        memo: &mut SenseMemo,
    ) -> bool {
        match self {
            Region::Everywhere => true,
            Region::Halfspace { surface, sense } => {
                memo.sense(*surface, surfaces, r, t) == Some(*sense)
            }
            Region::Intersection(parts) => {
                parts.iter().all(|p| p.contains_with(surfaces, r, t, memo))
            }
            Region::Union(parts) => parts.iter().any(|p| p.contains_with(surfaces, r, t, memo)),
            Region::Complement(inner) => !inner.contains_with(surfaces, r, t, memo),
        }
    }
}

/// Senses already computed during one membership query.
///
/// Trees reference a handful of surfaces, so a linear scan beats hashing. A memo
/// may be seeded with a forced sense for a surface the point sits on.
#[derive(Debug, Default, Clone)]
pub(crate) struct SenseMemo {
    entries: Vec<(SurfaceId, Sense)>,
}

impl SenseMemo {
    /// Memo in which `surface` reports `sense` regardless of its evaluated value.
    pub(crate) fn seeded(surface: SurfaceId, sense: Sense) -> Self {
        Self {
            entries: vec![(surface, sense)],
        }
    }

    fn sense(
        &mut self,
        id: SurfaceId,
        surfaces: &[Surface],
        r: &[f64; DIM],
        t: f64,
    ) -> Option<Sense> {
        if let Some(&(_, s)) = self.entries.iter().find(|(k, _)| *k == id) {
            return Some(s);
        }
        let s = surfaces.get(id.index())?.sense(r, t);
        self.entries.push((id, s));
        Some(s)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
