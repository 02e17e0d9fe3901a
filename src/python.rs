use std::path::PathBuf;

use numpy::{IntoPyArray, PyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::particle::DIM;
use crate::core::{BoundaryKind, CellId, Census, Geometry, Particle, SurfaceId};
use crate::deck::{GeometryDeck, Names};

/// (distance, kind, surface_name, boundary_condition, next_cell_name, direction_after)
type Crossing = (
    f64,
    &'static str,
    Option<String>,
    Option<&'static str>,
    Option<String>,
    [f64; DIM],
);

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python-facing wrapper around a built geometry and its deck names.
///
/// API:
/// - Geometry.from_json(text) / Geometry.from_file(path)
/// - locate(position, time=0.0) -> (cell_name, material)
/// - locate_many(positions, time=0.0) -> np.ndarray[int64], -1 for lost points
/// - distance_to_boundary(position, direction, time=0.0, speed=1.0, census=None)
///   -> (distance, kind, surface_name | None, boundary_condition | None,
///       next_cell_name | None, direction_after)
#[pyclass(name = "Geometry")]
pub struct PyGeometry {
    geometry: Geometry,
    names: Names,
}

impl PyGeometry {
    fn from_deck(deck: GeometryDeck) -> PyResult<Self> {
        let (geometry, names) = deck.build().map_err(py_err)?;
        Ok(Self { geometry, names })
    }

    fn cell_name(&self, id: CellId) -> String {
        self.names
            .cell_name(id)
            .map_or_else(|| id.to_string(), str::to_owned)
    }

    fn surface_name(&self, id: SurfaceId) -> String {
        self.names
            .surface_name(id)
            .map_or_else(|| id.to_string(), str::to_owned)
    }
}

#[pymethods]
impl PyGeometry {
    /// Build from a JSON geometry deck. Raises ValueError on malformed or inconsistent decks.
    #[staticmethod]
    fn from_json(text: &str) -> PyResult<Self> {
        Self::from_deck(GeometryDeck::from_json(text).map_err(py_err)?)
    }

    /// Build from a JSON geometry deck on disk.
    #[staticmethod]
    fn from_file(path: PathBuf) -> PyResult<Self> {
        Self::from_deck(GeometryDeck::from_path(path).map_err(py_err)?)
    }

    /// Return (cell_name, material) of the innermost cell containing `position` at `time`.
    #[pyo3(signature = (position, time=0.0))]
    fn locate(&self, position: [f64; DIM], time: f64) -> PyResult<(String, u32)> {
        let loc = self.geometry.locate(&position, time).map_err(py_err)?;
        Ok((self.cell_name(loc.cell()), loc.material().0))
    }

    /// Material ids for an (N, 3) float64 array of positions (releases the GIL).
    ///
    /// Points that cannot be located map to -1.
    #[pyo3(signature = (positions, time=0.0))]
    fn locate_many<'py>(
        &self,
        py: Python<'py>,
        positions: PyReadonlyArray2<'py, f64>,
        time: f64,
    ) -> PyResult<Py<PyArray1<i64>>> {
        let arr = positions.as_array();
        if arr.shape()[1] != DIM {
            return Err(py_err(format!(
                "positions must have shape (N, {}), got {:?}",
                DIM,
                arr.shape()
            )));
        }
        let points: Vec<[f64; DIM]> = arr
            .outer_iter()
            .map(|row| [row[0], row[1], row[2]])
            .collect();
        let geometry = &self.geometry;
        let materials: Vec<i64> = py.detach(|| {
            points
                .iter()
                .map(|r| geometry.material_at(r, time).map_or(-1, |m| i64::from(m.0)))
                .collect()
        });
        Ok(materials.into_pyarray(py).to_owned().into())
    }

    /// Distance to the next boundary along `direction`.
    ///
    /// Returns (distance, kind, surface_name, boundary_condition, next_cell_name,
    /// direction_after) where kind is one of "surface", "lattice", "census", "unbounded",
    /// boundary_condition is "vacuum", "reflective" or "interior" for surface events, and
    /// direction_after is the flight direction past the event (reflected on reflective walls).
    #[pyo3(signature = (position, direction, time=0.0, speed=1.0, census=None))]
    fn distance_to_boundary(
        &self,
        position: [f64; DIM],
        direction: [f64; DIM],
        time: f64,
        speed: f64,
        census: Option<f64>,
    ) -> PyResult<Crossing> {
        let particle = Particle::new(position, direction, time, speed).map_err(py_err)?;
        let census = census
            .map(|t| Census::new(vec![t]))
            .transpose()
            .map_err(py_err)?;
        let boundary = self
            .geometry
            .distance_to_boundary(&particle, census.as_ref())
            .map_err(py_err)?;
        let (kind, condition) = match boundary.kind {
            BoundaryKind::Surface { condition, .. } => ("surface", Some(condition.label())),
            BoundaryKind::LatticeEdge { .. } => ("lattice", None),
            BoundaryKind::Census { .. } => ("census", None),
            BoundaryKind::Unbounded => ("unbounded", None),
        };
        Ok((
            boundary.distance,
            kind,
            boundary.surface().map(|s| self.surface_name(s)),
            condition,
            boundary.next.as_ref().map(|l| self.cell_name(l.cell())),
            boundary.direction,
        ))
    }

    fn __repr__(&self) -> String {
        format!(
            "Geometry(surfaces={}, cells={}, universes={}, lattices={})",
            self.geometry.surfaces().len(),
            self.geometry.cells().len(),
            self.geometry.universes().len(),
            self.geometry.lattices().len()
        )
    }
}

/// The mcgeom Python module entry point.
#[pymodule]
fn mcgeom(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGeometry>()?;
    Ok(())
}
