use mcgeom::core::{
    BoundaryCondition, BoundaryKind, Fill, Geometry, GeometryBuilder, Lattice, LatticeAxis,
    LatticeId, MaterialId, Particle, Region, Surface, SurfaceKind, UniverseId,
};
use mcgeom::error::{Error, Result};

const FUEL: MaterialId = MaterialId(1);
const WATER: MaterialId = MaterialId(2);
const GUIDE: MaterialId = MaterialId(3);
const PITCH: f64 = 1.26;

/// Pin universe (fuel rod in water) and a water-only guide universe.
fn pin_and_guide(b: &mut GeometryBuilder) -> Result<(UniverseId, UniverseId)> {
    let clad = b.add_surface(Surface::new(SurfaceKind::CylinderZ {
        center: [0.0, 0.0],
        radius: 0.54,
    })?);
    let fuel = b.add_cell(Region::negative(clad), Fill::Material(FUEL))?;
    let water = b.add_cell(Region::positive(clad), Fill::Material(WATER))?;
    let pin = b.add_universe(vec![fuel, water]);
    let guide_cell = b.add_cell(Region::Everywhere, Fill::Material(GUIDE))?;
    let guide = b.add_universe(vec![guide_cell]);
    Ok((pin, guide))
}

/// Box of vacuum planes around `[lo, hi]` in x and y.
fn vacuum_box(b: &mut GeometryBuilder, lo: f64, hi: f64) -> Result<Region> {
    let vac = |kind| Ok::<_, Error>(Surface::new(kind)?.with_boundary(BoundaryCondition::Vacuum));
    let x0 = b.add_surface(vac(SurfaceKind::PlaneX { x: lo })?);
    let x1 = b.add_surface(vac(SurfaceKind::PlaneX { x: hi })?);
    let y0 = b.add_surface(vac(SurfaceKind::PlaneY { y: lo })?);
    let y1 = b.add_surface(vac(SurfaceKind::PlaneY { y: hi })?);
    Ok(Region::intersection([
        Region::positive(x0),
        Region::negative(x1),
        Region::positive(y0),
        Region::negative(y1),
    ]))
}

/// 2x2 lattice, rows listed top-down:
///   pin   guide
///   guide pin
fn two_by_two(translation: Option<[f64; 3]>) -> Result<Geometry> {
    let mut b = Geometry::builder();
    let (pin, guide) = pin_and_guide(&mut b)?;
    let axis = LatticeAxis::centered(PITCH, 2)?;
    let lattice = b.add_lattice(Lattice::from_rows(
        axis,
        axis,
        vec![vec![pin, guide], vec![guide, pin]],
    )?);
    let [tx, _, _] = translation.unwrap_or([0.0; 3]);
    let region = vacuum_box(&mut b, -PITCH + tx, PITCH + tx)?;
    let holder = b.add_translated_cell(region, Fill::Lattice(lattice), translation)?;
    b.set_root(vec![holder]);
    b.build()
}

#[test]
fn elements_follow_geometric_y() -> Result<()> {
    let g = two_by_two(None)?;
    assert_eq!(g.max_depth(), 2);
    // top-left pin center, top-right guide, bottom-left guide, bottom-right pin center
    assert_eq!(g.material_at(&[-0.63, 0.63, 0.0], 0.0)?, FUEL);
    assert_eq!(g.material_at(&[0.63, 0.63, 0.0], 0.0)?, GUIDE);
    assert_eq!(g.material_at(&[-0.63, -0.63, 0.0], 0.0)?, GUIDE);
    assert_eq!(g.material_at(&[0.63, -0.63, 0.0], 0.0)?, FUEL);
    // corner of a pin element is water
    assert_eq!(g.material_at(&[0.05, -1.2, 0.0], 0.0)?, WATER);
    Ok(())
}

#[test]
fn nearby_points_share_an_element() -> Result<()> {
    let g = two_by_two(None)?;
    let a = g.locate(&[0.5, 0.5, 0.0], 0.0)?;
    let b = g.locate(&[0.5, 0.6, 0.0], 0.0)?;
    let c = g.locate(&[-0.5, 0.5, 0.0], 0.0)?;
    let element = |l: &mcgeom::core::Location| l.levels()[1].element.map(|e| e.index);
    assert_eq!(element(&a), Some([1, 1, 0]));
    assert_eq!(element(&a), element(&b));
    assert_ne!(element(&a), element(&c));
    // element-local coordinates are centered
    let local = a.levels()[1].local;
    assert!((local[0] - (0.5 - 0.63)).abs() < 1e-12);
    assert!((local[1] - (0.5 - 0.63)).abs() < 1e-12);
    Ok(())
}

#[test]
fn crossing_into_neighbor_element() -> Result<()> {
    let g = two_by_two(None)?;
    // guide element (0, 0) heading +x into pin element (1, 0)
    let mut p = Particle::new([-0.63, -0.63, 0.0], [1.0, 0.0, 0.0], 0.0, 1.0)?;
    let b = g.distance_to_boundary(&p, None)?;
    assert_eq!(
        b.kind,
        BoundaryKind::LatticeEdge {
            lattice: LatticeId(0),
            level: 1
        }
    );
    assert!((b.distance - 0.63).abs() < 1e-12);
    let Some(next) = b.next.clone() else {
        panic!("lattice edge must lead to the neighbor element");
    };
    let frame = next.levels()[1];
    assert_eq!(frame.element.map(|e| e.index), Some([1, 0, 0]));
    // continued position: entering the left face of the new element
    assert!((frame.local[0] + 0.63).abs() < 1e-12);
    assert!(frame.local[1].abs() < 1e-12);
    assert_eq!(next.material(), WATER);

    p.move_to_boundary(&b)?;
    let into_fuel = g.distance_to_boundary_from(&next, &p, None)?;
    assert!((into_fuel.distance - 0.09).abs() < 1e-9);
    assert_eq!(into_fuel.next.map(|l| l.material()), Some(FUEL));
    Ok(())
}

#[test]
fn grid_line_heading_backward_stays_behind() -> Result<()> {
    let g = two_by_two(None)?;
    // start exactly on the vertical grid line, flying -x: belongs to the left element
    let p = Particle::new([0.0, -0.63, 0.0], [-1.0, 0.0, 0.0], 0.0, 1.0)?;
    let b = g.distance_to_boundary(&p, None)?;
    // crosses the whole guide element to the outer box
    assert!((b.distance - PITCH).abs() < 1e-9);
    assert!(b.escapes());
    Ok(())
}

#[test]
fn translated_lattice_matches_untranslated() -> Result<()> {
    let shift = 21.42;
    let moved = two_by_two(Some([shift, 0.0, 0.0]))?;
    let fixed = two_by_two(None)?;
    for &(x, y) in &[(-0.63, 0.63), (0.63, 0.63), (-0.63, -0.63), (0.3, -0.9)] {
        assert_eq!(
            moved.material_at(&[x + shift, y, 0.0], 0.0)?,
            fixed.material_at(&[x, y, 0.0], 0.0)?
        );
    }
    Ok(())
}

#[test]
fn point_outside_lattice_extent() -> Result<()> {
    let mut b = Geometry::builder();
    let (pin, _) = pin_and_guide(&mut b)?;
    let axis = LatticeAxis::centered(PITCH, 2)?;
    let lattice = b.add_lattice(Lattice::uniform([Some(axis), Some(axis), None], pin)?);
    let holder = b.add_cell(Region::Everywhere, Fill::Lattice(lattice))?;
    b.set_root(vec![holder]);
    let g = b.build()?;

    let err = g.locate(&[3.0, 0.0, 0.0], 0.25).unwrap_err();
    assert!(err.is_resolution_failure());
    match err {
        Error::OutsideLattice {
            lattice: l,
            index,
            position,
            time,
        } => {
            assert_eq!(l, lattice);
            assert_eq!(index[0], 3);
            assert_eq!(position, [3.0, 0.0, 0.0]);
            assert_eq!(time, 0.25);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn axial_layers_stack_in_z() -> Result<()> {
    let mut b = Geometry::builder();
    let (pin, guide) = pin_and_guide(&mut b)?;
    let axes = [
        Some(LatticeAxis::centered(PITCH, 1)?),
        Some(LatticeAxis::centered(PITCH, 1)?),
        Some(LatticeAxis::new(0.0, 10.0, 2)?),
    ];
    let lattice = b.add_lattice(Lattice::from_layers(
        axes,
        vec![vec![vec![pin]], vec![vec![guide]]],
    )?);
    let holder = b.add_cell(Region::Everywhere, Fill::Lattice(lattice))?;
    b.set_root(vec![holder]);
    let g = b.build()?;
    assert_eq!(g.material_at(&[0.0, 0.0, 5.0], 0.0)?, FUEL);
    assert_eq!(g.material_at(&[0.0, 0.0, 15.0], 0.0)?, GUIDE);

    // axial flight: the z edge of the lower element comes first
    let p = Particle::new([0.0, 0.0, 5.0], [0.0, 0.0, 1.0], 0.0, 1.0)?;
    let bd = g.distance_to_boundary(&p, None)?;
    assert!((bd.distance - 5.0).abs() < 1e-12);
    assert_eq!(bd.next.map(|l| l.material()), Some(GUIDE));
    Ok(())
}
