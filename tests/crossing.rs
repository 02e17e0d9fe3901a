use mcgeom::core::{
    BoundaryCondition, BoundaryKind, Fill, Geometry, MaterialId, Particle, Region, Sense,
    Surface, SurfaceId, SurfaceKind,
};
use mcgeom::error::Result;

const INNER: MaterialId = MaterialId(1);
const OUTER: MaterialId = MaterialId(2);

/// z = 2.3 splits the root; below it, a nested universe is bounded by the same plane.
fn shared_plane() -> Result<(Geometry, SurfaceId)> {
    let mut b = Geometry::builder();
    let s = b.add_surface(Surface::new(SurfaceKind::PlaneZ { z: 2.3 })?);
    let inner = b.add_cell(Region::negative(s), Fill::Material(INNER))?;
    let u = b.add_universe(vec![inner]);
    let below = b.add_cell(Region::negative(s), Fill::Universe(u))?;
    let above = b.add_cell(Region::positive(s), Fill::Material(OUTER))?;
    b.set_root(vec![below, above]);
    Ok((b.build()?, s))
}

#[test]
fn crossing_into_nested_universe_sharing_the_surface() -> Result<()> {
    let (g, s) = shared_plane()?;
    for k in 0..100 {
        let theta = 0.01 + 1.4 * f64::from(k) / 100.0;
        let mut p = Particle::new([0.0, 0.0, 5.0], [theta.sin(), 0.0, -theta.cos()], 0.0, 1.0)?;
        let b = g.distance_to_boundary(&p, None)?;
        assert_eq!(b.surface(), Some(s));
        let Some(next) = b.next.clone() else {
            panic!("interior crossing must resolve a next location");
        };
        assert_eq!(next.material(), INNER);
        assert_eq!(next.depth(), 2);
        assert_eq!(next.on_surface(), Some((s, Sense::Negative)));

        // the plane was just crossed at both levels; nothing else bounds the cell
        p.move_to_boundary(&b)?;
        let after = g.distance_to_boundary_from(&next, &p, None)?;
        assert_eq!(after.kind, BoundaryKind::Unbounded);
    }
    Ok(())
}

#[test]
fn crossing_out_of_nested_universe() -> Result<()> {
    let (g, s) = shared_plane()?;
    let p = Particle::new([0.4, 0.0, 0.0], [0.6, 0.0, 0.8], 0.0, 1.0)?;
    let b = g.distance_to_boundary(&p, None)?;
    assert_eq!(b.surface(), Some(s));
    // coincident at both levels: the root frame wins
    assert!(matches!(b.kind, BoundaryKind::Surface { level: 0, .. }));
    assert_eq!(b.next.map(|l| (l.material(), l.depth())), Some((OUTER, 1)));
    Ok(())
}

/// Slab between reflective walls at x = ±1e10, open in y and z.
fn far_walls() -> Result<(Geometry, SurfaceId, SurfaceId)> {
    let mut b = Geometry::builder();
    let refl = BoundaryCondition::Reflective;
    let lo = b.add_surface(Surface::new(SurfaceKind::PlaneX { x: -1.0e10 })?.with_boundary(refl));
    let hi = b.add_surface(Surface::new(SurfaceKind::PlaneX { x: 1.0e10 })?.with_boundary(refl));
    b.add_cell(
        Region::positive(lo).and(Region::negative(hi)),
        Fill::Material(INNER),
    )?;
    Ok((b.build()?, lo, hi))
}

#[test]
fn far_reflective_wall_is_not_crossed_twice() -> Result<()> {
    let (g, lo, hi) = far_walls()?;
    for k in 0..200 {
        let phi = -1.45 + 2.9 * f64::from(k) / 200.0;
        let mut p = Particle::new([-3.3e9, 0.0, 0.0], [phi.cos(), phi.sin(), 0.0], 0.0, 1.0)?;
        let b = g.distance_to_boundary(&p, None)?;
        assert_eq!(b.surface(), Some(hi));
        assert!(b.direction[0] < 0.0);
        let Some(next) = b.next.clone() else {
            panic!("reflection must resolve a next location");
        };
        p.move_to_boundary(&b)?;

        // the wall just left is never hit again; the far wall is next
        let back = g.distance_to_boundary_from(&next, &p, None)?;
        assert_eq!(back.surface(), Some(lo), "flight {k} re-crossed the wall");
        assert!(back.distance > 1.9e10);
        let Some(again) = back.next.clone() else {
            panic!("second reflection must resolve a next location");
        };
        p.move_to_boundary(&back)?;
        assert!(p.u[0] > 0.0);
        assert_eq!(again.material(), INNER);
        assert_eq!(p.crossings, 2);
    }
    Ok(())
}
