use mcgeom::core::{BoundaryKind, MaterialId, Particle};
use mcgeom::deck::GeometryDeck;
use mcgeom::error::{Error, Result};

/// Shield block with a void channel carved out by complement (dog-leg duct style).
const SHIELD: &str = r#"{
  "surfaces": [
    { "name": "x0", "type": "plane_x", "x": 0.0, "boundary_condition": "vacuum" },
    { "name": "x1", "type": "plane_x", "x": 10.0, "boundary_condition": "vacuum" },
    { "name": "y0", "type": "plane_y", "y": 0.0, "boundary_condition": "reflective" },
    { "name": "y1", "type": "plane_y", "y": 10.0, "boundary_condition": "vacuum" },
    { "name": "z0", "type": "plane_z", "z": 0.0, "boundary_condition": "reflective" },
    { "name": "z1", "type": "plane_z", "z": 10.0, "boundary_condition": "vacuum" },
    { "name": "cx", "type": "plane_x", "x": 2.0 },
    { "name": "cy", "type": "plane_y", "y": 6.0 }
  ],
  "cells": [
    { "name": "shield",
      "region": { "and": [
        { "positive": "x0" }, { "negative": "x1" },
        { "positive": "y0" }, { "negative": "y1" },
        { "positive": "z0" }, { "negative": "z1" },
        { "not": { "and": [ { "negative": "cx" }, { "negative": "cy" } ] } }
      ] },
      "fill": { "material": 1 } },
    { "name": "void",
      "region": { "and": [
        { "positive": "x0" }, { "negative": "cx" },
        { "positive": "y0" }, { "negative": "cy" },
        { "positive": "z0" }, { "negative": "z1" }
      ] },
      "fill": { "material": 0 } }
  ]
}"#;

#[test]
fn complement_carves_channel() -> Result<()> {
    let (g, names) = GeometryDeck::from_json(SHIELD)?.build()?;
    let void = names.cell("void")?;
    let shield = names.cell("shield")?;
    assert_eq!(g.locate(&[1.0, 3.0, 5.0], 0.0)?.cell(), void);
    assert_eq!(g.locate(&[5.0, 5.0, 5.0], 0.0)?.cell(), shield);
    assert_eq!(g.locate(&[1.0, 8.0, 5.0], 0.0)?.cell(), shield);
    assert_eq!(g.material_at(&[1.0, 3.0, 5.0], 0.0)?, MaterialId(0));
    Ok(())
}

#[test]
fn streaming_up_the_channel() -> Result<()> {
    let (g, names) = GeometryDeck::from_json(SHIELD)?.build()?;
    let p = Particle::new([1.0, 1.0, 5.0], [0.0, 1.0, 0.0], 0.0, 1.0)?;
    let b = g.distance_to_boundary(&p, None)?;
    assert_eq!(b.surface(), Some(names.surface("cy")?));
    assert!((b.distance - 5.0).abs() < 1e-12);
    assert_eq!(b.next.map(|l| l.cell()), Some(names.cell("shield")?));
    Ok(())
}

#[test]
fn overlap_resolved_by_declaration_order() -> Result<()> {
    // without the complement the shield overlaps the channel; order decides
    let overlapping = SHIELD.replace(
        r#",
        { "not": { "and": [ { "negative": "cx" }, { "negative": "cy" } ] } }"#,
        "",
    );
    assert_ne!(overlapping, SHIELD);
    let mut deck = GeometryDeck::from_json(&overlapping)?;
    let (g, names) = deck.build()?;
    assert_eq!(g.locate(&[1.0, 3.0, 5.0], 0.0)?.cell(), names.cell("shield")?);

    deck.root = Some(vec!["void".into(), "shield".into()]);
    let (g, names) = deck.build()?;
    assert_eq!(g.locate(&[1.0, 3.0, 5.0], 0.0)?.cell(), names.cell("void")?);
    assert_eq!(g.locate(&[5.0, 3.0, 5.0], 0.0)?.cell(), names.cell("shield")?);
    Ok(())
}

const ASSEMBLY: &str = r#"{
  "surfaces": [
    { "name": "pin", "type": "cylinder_z", "radius": 0.54 },
    { "name": "left", "type": "plane_x", "x": -1.26, "boundary_condition": "reflective" },
    { "name": "right", "type": "plane_x", "x": 1.26, "boundary_condition": "vacuum" },
    { "name": "front", "type": "plane_y", "y": -1.26, "boundary_condition": "reflective" },
    { "name": "back", "type": "plane_y", "y": 1.26, "boundary_condition": "vacuum" },
    { "name": "rod_tip", "type": "plane_z", "z": 50.0,
      "motion": { "start_time": 1.0, "velocities": [[0, 0, -10]], "durations": [2.0] } }
  ],
  "cells": [
    { "name": "fuel", "region": { "negative": "pin" }, "fill": { "material": 1 } },
    { "name": "clad_water", "region": { "positive": "pin" }, "fill": { "material": 2 } },
    { "name": "rod", "region": { "and": [ { "negative": "pin" }, { "positive": "rod_tip" } ] },
      "fill": { "material": 5 } },
    { "name": "guide_water", "region": { "or": [ { "positive": "pin" }, { "negative": "rod_tip" } ] },
      "fill": { "material": 2 } },
    { "name": "core",
      "region": { "and": [ { "positive": "left" }, { "negative": "right" },
                           { "positive": "front" }, { "negative": "back" } ] },
      "fill": { "lattice": "assembly" } }
  ],
  "universes": [
    { "name": "fuel_pin", "cells": ["fuel", "clad_water"] },
    { "name": "guide_tube", "cells": ["rod", "guide_water"] }
  ],
  "lattices": [
    { "name": "assembly", "x": [-1.26, 1.26, 2], "y": [-1.26, 1.26, 2],
      "universes": [ ["guide_tube", "fuel_pin"],
                     ["fuel_pin", "fuel_pin"] ] }
  ]
}"#;

#[test]
fn lattice_deck_rows_are_top_down() -> Result<()> {
    let (g, names) = GeometryDeck::from_json(ASSEMBLY)?.build()?;
    assert_eq!(g.universe(g.root())?.cells(), &[names.cell("core")?]);
    let top_left = g.locate(&[-0.63, 0.63, 0.0], 0.0)?;
    assert_eq!(top_left.levels()[1].universe, names.universe("guide_tube")?);
    let bottom_left = g.locate(&[-0.63, -0.63, 0.0], 0.0)?;
    assert_eq!(bottom_left.levels()[1].universe, names.universe("fuel_pin")?);
    assert_eq!(bottom_left.cell(), names.cell("fuel")?);
    Ok(())
}

#[test]
fn moving_rod_in_guide_tube() -> Result<()> {
    let (g, names) = GeometryDeck::from_json(ASSEMBLY)?.build()?;
    let r = [-0.63, 0.63, 40.0];
    // rod tip starts at 50 and only moves after t = 1
    assert_eq!(g.locate(&r, 0.5)?.cell(), names.cell("guide_water")?);
    // t = 2.5: tip at 50 - 15 = 35
    assert_eq!(g.locate(&r, 2.5)?.cell(), names.cell("rod")?);
    assert_eq!(g.material_at(&r, 2.5)?, MaterialId(5));
    Ok(())
}

#[test]
fn reflective_corner_keeps_particle_inside() -> Result<()> {
    let (g, names) = GeometryDeck::from_json(ASSEMBLY)?.build()?;
    // outside the pin; the wall coincides with the element edge and wins the tie
    let p = Particle::new([-1.1, -1.1, 0.0], [-1.0, 0.0, 0.0], 0.0, 1.0)?;
    let b = g.distance_to_boundary(&p, None)?;
    assert!(matches!(b.kind, BoundaryKind::Surface { level: 0, .. }));
    assert_eq!(b.surface(), Some(names.surface("left")?));
    assert!((b.distance - 0.16).abs() < 1e-12);
    assert!((b.direction[0] - 1.0).abs() < 1e-12);
    assert_eq!(b.next.map(|l| l.cell()), Some(names.cell("clad_water")?));
    Ok(())
}

#[test]
fn deck_from_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("mcgeom-deck-{}.json", std::process::id()));
    std::fs::write(&path, ASSEMBLY)?;
    let loaded = GeometryDeck::from_path(&path);
    std::fs::remove_file(&path)?;
    let (g, _) = loaded?.build()?;
    assert_eq!(g.lattices().len(), 1);

    let missing = GeometryDeck::from_path(std::env::temp_dir().join("mcgeom-no-such-deck.json"));
    assert!(matches!(missing, Err(Error::Io(_))));
    Ok(())
}

#[test]
fn construction_errors_surface_early() -> Result<()> {
    let translated_material = r#"{
      "cells": [ { "name": "c", "fill": { "material": 1 }, "translation": [1, 0, 0] } ]
    }"#;
    assert!(matches!(
        GeometryDeck::from_json(translated_material)?.build(),
        Err(Error::TranslationOnMaterial(_))
    ));

    let bad_radius = r#"{
      "surfaces": [ { "name": "s", "type": "sphere", "radius": -2.0 } ]
    }"#;
    assert!(matches!(
        GeometryDeck::from_json(bad_radius)?.build(),
        Err(Error::InvalidSurface { kind: "sphere", .. })
    ));

    let bad_motion = r#"{
      "surfaces": [ { "name": "s", "type": "plane_z", "z": 0,
                      "motion": { "velocities": [[0, 0, 1]], "durations": [0.0] } } ]
    }"#;
    assert!(matches!(
        GeometryDeck::from_json(bad_motion)?.build(),
        Err(Error::InvalidMotion(_))
    ));

    let short_row = r#"{
      "cells": [ { "name": "m", "fill": { "material": 0 } },
                 { "name": "holder", "fill": { "lattice": "l" } } ],
      "universes": [ { "name": "u", "cells": ["m"] } ],
      "lattices": [ { "name": "l", "x": [0, 1, 2], "y": [0, 1, 2], "universes": [["u", "u"], ["u"]] } ]
    }"#;
    assert!(matches!(
        GeometryDeck::from_json(short_row)?.build(),
        Err(Error::InvalidLattice(_))
    ));
    Ok(())
}
