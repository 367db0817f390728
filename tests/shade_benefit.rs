use anyhow::Result;
use shade_benefit::geom::mesh::subdivide_polygon;
use shade_benefit::sim::engine::PolygonScene;
use shade_benefit::sim::shading::intersect::RayIntersector;
use shade_benefit::sim::shading::{SunPath, SunVector};
use shade_benefit::vecutils::roll;
use shade_benefit::{
    AnalysisPeriod, Aperture, Location, Point, Polygon, Room, Shade, ShadeBenefitConfig,
    ShadeBenefitResult, ShadeBenefitSimulation, ShadeError, SimulationSeries, Vector,
    strip_shades,
};

fn quad(pts: [(f64, f64, f64); 4]) -> Vec<Point> {
    pts.iter().map(|&(x, y, z)| Point::new(x, y, z)).collect()
}

/// 1 m2 south-facing window covered by a 1 m2 shade 1 cm in front of it.
fn covered_window_room() -> Room {
    let window = Aperture::new(
        "South_Window",
        quad([(0., 0., 0.), (1., 0., 0.), (1., 0., 1.), (0., 0., 1.)]),
    )
    .with_shade(Shade::new(
        "Screen",
        quad([
            (0., -0.01, 0.),
            (1., -0.01, 0.),
            (1., -0.01, 1.),
            (0., -0.01, 1.),
        ]),
    ));
    Room::new("Room_1", vec![window])
}

/// 2 m x 1.5 m south-facing window with a 1 m deep overhang along its head.
fn overhang_room() -> Room {
    let window = Aperture::new(
        "Win",
        quad([(0., 0., 0.), (2., 0., 0.), (2., 0., 1.5), (0., 0., 1.5)]),
    )
    .with_shade(Shade::new(
        "Overhang",
        quad([
            (-0.5, 0., 1.5),
            (2.5, 0., 1.5),
            (2.5, -1., 1.5),
            (-0.5, -1., 1.5),
        ]),
    ));
    Room::new("Office", vec![window])
}

fn one_day_config(grid_size: f64) -> ShadeBenefitConfig {
    let mut config = ShadeBenefitConfig::new();
    config.period = AnalysisPeriod::days((1, 1), (1, 1), (0, 23), 1);
    config.grid_size = grid_size;
    config.workers = Some(2);
    config
}

fn summer_config() -> ShadeBenefitConfig {
    let mut config = ShadeBenefitConfig::new();
    config.location = Location {
        latitude: 40.0,
        longitude: -105.0,
        utc_offset: -7.0,
    };
    config.period = AnalysisPeriod::days((6, 21), (6, 21), (6, 18), 1);
    config.grid_size = 0.5;
    config
}

/// 24 sun positions due south at 30 degrees altitude.
fn southern_suns() -> Vec<SunVector> {
    let alt = 30f64.to_radians();
    (0..24)
        .map(|step| SunVector {
            step,
            altitude: 30.0,
            azimuth: 180.0,
            to_sun: Vector::new(0., -alt.cos(), alt.sin()),
        })
        .collect()
}

fn split_day_series() -> SimulationSeries {
    let cooling: Vec<f64> = (0..24).map(|t| if t < 12 { 150.0 } else { 0.0 }).collect();
    let heating: Vec<f64> = (0..24).map(|t| if t < 12 { 0.0 } else { 150.0 }).collect();
    SimulationSeries::new()
        .with_room("ROOM_1", cooling, heating)
        .with_aperture("south_window", vec![100.0; 24])
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

#[test]
fn test_concrete_scenario() -> Result<()> {
    let sim = ShadeBenefitSimulation::new(&[covered_window_room()], &[], one_day_config(2.0))?
        .with_sun_vectors(southern_suns())?;
    assert_eq!(sim.index().face_count(), 1);
    assert_eq!(sim.index().sample_point_count(), 1);

    let result = sim.run(&split_day_series())?;
    assert_eq!(result.face_count(), 1);
    assert!((result.faces[0].area() - 1.0).abs() < 1e-12);
    assert_eq!(result.blocked_rays, 24);
    assert!((result.help[0] - 1200.0).abs() < 1e-9);
    assert!((result.harm[0] + 1200.0).abs() < 1e-9);
    assert!(result.net[0].abs() < 1e-9);
    assert_eq!(result.sun_vectors.len(), 24);
    assert_eq!(result.sample_points.len(), 1);
    Ok(())
}

#[test]
fn test_context_occlusion_is_never_scored() -> Result<()> {
    let tower = Shade::new(
        "Tower",
        quad([
            (-50., -5., -50.),
            (50., -5., -50.),
            (50., -5., 50.),
            (-50., -5., 50.),
        ]),
    );
    let sim = ShadeBenefitSimulation::new(&[covered_window_room()], &[tower], one_day_config(2.0))?
        .with_sun_vectors(southern_suns())?;
    let result = sim.run(&split_day_series())?;
    assert_eq!(result.context_occluded_rays, 24);
    assert_eq!(result.blocked_rays, 0);
    assert_eq!(result.help, vec![0.0]);
    assert_eq!(result.harm, vec![0.0]);
    assert_eq!(result.net, vec![0.0]);
    Ok(())
}

#[test]
fn test_context_and_source_hits_are_exclusive() -> Result<()> {
    let shade = Polygon::new(
        "shade",
        quad([(-2., -1., -2.), (2., -1., -2.), (2., -1., 2.), (-2., -1., 2.)]),
        None,
    )?;
    // Covers only the western half of the sky seen through the shade
    let context = Polygon::new(
        "block",
        quad([(-20., -3., -20.), (0., -3., -20.), (0., -3., 20.), (-20., -3., 20.)]),
        None,
    )?;
    let source = PolygonScene::new(subdivide_polygon(&shade, 0.5)?);
    let context = PolygonScene::new(vec![context]);
    let engine = RayIntersector::new(&source, Some(&context), Vector::new(0., -1., 0.));

    let points: Vec<Point> = (0..5)
        .flat_map(|i| (0..5).map(move |j| Point::new(-0.8 + 0.4 * i as f64, 0., -0.8 + 0.4 * j as f64)))
        .collect();
    let suns: Vec<SunVector> = (0..16)
        .map(|step| {
            let az = (120.0 + 8.0 * step as f64).to_radians();
            let alt = 20f64.to_radians();
            SunVector {
                step,
                altitude: 20.0,
                azimuth: az.to_degrees(),
                to_sun: Vector::new(alt.cos() * az.sin(), alt.cos() * az.cos(), alt.sin()),
            }
        })
        .collect();

    let map = engine.run(&points, &suns, 3)?;
    assert!(!map.context_occluded.is_empty());
    assert!(map.blocked_count() > 0);
    for pair in &map.context_occluded {
        assert!(map.face_hits.iter().all(|hits| !hits.contains(pair)));
    }
    let total = map.blocked_count() + map.context_occluded.len() + map.behind + map.unblocked;
    assert_eq!(total, points.len() * suns.len());
    Ok(())
}

#[test]
fn test_pure_harm() -> Result<()> {
    let sim = ShadeBenefitSimulation::new(&[overhang_room()], &[], summer_config())?;
    let n = sim.timestamps().len();
    let series = SimulationSeries::new()
        .with_room("office", vec![0.0; n], vec![120.0; n])
        .with_aperture("win", vec![80.0; n]);
    let result = sim.run(&series)?;
    assert!(result.net.iter().all(|&v| v <= 0.0));
    assert!(result.net.iter().any(|&v| v < 0.0));
    assert!(result.help.iter().all(|&v| v == 0.0));
    assert!(result.total_harm() < 0.0);
    Ok(())
}

#[test]
fn test_pure_help() -> Result<()> {
    let sim = ShadeBenefitSimulation::new(&[overhang_room()], &[], summer_config())?;
    let n = sim.timestamps().len();
    let series = SimulationSeries::new()
        .with_room("OFFICE", vec![120.0; n], vec![0.0; n])
        .with_aperture("WIN", vec![80.0; n]);
    let result = sim.run(&series)?;
    assert!(result.net.iter().all(|&v| v >= 0.0));
    assert!(result.net.iter().any(|&v| v > 0.0));
    assert!(result.harm.iter().all(|&v| v == 0.0));
    // Area-weighted totals match the group summary
    let weighted: f64 = result
        .faces
        .iter()
        .zip(&result.help)
        .map(|(f, h)| f.area() * h)
        .sum();
    assert!((weighted - result.groups[0].total_help).abs() < 1e-9 * weighted.max(1.0));
    Ok(())
}

#[test]
fn test_idempotent_across_runs_and_workers() -> Result<()> {
    let run = |workers: usize| -> Result<ShadeBenefitResult> {
        let mut config = summer_config();
        config.workers = Some(workers);
        config.lag_time = 1.0;
        let sim = ShadeBenefitSimulation::new(&[overhang_room()], &[], config)?;
        let n = sim.timestamps().len();
        let cooling: Vec<f64> = (0..n).map(|t| (t as f64 * 0.7).sin().max(0.0) * 300.0).collect();
        let heating: Vec<f64> = (0..n).map(|t| (t as f64 * 0.7).cos().max(0.0) * 200.0).collect();
        let solar: Vec<f64> = (0..n).map(|t| 50.0 + 10.0 * t as f64).collect();
        let series = SimulationSeries::new()
            .with_room("Office", cooling, heating)
            .with_aperture("Win", solar);
        sim.run(&series)
    };

    let first = run(2)?;
    let second = run(2)?;
    assert_eq!(bits(&first.help), bits(&second.help));
    assert_eq!(bits(&first.harm), bits(&second.harm));
    assert_eq!(bits(&first.net), bits(&second.net));

    for workers in [1, 3, 8] {
        let other = run(workers)?;
        assert_eq!(bits(&first.net), bits(&other.net));
    }
    Ok(())
}

#[test]
fn test_area_invariant() -> Result<()> {
    let shapes = [
        Polygon::new(
            "trapezoid",
            quad([(0., 0., 0.), (3., 0., 0.), (2.2, 0., 1.7), (0.4, 0., 1.7)]),
            None,
        )?,
        Polygon::new(
            "tilted",
            vec![
                // All on the plane z = 0.25x + 0.2y
                Point::new(0., 0., 0.),
                Point::new(2., 0., 0.5),
                Point::new(2.5, 1.5, 0.925),
                Point::new(1.0, 2.5, 0.75),
                Point::new(-0.5, 1.0, 0.075),
            ],
            None,
        )?,
    ];
    for poly in &shapes {
        for grid in [0.05, 0.13, 0.5, 0.9, 4.0] {
            let total: f64 = subdivide_polygon(poly, grid)?.iter().map(|f| f.area()).sum();
            assert!((total - poly.area()).abs() < 1e-9, "{} at {grid}", poly.name);
        }
    }
    Ok(())
}

#[test]
fn test_vector_count_monotonic_in_timestep() {
    let path = SunPath::new(
        Location {
            latitude: 51.5,
            longitude: 0.0,
            utc_offset: 0.0,
        },
        0.0,
    );
    let mut previous = 0;
    for timestep in [1, 2, 4, 12, 60] {
        let period = AnalysisPeriod::days((11, 15), (11, 15), (0, 23), timestep);
        let count = path.sun_vectors(&period.timestamps()).len();
        assert!(count >= previous);
        previous = count;
    }
}

#[test]
fn test_lag_round_trip() {
    let original: Vec<f64> = (0..96).map(|i| (i as f64 * 0.37).cos()).collect();
    for k in [0, 1, 5, 95] {
        let mut values = original.clone();
        roll(&mut values, k);
        roll(&mut values, original.len() - k);
        assert_eq!(values, original);
    }
}

#[test]
fn test_north_angle_matches_rotated_model() -> Result<()> {
    // Rotating the model 90 degrees counter-clockwise together with north
    // must not change the scores.
    let rotate = |p: &Point| Point::new(-p.y, p.x, p.z);
    let rotate_room = |room: &Room| {
        let mut room = room.clone();
        for aperture in &mut room.apertures {
            aperture.vertices = aperture.vertices.iter().map(rotate).collect();
            for shade in &mut aperture.shades {
                shade.vertices = shade.vertices.iter().map(rotate).collect();
            }
        }
        room
    };
    let room = Room::new(
        "Office",
        vec![
            Aperture::new(
                "Win",
                quad([(0., 0., 0.), (1., 0., 0.), (1., 0., 1.), (0., 0., 1.)]),
            )
            .with_shade(Shade::new(
                "Overhang",
                quad([(0., 0., 1.), (1., 0., 1.), (1., -0.7, 1.), (0., -0.7, 1.)]),
            )),
        ],
    );

    let mut config = summer_config();
    config.grid_size = 2.0;
    let sim = ShadeBenefitSimulation::new(&[room.clone()], &[], config.clone())?;
    config.north_angle = 90.0;
    let rotated = ShadeBenefitSimulation::new(&[rotate_room(&room)], &[], config)?;

    let n = sim.timestamps().len();
    let series = SimulationSeries::new()
        .with_room("Office", vec![100.0; n], vec![0.0; n])
        .with_aperture("Win", vec![60.0; n]);
    let a = sim.run(&series)?;
    let b = rotated.run(&series)?;
    assert_eq!(a.blocked_rays, b.blocked_rays);
    assert!(a.blocked_rays > 0);
    assert!((a.total_help() - b.total_help()).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_two_phase_protocol() -> Result<()> {
    let rooms = vec![overhang_room()];
    let stripped = strip_shades(&rooms);
    assert!(stripped[0].apertures.iter().all(|a| a.shades.is_empty()));
    assert_eq!(rooms[0].apertures[0].shades.len(), 1);

    // The stripped copy has nothing to analyze
    let err = ShadeBenefitSimulation::new(&stripped, &[], summer_config())
        .err()
        .expect("stripped rooms must be rejected");
    assert!(matches!(
        err.downcast_ref::<ShadeError>(),
        Some(ShadeError::Configuration(_))
    ));
    assert!(ShadeBenefitSimulation::new(&rooms, &[], summer_config()).is_ok());
    Ok(())
}

#[test]
fn test_missing_aperture_series() -> Result<()> {
    let sim = ShadeBenefitSimulation::new(&[covered_window_room()], &[], one_day_config(2.0))?;
    let series = SimulationSeries::new().with_room("room_1", vec![0.0; 24], vec![0.0; 24]);
    let err = sim.run(&series).unwrap_err();
    match err.downcast_ref::<ShadeError>() {
        Some(ShadeError::DataMismatch(msg)) => assert!(msg.contains("South_Window")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}
