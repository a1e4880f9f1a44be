//! End-to-end rendering scenarios through the public API.

use glam::Vec3;

use cloudtunnel::audio::AudioSignal;
use cloudtunnel::camera::{CameraFrame, CameraIntegrator, CameraState};
use cloudtunnel::density::{DensityField, DensitySource, FULL_DETAIL_OCTAVES};
use cloudtunnel::lattice::{Lattice, LatticeSet};
use cloudtunnel::noise::{NoiseField, NoiseKernel, NoiseSource};
use cloudtunnel::path::PathModel;
use cloudtunnel::raymarch::Termination;
use cloudtunnel::renderer::{tonemap, FrameContext, Renderer};
use cloudtunnel::params::SceneParameters;

/// Default look with the path straightened so the sun sits dead ahead
fn straight_tunnel() -> SceneParameters {
    SceneParameters {
        path_amp_x: 0.0,
        path_amp_y: 0.0,
        ..Default::default()
    }
}

fn flat_lattices() -> LatticeSet {
    LatticeSet::new(
        Lattice::constant(32, 0.5).unwrap(),
        Lattice::constant(32, 0.0).unwrap(),
    )
}

fn seeded_lattices(seed: u64) -> LatticeSet {
    LatticeSet::new(
        Lattice::white_noise(64, seed).unwrap(),
        Lattice::blue_noise(64, seed + 1).unwrap(),
    )
}

#[test]
fn test_center_pixel_sees_the_sun_unoccluded() {
    let params = straight_tunnel();
    let lattices = flat_lattices();
    let camera = CameraState::default();
    let ctx = FrameContext::new(&params, camera, &lattices, 9, 9, 0.0, &AudioSignal::default());

    // Sun anchor lies on the view axis
    assert!((ctx.sun_dir() - Vec3::Z).length() < 1e-6);
    assert!((ctx.ray_direction(4, 4) - Vec3::Z).length() < 1e-6);

    let (color, result) = ctx.trace(4, 4);
    assert_eq!(result.color.w, 0.0, "clouds occlude the center ray");
    assert_eq!(result.termination, Termination::DrawDistance);

    let sky = params.background + 0.4 * params.sun_glow + params.sun_core;
    let expected = sky + 0.2 * params.sun_glare;
    assert!((color - expected).length() < 1e-4);

    // Sun core saturates the tonemapped center pixel
    assert_eq!(ctx.shade(4, 4), tonemap(expected).extend(1.0));
    assert_eq!(ctx.shade(4, 4), glam::Vec4::ONE);
}

#[test]
fn test_default_view_starts_clear_with_the_sun_ahead() {
    let params = SceneParameters::default();
    let lattices = flat_lattices();
    let camera = CameraState::default();
    let ctx = FrameContext::new(&params, camera, &lattices, 9, 9, 0.0, &AudioSignal::default());
    let frame = CameraFrame::new(&params, camera);

    // Camera sits on the path origin and looks down +z
    assert_eq!(frame.origin, PathModel::new(&params).at(0.0));
    let dir = ctx.ray_direction(4, 4);
    assert!((dir - frame.basis.forward).length() < 1e-5);
    assert!(dir.z > 0.85);
    assert!(ctx.sun_dir().dot(dir) > 0.8, "sun is in front of the camera");

    // The path bends away within ten units, so only the stretch still inside
    // the tube is guaranteed free of cloud
    let noise = NoiseField::from_params(&lattices.noise, &params, 0.0);
    let field = DensityField::new(&params, camera, noise, 0.0);
    let path = PathModel::new(&params);
    for i in 0..=16 {
        let p = frame.origin + dir * (i as f32 * 0.25);
        let offset = (p - path.at(p.z)).truncate().length();
        assert!(offset < params.tunnel_radius, "left the tube at {p}");
        assert_eq!(field.density(p, FULL_DETAIL_OCTAVES), 0.0, "cloud at {p}");
    }
}

#[test]
fn test_sun_fades_toward_background_off_axis() {
    let params = straight_tunnel();
    let renderer = Renderer::new(params.clone(), flat_lattices()).unwrap();
    let ctx = renderer.frame_context(9, 9, 0.0, &AudioSignal::default());

    let (center, _) = ctx.trace(4, 4);
    let (edge, _) = ctx.trace(0, 4);
    assert!(edge.length() < center.length());
}

#[test]
fn test_zero_cloud_density_is_transparent_inside_the_tunnel() {
    // A narrow view and short draw distance keep every ray inside the tube
    let params = SceneParameters {
        cloud_density: 0.0,
        cam_fov: 12.0,
        draw_distance: 10.0,
        ..straight_tunnel()
    };

    for seed in [1, 7, 99] {
        for kernel in NoiseKernel::ALL {
            let params = SceneParameters {
                noise_a: kernel,
                ..params.clone()
            };
            let lattices = seeded_lattices(seed);
            let ctx = FrameContext::new(
                &params,
                CameraState::default(),
                &lattices,
                9,
                9,
                seed as f32,
                &AudioSignal::default(),
            );
            for row in 0..9 {
                for x in 0..9 {
                    let (_, result) = ctx.trace(x, row);
                    assert_eq!(result.color.w, 0.0, "seed {seed}, {kernel}, pixel ({x}, {row})");
                }
            }
        }
    }
}

/// Noise that depends only on the lateral coordinates
struct Columns;

impl NoiseSource for Columns {
    fn evaluate(&self, coord: Vec3) -> f32 {
        (coord.x * 3.1).sin() * (coord.y * 1.7).cos()
    }
}

fn density_one_second_apart(params: &SceneParameters) -> (DensityField<Columns>, DensityField<Columns>) {
    let mut integrator = CameraIntegrator::new();
    let first = DensityField::new(params, integrator.state(), Columns, 0.0);
    integrator.advance(params, 1.0);
    let second = DensityField::new(params, integrator.state(), Columns, 1.0);
    (first, second)
}

fn probe_points() -> impl Iterator<Item = Vec3> {
    (0..300).map(|i| {
        let f = i as f32;
        Vec3::new((f * 0.61).sin() * 2.6, 2.5 + (f * 0.37).cos() * 2.6, f * 0.11)
    })
}

#[test]
fn test_field_without_vortex_is_unchanged_one_second_later() {
    let params = SceneParameters {
        vortex_twist: 0.0,
        vortex_speed: 0.0,
        ..Default::default()
    };
    let (first, second) = density_one_second_apart(&params);

    for p in probe_points() {
        assert_eq!(first.twist_angle(p.z), 0.0);
        assert_eq!(second.twist_angle(p.z), 0.0);
        assert_eq!(first.density(p, 5), second.density(p, 5), "at {p}");
    }
}

#[test]
fn test_field_with_vortex_rotates_over_one_second() {
    let params = SceneParameters::default();
    let (first, second) = density_one_second_apart(&params);

    let changed = probe_points().any(|p| (first.density(p, 5) - second.density(p, 5)).abs() > 1e-3);
    assert!(changed);
}

#[test]
fn test_lightning_brightens_frames() {
    let calm = SceneParameters {
        render_steps: 60,
        ..Default::default()
    };
    let storm = SceneParameters {
        lightning_enabled: true,
        lightning_chance: 1.0,
        lightning_intensity: 4.0,
        ..calm.clone()
    };
    let audio = AudioSignal::default();
    // Peak of the third strike slot
    let time = 2.2 / 8.0;

    let total = |params: SceneParameters| {
        let renderer = Renderer::new(params, seeded_lattices(5)).unwrap();
        let frame = renderer.render_frame(16, 9, time, &audio);
        frame.pixels().iter().map(|p| p.x + p.y + p.z).sum::<f32>()
    };
    assert!(total(storm) > total(calm));
}
