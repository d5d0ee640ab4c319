use dusk_diorama::camera3d::Camera3D;
use dusk_diorama::config::CameraConfig;
use dusk_diorama::ecs::{DioramaWorld, PointLight, PropCategory};
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;
use winit::dpi::PhysicalSize;

#[test]
fn pick_prop_hits_rotated_log() {
    let mut world = DioramaWorld::default();
    // Lying on its side: the long axis now runs along world Z.
    let rotation = Quat::from_rotation_x(FRAC_PI_2);
    let log = world.spawn_prop(PropCategory::Log, Vec3::new(0.0, 0.1, 0.0), rotation);

    let down = Vec3::NEG_Y;
    assert_eq!(world.pick_prop(Vec3::new(0.0, 5.0, 0.3), down, &PropCategory::ALL), Some(log));
    assert_eq!(world.pick_prop(Vec3::new(0.3, 5.0, 0.0), down, &PropCategory::ALL), None);
}

#[test]
fn pick_is_restricted_to_candidate_categories() {
    let mut world = DioramaWorld::default();
    let brick = world.spawn_prop(PropCategory::Brick, Vec3::new(0.0, 0.05, 2.0), Quat::IDENTITY);
    let gypsum = world.spawn_prop(PropCategory::Gypsum, Vec3::new(0.0, 0.05, 0.0), Quat::IDENTITY);
    let origin = Vec3::new(0.0, 0.05, 10.0);

    assert_eq!(world.pick_prop(origin, Vec3::NEG_Z, &PropCategory::ALL), Some(brick));
    assert_eq!(world.pick_prop(origin, Vec3::NEG_Z, &[PropCategory::Gypsum]), Some(gypsum));
    assert_eq!(world.pick_prop(origin, Vec3::NEG_Z, &[]), None);
    assert_eq!(world.pick_prop(origin, Vec3::ZERO, &PropCategory::ALL), None, "degenerate ray");
}

#[test]
fn fireflies_and_pile_pieces_are_not_pickable() {
    let mut world = DioramaWorld::default();
    world.spawn_pile_piece(PropCategory::Log, Vec3::ZERO, Quat::IDENTITY);
    let light = PointLight { color: Vec3::Y, intensity: 0.4, range: 3.0 };
    world.spawn_firefly(0, light);
    let origin = Vec3::new(0.0, 0.0, 10.0);
    assert_eq!(world.pick_prop(origin, Vec3::NEG_Z, &PropCategory::ALL), None);
    assert_eq!(world.firefly_lights().len(), 1);
}

#[test]
fn screen_ray_through_projected_prop_picks_it() {
    let mut world = DioramaWorld::default();
    let gypsum = world.spawn_prop(PropCategory::Gypsum, Vec3::new(-1.5, 0.1, 6.5), Quat::IDENTITY);
    let camera = Camera3D::from_config(&CameraConfig::default());
    let viewport = PhysicalSize::new(1280, 720);

    let screen = camera.project_point(Vec3::new(-1.5, 0.1, 6.5), viewport).expect("visible");
    let (origin, dir) = camera.screen_ray(screen, viewport).expect("ray");
    assert_eq!(world.pick_prop(origin, dir, &PropCategory::ALL), Some(gypsum));

    let (origin, dir) = camera.screen_ray(screen + Vec2::new(200.0, 0.0), viewport).expect("ray");
    assert_eq!(world.pick_prop(origin, dir, &PropCategory::ALL), None);
}
