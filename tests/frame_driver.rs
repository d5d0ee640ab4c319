use dusk_diorama::color::rgb_from_hex;
use dusk_diorama::config::AppConfig;
use dusk_diorama::controller::{CursorStyle, HoverTransition, RelocationOutcome};
use dusk_diorama::ecs::{FireflyPath, PropCategory};
use dusk_diorama::events::{DioramaEvent, SkipReason};
use dusk_diorama::layout::DioramaLayout;
use dusk_diorama::renderer::HeadlessRenderer;
use dusk_diorama::time::Time;
use dusk_diorama::FrameDriver;
use glam::{Quat, Vec2, Vec3};
use winit::dpi::PhysicalSize;

const VIEWPORT: PhysicalSize<u32> = PhysicalSize::new(800, 600);

fn still_camera_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.timeline.camera_intro.enabled = false;
    config
}

fn driver(config: AppConfig) -> FrameDriver<HeadlessRenderer> {
    FrameDriver::new(config, Time::manual(), HeadlessRenderer::new(VIEWPORT), VIEWPORT)
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

fn screen_position(driver: &FrameDriver<HeadlessRenderer>, point: Vec3) -> Vec2 {
    driver.camera().project_point(point, driver.viewport()).expect("point in front of the camera")
}

#[test]
fn hover_relocate_and_leave() {
    let mut driver = driver(still_camera_config());
    let spot = Vec3::new(1.0, 0.1, 6.0);
    let log = driver.world_mut().spawn_prop(PropCategory::Log, spot, Quat::IDENTITY);
    let base = rgb_from_hex(0xcc8d48);
    let red = rgb_from_hex(0xff0000);

    let screen = screen_position(&driver, spot);
    driver.pointer_move(screen.x, screen.y);
    let report = driver.tick().expect("tick");
    assert_eq!(report.hover, HoverTransition::Entered(log));
    assert_eq!(report.cursor, CursorStyle::Pointer);
    assert!(report.events.contains(&DioramaEvent::HoverEntered { entity: log, category: PropCategory::Log }));

    driver.advance_clock(0.25);
    let report = driver.tick().expect("tick");
    assert_eq!(report.hover, HoverTransition::Unchanged);
    assert_eq!(driver.world().prop_color(log), Some(red), "highlight lands on the exact target");

    match driver.confirm() {
        RelocationOutcome::Started { entity, category, anchor, .. } => {
            assert_eq!(entity, log);
            assert_eq!(category, PropCategory::Log);
            assert_eq!(anchor, Vec2::new(0.0, 9.5));
        }
        RelocationOutcome::Skipped(reason) => panic!("relocation skipped: {reason}"),
    }

    driver.advance_clock(1.0);
    driver.pointer_left();
    let report = driver.tick().expect("tick");
    assert_eq!(report.hover, HoverTransition::Exited(log));
    assert_eq!(report.cursor, CursorStyle::Default);
    assert!(report
        .events
        .iter()
        .any(|event| matches!(event, DioramaEvent::RelocationStarted { entity, .. } if *entity == log)));
    let resting = driver.world().prop_translation(log).expect("log still exists");
    assert!(approx_vec3(resting, Vec3::new(0.0, 0.1, 9.5)), "resting at {resting:?}");

    driver.advance_clock(0.15);
    driver.tick().expect("tick");
    let fading = driver.world().prop_color(log).expect("color");
    assert_ne!(fading, base, "restore is still running");
    assert_ne!(fading, red);

    driver.advance_clock(0.1);
    let report = driver.tick().expect("tick");
    assert!((report.elapsed - 1.5).abs() < 1e-4, "restore ends at 1.5 s, ticked at {}", report.elapsed);
    assert_eq!(driver.world().prop_color(log), Some(base), "restore lands on the base color");
    assert!(driver.world().tweens().is_empty());

    driver.advance_clock(0.2);
    driver.tick().expect("tick");
    assert_eq!(driver.world().prop_color(log), Some(base));
}

#[test]
fn confirm_without_hover_is_skipped() {
    let mut driver = driver(still_camera_config());
    driver.tick().expect("tick");
    assert_eq!(driver.confirm(), RelocationOutcome::Skipped(SkipReason::NoHover));
    let report = driver.tick().expect("tick");
    assert!(report.events.contains(&DioramaEvent::RelocationSkipped { reason: SkipReason::NoHover }));
}

#[test]
fn empty_world_ticks_cleanly() {
    let mut driver = driver(still_camera_config());
    for _ in 0..3 {
        driver.advance_clock(1.0 / 60.0);
        let report = driver.tick().expect("tick");
        assert_eq!(report.hovered, None);
        assert_eq!(report.cursor, CursorStyle::Default);
    }
    assert_eq!(driver.frame_count(), 3);
    let last = driver.renderer().last().expect("snapshot");
    assert!(last.props.is_empty());
    assert!(last.fireflies.is_empty());
    assert_eq!(driver.renderer().rendered(), 3);
}

#[test]
fn countdown_rounds_half_up_and_stops_at_zero() {
    let mut driver = driver(still_camera_config());
    assert_eq!(driver.state().countdown, "100");
    driver.tick().expect("tick");
    assert_eq!(driver.state().countdown, "100");
    driver.advance_clock(0.6);
    assert_eq!(driver.tick().expect("tick").countdown, "99");
    driver.advance_clock(98.5);
    assert_eq!(driver.tick().expect("tick").countdown, "1");
    driver.advance_clock(1.0);
    assert_eq!(driver.tick().expect("tick").countdown, "0");
    driver.advance_clock(50.0);
    assert_eq!(driver.tick().expect("tick").countdown, "0");
}

#[test]
fn fireflies_follow_their_path() {
    let config = still_camera_config();
    let path = FireflyPath::from_config(&config.fireflies);
    let mut driver = driver(config);
    let layout = DioramaLayout { props: Vec::new(), pile_pieces: Vec::new(), firefly_count: 2 };
    driver.populate(&layout);

    driver.advance_clock(3.0);
    driver.tick().expect("tick");
    let snapshot = driver.renderer().last().expect("snapshot");
    assert_eq!(snapshot.fireflies.len(), 2);
    for firefly in &snapshot.fireflies {
        assert!(approx_vec3(firefly.position, path.position(snapshot.elapsed, firefly.index)));
    }
    let gap = snapshot.fireflies[1].position - snapshot.fireflies[0].position;
    assert!(approx_vec3(gap, Vec3::new(path.radius_step, 0.0, -path.radius_step)));
}

#[test]
fn timeline_finished_is_reported_once() {
    let mut config = still_camera_config();
    config.timeline.fade_duration = 1.0;
    config.timeline.door_light.delay = 0.5;
    config.timeline.door_light.duration = 1.0;
    let mut driver = driver(config);

    let mut finished = 0;
    for _ in 0..30 {
        driver.advance_clock(0.1);
        let report = driver.tick().expect("tick");
        finished += report.events.iter().filter(|event| matches!(event, DioramaEvent::TimelineFinished { .. })).count();
    }
    assert_eq!(finished, 1);
    let environment = driver.world().environment();
    assert_eq!(environment.ambient_intensity, 0.0);
    assert_eq!(environment.door_light_intensity, 12.0);
}

#[test]
fn camera_intro_ends_at_configured_eye() {
    let config = AppConfig::default();
    let eye = config.camera.eye();
    let mut driver = driver(config);
    driver.tick().expect("tick");
    assert!(!approx_vec3(driver.camera().position, eye), "intro starts elsewhere");

    driver.advance_clock(2.0);
    driver.tick().expect("tick");
    assert!((driver.camera().position - eye).length() < 1e-3, "camera at {:?}", driver.camera().position);
}

#[test]
fn resize_keeps_hover_and_ignores_zero_sizes() {
    let mut driver = driver(still_camera_config());
    let spot = Vec3::new(-1.0, 0.1, 6.5);
    let brick = driver.world_mut().spawn_prop(PropCategory::Brick, spot, Quat::IDENTITY);
    let screen = screen_position(&driver, spot);
    driver.pointer_move(screen.x, screen.y);
    driver.tick().expect("tick");
    assert_eq!(driver.state().hover.entity(), Some(brick));

    driver.viewport_resize(0, 0);
    assert_eq!(driver.viewport(), VIEWPORT);

    driver.viewport_resize(1600, 1200);
    assert_eq!(driver.renderer().size(), PhysicalSize::new(1600, 1200));
    // Same aspect ratio: the prop sits under the scaled pointer.
    driver.pointer_move(screen.x * 2.0, screen.y * 2.0);
    let report = driver.tick().expect("tick");
    assert_eq!(report.hover, HoverTransition::Unchanged);
    assert_eq!(report.hovered, Some(brick));
}

#[test]
fn despawned_hover_target_is_released() {
    let mut driver = driver(still_camera_config());
    let spot = Vec3::new(0.5, 0.1, 7.0);
    let gypsum = driver.world_mut().spawn_prop(PropCategory::Gypsum, spot, Quat::IDENTITY);
    let screen = screen_position(&driver, spot);
    driver.pointer_move(screen.x, screen.y);
    driver.tick().expect("tick");

    assert!(driver.world_mut().despawn_entity(gypsum));
    let report = driver.tick().expect("tick");
    assert_eq!(report.hover, HoverTransition::Exited(gypsum));
    assert_eq!(report.hovered, None);
    assert_eq!(driver.confirm(), RelocationOutcome::Skipped(SkipReason::NoHover));
}
