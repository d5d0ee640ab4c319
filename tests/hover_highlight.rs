use dusk_diorama::color::rgb_from_hex;
use dusk_diorama::config::HoverConfig;
use dusk_diorama::controller::{HoverState, HoverTransition};
use dusk_diorama::ecs::{DioramaWorld, PropCategory};
use dusk_diorama::events::DioramaEvent;
use dusk_diorama::tween::TweenChannel;
use glam::{Quat, Vec3};

fn settle_at(world: &mut DioramaWorld, elapsed: f32) {
    world.set_elapsed(elapsed);
    world.settle();
}

#[test]
fn repeated_hits_do_not_restart_the_highlight() {
    let mut world = DioramaWorld::default();
    let config = HoverConfig::default();
    let gypsum = world.spawn_prop(PropCategory::Gypsum, Vec3::new(0.0, 0.1, 6.0), Quat::IDENTITY);
    let mut hover = HoverState::None;

    assert_eq!(hover.update(Some(gypsum), &mut world, &config), HoverTransition::Entered(gypsum));
    settle_at(&mut world, 0.1);
    let started = world.tweens().get(gypsum, TweenChannel::Color).expect("highlight").started_at();
    for frame in 2..10 {
        world.set_elapsed(frame as f32 * 0.01 + 0.1);
        assert_eq!(hover.update(Some(gypsum), &mut world, &config), HoverTransition::Unchanged);
    }
    let tween = world.tweens().get(gypsum, TweenChannel::Color).expect("highlight");
    assert_eq!(tween.started_at(), started);
    let entered = world
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, DioramaEvent::HoverEntered { .. }))
        .count();
    assert_eq!(entered, 1);
}

#[test]
fn leaving_restores_the_original_color() {
    let mut world = DioramaWorld::default();
    let config = HoverConfig::default();
    let brick = world.spawn_prop(PropCategory::Brick, Vec3::new(1.0, 0.05, 6.0), Quat::IDENTITY);
    let original = world.prop_color(brick).expect("color");
    let mut hover = HoverState::None;

    hover.update(Some(brick), &mut world, &config);
    settle_at(&mut world, 0.0);
    settle_at(&mut world, 0.3);
    assert_eq!(world.prop_color(brick), Some(rgb_from_hex(0xff0000)));

    assert_eq!(hover.update(None, &mut world, &config), HoverTransition::Exited(brick));
    settle_at(&mut world, 0.3);
    settle_at(&mut world, 0.6);
    assert_eq!(world.prop_color(brick), Some(original));
    assert!(!hover.is_hovering());
}

#[test]
fn quick_in_and_out_never_leaves_the_highlight_behind() {
    let mut world = DioramaWorld::default();
    let config = HoverConfig::default();
    let log = world.spawn_prop(PropCategory::Log, Vec3::new(0.0, 0.1, 6.0), Quat::IDENTITY);
    let brick = world.spawn_prop(PropCategory::Brick, Vec3::new(2.0, 0.05, 6.0), Quat::IDENTITY);
    let mut hover = HoverState::None;

    let mut t = 0.0;
    for target in [Some(log), Some(brick), Some(log), None, Some(brick), None] {
        hover.update(target, &mut world, &config);
        settle_at(&mut world, t);
        t += 0.05;
    }
    settle_at(&mut world, t + 1.0);
    assert_eq!(world.prop_color(log), world.base_color(log));
    assert_eq!(world.prop_color(brick), world.base_color(brick));
}

#[test]
fn highlight_color_comes_from_config() {
    let mut world = DioramaWorld::default();
    let config: HoverConfig =
        serde_json::from_str(r##"{"highlight_color":"#00ff00","duration":0.5,"ease":"linear"}"##).expect("config");
    let log = world.spawn_prop(PropCategory::Log, Vec3::new(0.0, 0.1, 6.0), Quat::IDENTITY);
    let mut hover = HoverState::None;

    hover.update(Some(log), &mut world, &config);
    settle_at(&mut world, 0.0);
    settle_at(&mut world, 0.25);
    let base = rgb_from_hex(0xcc8d48);
    let halfway = base.lerp(Vec3::new(0.0, 1.0, 0.0), 0.5);
    assert!((world.prop_color(log).expect("color") - halfway).length() < 1e-4);
    settle_at(&mut world, 0.5);
    assert_eq!(world.prop_color(log), Some(Vec3::new(0.0, 1.0, 0.0)));
}
