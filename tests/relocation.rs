use bevy_ecs::prelude::Entity;
use dusk_diorama::config::RelocationConfig;
use dusk_diorama::controller::{HoverState, RelocationController, RelocationOutcome};
use dusk_diorama::ecs::{DioramaWorld, PropCategory};
use dusk_diorama::events::SkipReason;
use dusk_diorama::tween::TweenChannel;
use glam::{Quat, Vec3};

fn hovering(world: &DioramaWorld, entity: Entity) -> HoverState {
    HoverState::Hovering { entity, saved_color: world.base_color(entity).expect("prop") }
}

#[test]
fn second_confirm_keeps_a_single_tween_to_the_same_anchor() {
    let mut world = DioramaWorld::default();
    let controller = RelocationController::new(RelocationConfig::default());
    let brick = world.spawn_prop(PropCategory::Brick, Vec3::new(3.0, 0.05, 5.0), Quat::IDENTITY);
    let hover = hovering(&world, brick);

    assert!(controller.confirm(&hover, &mut world).is_started());
    world.set_elapsed(0.4);
    world.settle();
    assert!(controller.confirm(&hover, &mut world).is_started());
    assert_eq!(world.tweens().active_count(), 1);

    world.set_elapsed(0.5);
    world.settle();
    world.set_elapsed(2.0);
    world.settle();
    let resting = world.prop_translation(brick).expect("brick");
    assert!((resting - Vec3::new(-2.0, 0.05, 9.5)).length() < 1e-5);
    assert!(world.tweens().get(brick, TweenChannel::GroundPosition).is_none());
}

#[test]
fn movement_decelerates_into_the_pile() {
    let mut world = DioramaWorld::default();
    let controller = RelocationController::new(RelocationConfig::default());
    let log = world.spawn_prop(PropCategory::Log, Vec3::new(4.0, 0.1, 5.5), Quat::IDENTITY);
    let start = world.prop_translation(log).expect("log");
    controller.confirm(&hovering(&world, log), &mut world);
    world.settle();

    let target = Vec3::new(0.0, 0.1, 9.5);
    let total = (target - start).length();
    let mut covered = Vec::new();
    for step in 1..=4 {
        world.set_elapsed(step as f32 * 0.25);
        world.settle();
        let position = world.prop_translation(log).expect("log");
        covered.push(total - (target - position).length());
    }
    assert!(covered[0] > total * 0.5, "most of the way covered in the first quarter");
    let gains: Vec<f32> = covered.windows(2).map(|pair| pair[1] - pair[0]).collect();
    assert!(gains.windows(2).all(|pair| pair[1] <= pair[0] + 1e-5));
    assert!((covered[3] - total).abs() < 1e-4);
}

#[test]
fn anchors_follow_config() {
    let mut config = RelocationConfig::default();
    config.anchors.insert(PropCategory::Gypsum, [5.0, -1.0]);
    config.anchors.remove(&PropCategory::Log);
    let controller = RelocationController::new(config);
    let mut world = DioramaWorld::default();
    let gypsum = world.spawn_prop(PropCategory::Gypsum, Vec3::new(0.0, 0.1, 6.0), Quat::IDENTITY);
    let log = world.spawn_prop(PropCategory::Log, Vec3::new(1.0, 0.1, 6.0), Quat::IDENTITY);

    match controller.confirm(&hovering(&world, gypsum), &mut world) {
        RelocationOutcome::Started { anchor, .. } => assert_eq!(anchor, glam::Vec2::new(5.0, -1.0)),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        controller.confirm(&hovering(&world, log), &mut world),
        RelocationOutcome::Skipped(SkipReason::MissingAnchor(PropCategory::Log))
    );
    assert!(world.tweens().get(log, TweenChannel::GroundPosition).is_none());
}
