use crate::ecs::types::{MaterialColor, SceneElapsed, Transform3D};
use crate::environment::{EnvironmentState, EnvironmentTimeline};
use crate::events::{DioramaEvent, EventBus};
use crate::tween::{TweenChannel, TweenSample, TweenScheduler};
use bevy_ecs::prelude::{Query, Res, ResMut};
use glam::Vec2;

/// Writes every running tween's value for the current elapsed time. Tweens whose entity
/// disappeared are dropped.
pub fn sys_advance_tweens(
    elapsed: Res<SceneElapsed>,
    mut tweens: ResMut<TweenScheduler>,
    mut props: Query<(&mut Transform3D, &mut MaterialColor)>,
) {
    let now = elapsed.0;
    for (entity, channel) in tweens.keys() {
        let Ok((mut transform, mut color)) = props.get_mut(entity) else {
            tweens.cancel(entity, channel);
            continue;
        };
        match channel {
            TweenChannel::Color => {
                let current = color.0;
                if let Some(TweenSample::Value(value) | TweenSample::Finished(value)) =
                    tweens.sample(entity, channel, now, || current)
                {
                    color.0 = value;
                }
            }
            TweenChannel::GroundPosition => {
                let current = transform.translation;
                if let Some(TweenSample::Value(value) | TweenSample::Finished(value)) =
                    tweens.sample(entity, channel, now, || current)
                {
                    transform.set_ground_position(Vec2::new(value.x, value.z));
                }
            }
        }
    }
}

pub fn sys_sample_environment(
    elapsed: Res<SceneElapsed>,
    mut timeline: ResMut<EnvironmentTimeline>,
    mut state: ResMut<EnvironmentState>,
    mut events: ResMut<EventBus>,
) {
    *state = timeline.sample(elapsed.0);
    if timeline.take_finished(elapsed.0) {
        events.push(DioramaEvent::TimelineFinished { elapsed: elapsed.0 });
    }
}
