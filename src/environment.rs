//! Dusk timeline: lighting, background and fog fade from day to night once per session.
//!
//! The timeline is a fixed list of [`TimelineEvent`]s, each scheduled from scene start
//! rather than chained to the previous one. Sampling is a pure function of elapsed time,
//! so replaying an elapsed-time sequence always produces the same environment.

use crate::config::{CameraConfig, TimelineConfig};
use crate::tween::Ease;
use bevy_ecs::prelude::Resource;
use glam::Vec3;

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentState {
    pub ambient_intensity: f32,
    pub moon_intensity: f32,
    pub door_light_intensity: f32,
    pub background: Vec3,
    pub fog_color: Vec3,
    pub fog_near: f32,
    pub fog_far: f32,
    /// Eye position requested by the camera intro, if the timeline has one.
    pub camera_eye: Option<Vec3>,
}

impl EnvironmentState {
    pub fn daylight(config: &TimelineConfig) -> Self {
        Self {
            ambient_intensity: config.ambient_intensity,
            moon_intensity: config.moon_intensity,
            door_light_intensity: 0.0,
            background: config.day_color.rgb(),
            fog_color: config.day_color.rgb(),
            fog_near: config.fog_near,
            fog_far: config.fog_far,
            camera_eye: None,
        }
    }
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::daylight(&TimelineConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineTrack {
    AmbientIntensity { from: f32, to: f32 },
    MoonIntensity { from: f32, to: f32 },
    DoorLightIntensity { from: f32, to: f32 },
    Background { from: Vec3, to: Vec3 },
    FogColor { from: Vec3, to: Vec3 },
    CameraEye { from: Vec3, to: Vec3 },
}

impl TimelineTrack {
    fn apply(&self, t: f32, state: &mut EnvironmentState) {
        let lerp = |from: f32, to: f32| from + (to - from) * t;
        match *self {
            TimelineTrack::AmbientIntensity { from, to } => state.ambient_intensity = lerp(from, to),
            TimelineTrack::MoonIntensity { from, to } => state.moon_intensity = lerp(from, to),
            TimelineTrack::DoorLightIntensity { from, to } => state.door_light_intensity = lerp(from, to),
            TimelineTrack::Background { from, to } => state.background = from.lerp(to, t),
            TimelineTrack::FogColor { from, to } => state.fog_color = from.lerp(to, t),
            TimelineTrack::CameraEye { from, to } => state.camera_eye = Some(from.lerp(to, t)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEvent {
    pub label: &'static str,
    pub start_offset: f32,
    pub duration: f32,
    pub ease: Ease,
    pub track: TimelineTrack,
}

impl TimelineEvent {
    /// Normalised progress at `elapsed`, 0 before the event starts and 1 once it is over.
    pub fn progress(&self, elapsed: f32) -> f32 {
        if elapsed < self.start_offset {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((elapsed - self.start_offset) / self.duration).clamp(0.0, 1.0)
    }

    pub fn end(&self) -> f32 {
        self.start_offset + self.duration.max(0.0)
    }

    pub fn is_finished(&self, elapsed: f32) -> bool {
        elapsed >= self.end()
    }

    pub fn apply(&self, t: f32, state: &mut EnvironmentState) {
        let eased = if t >= 1.0 { 1.0 } else { self.ease.apply(t) };
        self.track.apply(eased, state);
    }
}

#[derive(Resource, Debug, Clone)]
pub struct EnvironmentTimeline {
    initial: EnvironmentState,
    events: Vec<TimelineEvent>,
    finish_reported: bool,
}

impl EnvironmentTimeline {
    pub fn new(initial: EnvironmentState, events: Vec<TimelineEvent>) -> Self {
        Self { initial, events, finish_reported: false }
    }

    /// The dusk sequence of the diorama: lights fade out, sky and fog darken, the door
    /// light warms up after a delay and the camera glides into its resting spot.
    pub fn dusk(config: &TimelineConfig, camera: &CameraConfig) -> Self {
        let initial = EnvironmentState::daylight(config);
        let dusk = config.dusk_color.rgb();
        let fade = |label, track| TimelineEvent {
            label,
            start_offset: 0.0,
            duration: config.fade_duration,
            ease: config.fade_ease,
            track,
        };
        let mut events = vec![
            fade("moon_fade", TimelineTrack::MoonIntensity { from: initial.moon_intensity, to: 0.0 }),
            fade("ambient_fade", TimelineTrack::AmbientIntensity { from: initial.ambient_intensity, to: 0.0 }),
            fade("sky_darken", TimelineTrack::Background { from: initial.background, to: dusk }),
            fade("fog_darken", TimelineTrack::FogColor { from: initial.fog_color, to: dusk }),
            TimelineEvent {
                label: "door_light",
                start_offset: config.door_light.delay,
                duration: config.door_light.duration,
                ease: config.door_light.ease,
                track: TimelineTrack::DoorLightIntensity {
                    from: initial.door_light_intensity,
                    to: config.door_light.target_intensity,
                },
            },
        ];
        if config.camera_intro.enabled {
            events.push(TimelineEvent {
                label: "camera_intro",
                start_offset: 0.0,
                duration: config.camera_intro.duration,
                ease: config.camera_intro.ease,
                track: TimelineTrack::CameraEye {
                    from: Vec3::from_array(config.camera_intro.from),
                    to: camera.eye(),
                },
            });
        }
        Self::new(initial, events)
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn initial(&self) -> EnvironmentState {
        self.initial
    }

    pub fn sample(&self, elapsed: f32) -> EnvironmentState {
        let mut state = self.initial;
        for event in &self.events {
            event.apply(event.progress(elapsed), &mut state);
        }
        state
    }

    /// `true` while the camera intro still drives the eye.
    pub fn camera_intro_running(&self, elapsed: f32) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event.track, TimelineTrack::CameraEye { .. }) && !event.is_finished(elapsed))
    }

    pub fn is_finished(&self, elapsed: f32) -> bool {
        self.events.iter().all(|event| event.is_finished(elapsed))
    }

    pub fn duration(&self) -> f32 {
        self.events.iter().map(TimelineEvent::end).fold(0.0, f32::max)
    }

    /// Reports completion exactly once.
    pub(crate) fn take_finished(&mut self, elapsed: f32) -> bool {
        if self.finish_reported || !self.is_finished(elapsed) {
            return false;
        }
        self.finish_reported = true;
        true
    }
}

impl Default for EnvironmentTimeline {
    fn default() -> Self {
        Self::dusk(&TimelineConfig::default(), &CameraConfig::default())
    }
}

/// Countdown readout: seconds left, rounded half-up, clamped to "0" once time runs out.
pub fn countdown_text(total: f32, elapsed: f32) -> String {
    let remaining = (total - elapsed + 0.5).floor();
    if remaining > 0.0 {
        format!("{}", remaining as i64)
    } else {
        "0".to_string()
    }
}
