//! Per-frame orchestration. One `tick` reads the clock, refreshes the countdown, moves the
//! fireflies, resolves hover and cursor, advances the orbit camera, settles tweens and the
//! environment timeline, then hands a snapshot to the renderer.

use crate::camera3d::{aspect_of, screen_to_ndc, Camera3D, OrbitControls};
use crate::config::AppConfig;
use crate::controller::{ControllerState, CursorStyle, HoverTransition, RelocationController, RelocationOutcome};
use crate::ecs::{DioramaWorld, PointLight, PropCategory};
use crate::environment::countdown_text;
use crate::events::DioramaEvent;
use crate::layout::DioramaLayout;
use crate::renderer::{FrameSnapshot, SceneRenderer};
use crate::time::Time;
use anyhow::Result;
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use winit::dpi::PhysicalSize;

/// What happened during one tick.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: f32,
    pub hovered: Option<Entity>,
    pub hover: HoverTransition,
    pub cursor: CursorStyle,
    pub countdown: String,
    pub events: Vec<DioramaEvent>,
}

pub struct FrameDriver<R: SceneRenderer> {
    config: AppConfig,
    clock: Time,
    world: DioramaWorld,
    state: ControllerState,
    relocation: RelocationController,
    camera: Camera3D,
    controls: OrbitControls,
    renderer: R,
    viewport: PhysicalSize<u32>,
    pointer: Option<Vec2>,
    /// The camera intro still owns the eye. Cleared one frame after the intro ends so its final
    /// position is applied exactly.
    intro_pending: bool,
    frame: u64,
}

impl<R: SceneRenderer> FrameDriver<R> {
    pub fn new(config: AppConfig, clock: Time, renderer: R, viewport: PhysicalSize<u32>) -> Self {
        let world = DioramaWorld::new(&config);
        let relocation = RelocationController::new(config.relocation.clone());
        let camera = Camera3D::from_config(&config.camera);
        let mut controls = OrbitControls::from_config(&config.camera);
        let intro_eye = world.timeline().sample(0.0).camera_eye;
        if let Some(eye) = intro_eye {
            controls.look_from(eye);
        }
        let mut state = ControllerState::new();
        state.countdown = countdown_text(config.timeline.countdown_total, 0.0);
        let mut driver = Self {
            config,
            clock,
            world,
            state,
            relocation,
            camera,
            controls,
            renderer,
            viewport,
            pointer: None,
            intro_pending: intro_eye.is_some(),
            frame: 0,
        };
        driver.controls.apply_to(&mut driver.camera);
        driver
    }

    /// Spawns `layout` plus one light per firefly. Returns the interactive props.
    pub fn populate(&mut self, layout: &DioramaLayout) -> Vec<Entity> {
        let fireflies = &self.config.fireflies;
        let light = PointLight { color: fireflies.color.rgb(), intensity: fireflies.intensity, range: fireflies.range };
        self.world.populate(layout, light)
    }

    pub fn tick(&mut self) -> Result<FrameReport> {
        self.clock.tick();
        let elapsed = self.clock.elapsed_seconds();
        let dt = self.clock.delta_seconds();
        self.world.set_elapsed(elapsed);

        self.state.countdown = countdown_text(self.config.timeline.countdown_total, elapsed);

        self.world.drive_ambient();

        let hit = self.pick_under_pointer();
        let hover = self.state.hover.update(hit, &mut self.world, &self.config.hover);

        self.state.cursor = if hit.is_some() { CursorStyle::Pointer } else { CursorStyle::Default };

        if self.intro_pending {
            if let Some(eye) = self.world.timeline().sample(elapsed).camera_eye {
                self.controls.look_from(eye);
            }
            self.intro_pending = self.world.timeline().camera_intro_running(elapsed);
        }
        self.controls.update(dt);
        self.controls.apply_to(&mut self.camera);

        self.world.settle();
        let snapshot = self.snapshot();
        self.renderer.render(&snapshot)?;

        let events = self.world.drain_events();
        let report = FrameReport {
            frame: self.frame,
            elapsed,
            hovered: self.state.hover.entity(),
            hover,
            cursor: self.state.cursor,
            countdown: self.state.countdown.clone(),
            events,
        };
        self.frame += 1;
        Ok(report)
    }

    fn pick_under_pointer(&mut self) -> Option<Entity> {
        let ndc = screen_to_ndc(self.pointer?, self.viewport)?;
        let (origin, dir) = self.camera.ndc_ray(ndc, aspect_of(self.viewport))?;
        self.world.pick_prop(origin, dir, &PropCategory::ALL)
    }

    fn snapshot(&mut self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            elapsed: self.world.elapsed(),
            environment: self.world.environment(),
            camera_eye: self.camera.position,
            view_projection: self.camera.view_projection(self.viewport),
            props: self.world.prop_instances(),
            fireflies: self.world.firefly_lights(),
            hovered: self.state.hover.entity(),
            countdown: self.state.countdown.clone(),
            cursor: self.state.cursor,
        }
    }

    /// Pointer position in window pixels.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = Some(Vec2::new(x, y));
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    /// Acts on the hover state as of the last tick.
    pub fn confirm(&mut self) -> RelocationOutcome {
        self.relocation.confirm(&self.state.hover, &mut self.world)
    }

    pub fn orbit_drag(&mut self, delta: Vec2) {
        self.controls.drag(delta, self.viewport.height);
    }

    pub fn zoom(&mut self, wheel_lines: f32) {
        // Wheel up pulls the eye in.
        self.controls.zoom(-wheel_lines);
    }

    /// Zero-sized viewports (minimised windows) are ignored.
    pub fn viewport_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = PhysicalSize::new(width, height);
        self.renderer.resize(self.viewport);
    }

    pub fn advance_clock(&mut self, seconds: f32) {
        self.clock.advance(seconds);
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed_seconds()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn world(&self) -> &DioramaWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut DioramaWorld {
        &mut self.world
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
