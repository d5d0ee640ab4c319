use crate::color::srgb_to_linear;
use crate::controller::CursorStyle;
use crate::ecs::{FireflyLight, PropInstance};
use crate::environment::EnvironmentState;
use anyhow::Result;
use bevy_ecs::prelude::Entity;
use glam::{Mat4, Vec3};
use std::collections::VecDeque;
use winit::dpi::PhysicalSize;
use winit::window::CursorIcon;

mod prop_pass;
mod window_surface;

use prop_pass::PropPass;
pub use window_surface::{SurfaceFrame, WindowSurface};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything observable about one composed frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub elapsed: f32,
    pub environment: EnvironmentState,
    pub camera_eye: Vec3,
    pub view_projection: Mat4,
    pub props: Vec<PropInstance>,
    pub fireflies: Vec<FireflyLight>,
    pub hovered: Option<Entity>,
    pub countdown: String,
    pub cursor: CursorStyle,
}

impl FrameSnapshot {
    pub fn prop(&self, entity: Entity) -> Option<&PropInstance> {
        self.props.iter().find(|prop| prop.entity == entity)
    }

    /// Linear-space clear color for the sky.
    pub fn clear_color(&self) -> wgpu::Color {
        let linear = srgb_to_linear(self.environment.background);
        wgpu::Color { r: linear.x as f64, g: linear.y as f64, b: linear.z as f64, a: 1.0 }
    }
}

pub trait SceneRenderer {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<()>;
    fn resize(&mut self, size: PhysicalSize<u32>);
}

/// Keeps the most recent snapshots instead of drawing them.
pub struct HeadlessRenderer {
    frames: VecDeque<FrameSnapshot>,
    history: usize,
    rendered: u64,
    size: PhysicalSize<u32>,
}

impl HeadlessRenderer {
    pub const DEFAULT_HISTORY: usize = 240;

    pub fn new(size: PhysicalSize<u32>) -> Self {
        Self::with_history(size, Self::DEFAULT_HISTORY)
    }

    pub fn with_history(size: PhysicalSize<u32>, history: usize) -> Self {
        Self { frames: VecDeque::new(), history: history.max(1), rendered: 0, size }
    }

    pub fn last(&self) -> Option<&FrameSnapshot> {
        self.frames.back()
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameSnapshot> + '_ {
        self.frames.iter()
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<()> {
        if self.frames.len() == self.history {
            self.frames.pop_front();
        }
        self.frames.push_back(frame.clone());
        self.rendered += 1;
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }
}

/// Presents frames to the window: clears to the sky color, draws the props and firefly markers,
/// and mirrors the countdown into the title and the cursor style into the window cursor.
pub struct WindowRenderer {
    surface: WindowSurface,
    props: PropPass,
    base_title: String,
    shown_countdown: Option<String>,
    shown_cursor: Option<CursorStyle>,
}

impl WindowRenderer {
    pub fn new(surface: WindowSurface, base_title: impl Into<String>) -> Self {
        Self {
            surface,
            props: PropPass::new(),
            base_title: base_title.into(),
            shown_countdown: None,
            shown_cursor: None,
        }
    }

    pub fn surface(&self) -> &WindowSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut WindowSurface {
        &mut self.surface
    }

    fn sync_window_chrome(&mut self, frame: &FrameSnapshot) {
        let Some(window) = self.surface.window() else {
            return;
        };
        if self.shown_countdown.as_deref() != Some(frame.countdown.as_str()) {
            window.set_title(&format!("{} - {}", self.base_title, frame.countdown));
            self.shown_countdown = Some(frame.countdown.clone());
        }
        if self.shown_cursor != Some(frame.cursor) {
            window.set_cursor(cursor_icon(frame.cursor));
            self.shown_cursor = Some(frame.cursor);
        }
    }
}

impl SceneRenderer for WindowRenderer {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<()> {
        self.sync_window_chrome(frame);
        let Some(target) = self.surface.acquire_surface_frame()? else {
            log::debug!("Skipped frame {}", frame.frame);
            return Ok(());
        };
        let (device, queue) = self.surface.device_and_queue()?;
        self.props.prepare(device, queue, self.surface.surface_format()?, frame)?;
        let depth_view = self.surface.depth_view()?;
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Diorama Frame") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Diorama Scene"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(frame.clear_color()), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.props.draw(&mut pass);
        }
        queue.submit(Some(encoder.finish()));
        target.present();
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface.resize(size);
    }
}

pub fn cursor_icon(style: CursorStyle) -> CursorIcon {
    match style {
        CursorStyle::Default => CursorIcon::Default,
        CursorStyle::Pointer => CursorIcon::Pointer,
    }
}
