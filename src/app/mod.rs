mod headless;

use crate::cli::CliOverrides;
use crate::config::{AppConfig, AppConfigOverrides};
use crate::frame::{FrameDriver, FrameReport};
use crate::input::{Input, InputEvent};
use crate::layout::DioramaLayout;
use crate::renderer::{WindowRenderer, WindowSurface};
use crate::time::Time;
use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};

pub use headless::{run_headless, HeadlessSummary};

pub const CONFIG_PATH: &str = "config/diorama.json";
pub const INPUT_CONFIG_PATH: &str = "config/input.json";

pub fn run(cli: CliOverrides) -> Result<()> {
    let config = load_config(&cli.config_overrides());
    let seed = config.scatter.seed.unwrap_or_else(rand::random);
    log::info!("Dusk diorama starting with layout seed {seed}");
    if let Some(seconds) = cli.headless_seconds() {
        let summary = run_headless(config, seed, seconds)?;
        log::info!("{summary}");
        return Ok(());
    }
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    let mut app = App::new(config, seed);
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    Ok(())
}

pub fn load_config(overrides: &AppConfigOverrides) -> AppConfig {
    let mut config = AppConfig::load_or_default(CONFIG_PATH);
    if !overrides.is_empty() {
        log::info!("Applying CLI overrides: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(overrides);
    }
    config
}

pub fn log_report(report: &FrameReport) {
    for event in &report.events {
        log::debug!("[frame {}] {event}", report.frame);
    }
}

pub struct App {
    driver: FrameDriver<WindowRenderer>,
    input: Input,
    should_close: bool,
}

impl App {
    pub fn new(config: AppConfig, seed: u64) -> Self {
        let size = PhysicalSize::new(config.window.width, config.window.height);
        let renderer = WindowRenderer::new(WindowSurface::new(&config.window), config.window.title.clone());
        let layout = DioramaLayout::seeded(&config, seed);
        let mut driver = FrameDriver::new(config, Time::new(), renderer, size);
        let props = driver.populate(&layout);
        log::info!(
            "Scene ready: {} interactive props, {} pile pieces, {} fireflies",
            props.len(),
            layout.pile_pieces.len(),
            layout.firefly_count
        );
        Self { driver, input: Input::from_config(INPUT_CONFIG_PATH), should_close: false }
    }

    fn apply_input(&mut self) {
        match self.input.cursor_position() {
            Some(pos) => self.driver.pointer_move(pos.x, pos.y),
            None => self.driver.pointer_left(),
        }
        if let Some(delta) = self.input.take_drag_delta() {
            self.driver.orbit_drag(delta);
        }
        if let Some(wheel) = self.input.consume_wheel_delta() {
            self.driver.zoom(wheel);
        }
        for _ in 0..self.input.take_confirms() {
            self.driver.confirm();
        }
        if self.input.take_quit() {
            self.should_close = true;
        }
        self.input.clear_frame();
    }

    fn redraw(&mut self) {
        self.apply_input();
        match self.driver.tick() {
            Ok(report) => log_report(&report),
            Err(err) => {
                log::error!("Frame {} failed: {err:?}", self.driver.frame_count());
                self.should_close = true;
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let surface = self.driver.renderer_mut().surface_mut();
        if let Err(err) = surface.ensure_window(event_loop) {
            log::error!("Renderer initialization error: {err:?}");
            self.should_close = true;
            return;
        }
        let size = surface.size();
        self.driver.viewport_resize(size.width, size.height);
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, _id: winit::window::WindowId, event: WindowEvent) {
        self.input.push(InputEvent::from_window_event(&event));
        match &event {
            WindowEvent::CloseRequested => self.should_close = true,
            WindowEvent::Resized(size) => self.driver.viewport_resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close {
            event_loop.exit();
            return;
        }
        self.driver.renderer().surface().request_redraw();
    }
}
