use super::log_report;
use crate::config::AppConfig;
use crate::events::DioramaEvent;
use crate::frame::FrameDriver;
use crate::layout::DioramaLayout;
use crate::renderer::HeadlessRenderer;
use crate::time::Time;
use anyhow::Result;
use std::fmt;
use winit::dpi::PhysicalSize;

const HEADLESS_HZ: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSummary {
    pub frames: u64,
    pub elapsed: f32,
    pub countdown: String,
    pub props: usize,
    pub fireflies: usize,
    pub timeline_finished: bool,
}

impl fmt::Display for HeadlessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Headless run: {} frames over {:.2}s, countdown {}, {} props, {} fireflies, timeline {}",
            self.frames,
            self.elapsed,
            self.countdown,
            self.props,
            self.fireflies,
            if self.timeline_finished { "finished" } else { "running" }
        )
    }
}

/// Runs the scene on a manual clock at a fixed rate for `seconds` of scene time.
pub fn run_headless(config: AppConfig, seed: u64, seconds: f32) -> Result<HeadlessSummary> {
    let size = PhysicalSize::new(config.window.width, config.window.height);
    let layout = DioramaLayout::seeded(&config, seed);
    let mut driver = FrameDriver::new(config, Time::manual(), HeadlessRenderer::new(size), size);
    let props = driver.populate(&layout);

    let step = 1.0 / HEADLESS_HZ;
    let frames = (seconds.max(0.0) * HEADLESS_HZ).ceil() as u64;
    let mut timeline_finished = false;
    let mut countdown = driver.state().countdown.clone();
    for index in 0..=frames {
        if index > 0 {
            driver.advance_clock(step);
        }
        let report = driver.tick()?;
        log_report(&report);
        timeline_finished |= report.events.iter().any(|event| matches!(event, DioramaEvent::TimelineFinished { .. }));
        countdown = report.countdown;
    }

    Ok(HeadlessSummary {
        frames: driver.frame_count(),
        elapsed: driver.elapsed(),
        countdown,
        props: props.len(),
        fireflies: layout.firefly_count,
        timeline_finished,
    })
}
