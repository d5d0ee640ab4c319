pub mod app;
pub mod camera3d;
pub mod cli;
pub mod color;
pub mod config;
pub mod controller;
pub mod ecs;
pub mod environment;
pub mod events;
pub mod frame;
pub mod input;
pub mod layout;
pub mod renderer;
pub mod time;
pub mod tween;

pub use app::{run, run_headless, App};
pub use frame::{FrameDriver, FrameReport};
