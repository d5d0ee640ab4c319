//! Interaction state the frame driver threads through every tick: what is hovered, which
//! cursor to show and the countdown readout.

mod hover;
mod relocation;

pub use hover::*;
pub use relocation::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Shown while the pointer is over an interactive prop.
    Pointer,
}

#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub hover: HoverState,
    pub cursor: CursorStyle,
    pub countdown: String,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }
}
