mod fireflies;
mod picking;
mod settle;

pub use fireflies::*;
pub use picking::*;
pub use settle::*;
