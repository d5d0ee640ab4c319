pub mod types;
mod systems;
mod world;

pub use systems::*;
pub use types::*;
pub use world::*;
