// Engine module - map, ray caster, pathfinding and agent simulation.
// Everything here is platform-free except input (winit types) and
// debug_overlay (egui + wgpu).

pub mod agents;
pub mod billboard;
pub mod collision;
pub mod components;
pub mod config;
pub mod debug_overlay;
pub mod framebuffer;
pub mod game;
pub mod input;
pub mod map;
pub mod pathfinding;
pub mod player;
pub mod raycast;
pub mod texture;

// Re-export commonly used items
pub use config::GameConfig;
pub use debug_overlay::{DebugOverlay, DebugStats};
pub use game::Game;
pub use input::InputState;
pub use map::MapError;
