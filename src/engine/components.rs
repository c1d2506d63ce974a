// ECS components for agents (walkers and targets).

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};
use super::pathfinding::Path;

/// Position of an entity on the map plane, in tile units.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

impl Transform {
    pub fn from_position(position: Vec2) -> Self {
        Self { position }
    }
}

/// Physical properties used by collision and movement.
///
/// `half_extents` — collision box half size in tiles.
/// `speed`        — tiles per second; 0 for stationary agents.
#[derive(Component, Debug, Clone, Copy)]
pub struct Body {
    pub half_extents: Vec2,
    pub speed: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Agent {
    pub kind: AgentKind,
    pub health: i32,
}

#[derive(Debug, Clone)]
pub enum AgentKind {
    /// Chases the player along tile paths and attacks in range.
    Walker(WalkerState),
    /// Never moves or attacks; exists to be shot.
    Target,
}

/// Path-following and attack timers of one walker.
#[derive(Debug, Clone, Default)]
pub struct WalkerState {
    pub time_since_attack: f32,
    pub time_since_repath: f32,
    /// Replaced wholesale on re-path.
    pub path: Path,
    /// Index of the waypoint currently being approached.
    pub cursor: usize,
    /// Player tile at the last re-path; `None` until the first one.
    pub last_goal: Option<IVec2>,
}

impl Agent {
    pub fn walker(health: i32) -> Self {
        Self { kind: AgentKind::Walker(WalkerState::default()), health }
    }

    pub fn target(health: i32) -> Self {
        Self { kind: AgentKind::Target, health }
    }

    pub fn sprite(&self) -> SpriteKind {
        match self.kind {
            AgentKind::Walker(_) => SpriteKind::Walker,
            AgentKind::Target => SpriteKind::Target,
        }
    }
}

/// Which atlas region an agent is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Walker,
    Target,
}
