// Tuning constants for the renderer, the player and the agent simulation.
// Every field is public so tests and main can override single values with
// struct-update syntax: `GameConfig { max_enemies: 0, ..Default::default() }`.

use glam::Vec2;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Size of the CPU frame buffer in pixels. The window scales it on present.
    pub screen_width: u32,
    pub screen_height: u32,

    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,

    /// Eye height as a fraction of the wall height (0 = floor, 1 = ceiling).
    pub camera_height: f32,

    /// Brightness multiplier applied to walls hit on a y-side.
    pub side_shade: f32,

    // ---- Player ---------------------------------------------------------
    /// Tiles per second.
    pub move_speed: f32,
    /// Radians per second for keyboard turning.
    pub rotation_speed: f32,
    /// Radians per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub player_half_extents: Vec2,
    pub player_health: i32,
    /// Seconds between shots.
    pub fire_cooldown: f32,

    // ---- Agents ---------------------------------------------------------
    pub walker_speed: f32,
    /// Distance at which a path waypoint counts as reached.
    pub arrival_radius: f32,
    /// Seconds between forced re-paths.
    pub repath_interval: f32,
    pub attack_range: f32,
    /// Seconds between two attacks of the same walker.
    pub attack_interval: f32,
    pub agent_damage: i32,
    pub agent_half_extents: Vec2,

    // ---- Spawner --------------------------------------------------------
    pub max_enemies: usize,
    /// Seconds between spawn attempts.
    pub spawn_interval: f32,
    pub spawn_min_distance: f32,
    pub spawn_attempts: u32,
    /// Targets placed when a round starts.
    pub initial_targets: usize,
    /// Manhattan radius for the nearest-walkable goal substitution.
    pub nearest_walkable_radius: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            fov_degrees: 66.0,
            camera_height: 0.66,
            side_shade: 0.7,

            move_speed: 3.0,
            rotation_speed: 2.5,
            mouse_sensitivity: 0.003,
            player_half_extents: Vec2::splat(0.2),
            player_health: 10,
            fire_cooldown: 0.25,

            walker_speed: 1.5,
            arrival_radius: 0.1,
            repath_interval: 0.5,
            attack_range: 1.2,
            attack_interval: 2.0,
            agent_damage: 1,
            agent_half_extents: Vec2::splat(0.2),

            max_enemies: 20,
            spawn_interval: 5.0,
            spawn_min_distance: 3.0,
            spawn_attempts: 200,
            initial_targets: 4,
            nearest_walkable_radius: 4,
        }
    }
}

impl GameConfig {
    /// Half-width of the camera plane at distance 1: tan(fov / 2).
    pub fn plane_half(&self) -> f32 {
        (self.fov_degrees.to_radians() * 0.5).tan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_half_matches_fov() {
        let cfg = GameConfig { fov_degrees: 90.0, ..Default::default() };
        assert!((cfg.plane_half() - 1.0).abs() < 1e-5);
    }
}
