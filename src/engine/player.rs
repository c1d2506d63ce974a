// First-person player: position, facing, health and the fire timer.
//
// Controls:
//   W / S           move along the view direction
//   A / D           strafe
//   Left / Right    turn (mouse x motion also turns)
//   Space / LMB     fire
//
// Movement goes through the same slide_move as the walkers, so the player
// slides along walls instead of stopping dead.

use glam::Vec2;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;
use super::collision::slide_move;
use super::config::GameConfig;
use super::input::InputState;
use super::map::{GridMap, world_to_tile};
use super::raycast::Camera;

pub struct Player {
    pub pos: Vec2,
    /// Radians; 0 looks along +x, positive turns toward +y (clockwise on screen).
    pub angle: f32,
    pub health: i32,
    /// Seconds until the next shot is allowed.
    fire_cooldown: f32,
}

impl Player {
    pub fn new(pos: Vec2, angle: f32, health: i32) -> Self {
        Self { pos, angle, health, fire_cooldown: 0.0 }
    }

    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Apply one frame of input. Returns true if a shot was fired this frame.
    pub fn update(&mut self, input: &InputState, map: &GridMap, cfg: &GameConfig, dt: f32) -> bool {
        // Turning
        let mut turn = 0.0;
        if input.is_key_held(KeyCode::ArrowRight) { turn += cfg.rotation_speed * dt; }
        if input.is_key_held(KeyCode::ArrowLeft) { turn -= cfg.rotation_speed * dt; }
        turn += input.mouse_delta.0 * cfg.mouse_sensitivity;
        self.angle = (self.angle + turn).rem_euclid(std::f32::consts::TAU);

        // Movement relative to the new facing
        let forward = self.forward();
        let right = forward.perp();
        let mut move_dir = Vec2::ZERO;

        if input.is_key_held(KeyCode::KeyW) { move_dir += forward; }
        if input.is_key_held(KeyCode::KeyS) { move_dir -= forward; }
        if input.is_key_held(KeyCode::KeyD) { move_dir += right; }
        if input.is_key_held(KeyCode::KeyA) { move_dir -= right; }

        if move_dir != Vec2::ZERO {
            let delta = move_dir.normalize() * cfg.move_speed * dt;
            self.pos = slide_move(map, self.pos, delta, cfg.player_half_extents);
        }

        // Firing
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        let trigger = input.is_key_held(KeyCode::Space) || input.is_button_held(MouseButton::Left);
        if trigger && self.fire_cooldown <= 0.0 {
            self.fire_cooldown = cfg.fire_cooldown;
            return true;
        }
        false
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.health -= amount;
    }

    pub fn camera(&self, cfg: &GameConfig) -> Camera {
        Camera {
            pos: self.pos,
            angle: self.angle,
            plane_half: cfg.plane_half(),
            eye_height: cfg.camera_height,
        }
    }

    pub fn tile(&self) -> glam::IVec2 {
        world_to_tile(self.pos)
    }
}
