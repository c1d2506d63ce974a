// Game context: owns every piece of simulation and render state and runs
// the per-frame phases in order.
//
//   update(dt, input):  player → firing → agents (spawner, walkers) → damage
//   render():           walls + depth → billboards → minimap → crosshair
//
// The frame buffer and depth buffer are fully rewritten by every render().

use bevy_ecs::entity::Entity;
use glam::Vec2;
use log::{info, warn};
use super::agents::{AgentManager, AgentSnapshot};
use super::billboard::{draw_billboards, pick_agent_at_column};
use super::components::SpriteKind;
use super::config::GameConfig;
use super::framebuffer::{FrameBuffer, Rgba};
use super::input::InputState;
use super::map::{GridMap, MapError, TileKind, tile_center};
use super::player::Player;
use super::raycast::{Camera, DepthBuffer, cast_ray, render_walls};
use super::texture::TextureAtlas;

pub const PLAYER_START: Vec2 = Vec2::new(2.5, 2.5);
/// Damage of one player shot.
const SHOT_DAMAGE: i32 = 1;

const CROSSHAIR_COLOR: Rgba = Rgba::rgb(230, 230, 230);
const CROSSHAIR_DOT: Rgba = Rgba::rgb(255, 40, 40);

const MINIMAP_TILE_PX: i32 = 6;
const MINIMAP_MARGIN: i32 = 8;
const MINIMAP_FLOOR: Rgba = Rgba::rgb(30, 30, 30);
const MINIMAP_PLAYER: Rgba = Rgba::rgb(216, 191, 216);
const MINIMAP_POINTER: Rgba = Rgba::rgb(255, 222, 173);
const MINIMAP_WALKER: Rgba = Rgba::rgb(220, 40, 40);
const MINIMAP_TARGET: Rgba = Rgba::rgb(240, 200, 40);

/// Counters shown by the debug overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameStats {
    pub round: u32,
    pub kills: u32,
    pub shots: u32,
    pub hits_taken: u32,
    pub repaths_last_frame: u32,
    pub agents_alive: usize,
}

pub struct Game {
    config: GameConfig,
    map: GridMap,
    atlas: TextureAtlas,
    player: Player,
    agents: AgentManager,
    frame: FrameBuffer,
    depth: DepthBuffer,
    stats: GameStats,
    pub show_minimap: bool,
}

impl Game {
    /// Reference level with the procedural atlas.
    pub fn new(config: GameConfig) -> Result<Self, MapError> {
        let map = GridMap::reference()?;
        info!("map validated: {} x {}", map.width(), map.height());
        Ok(Self::with_map(config, map, TextureAtlas::procedural(), None))
    }

    /// `seed` makes spawning deterministic; `None` seeds from the OS.
    pub fn with_map(config: GameConfig, map: GridMap, atlas: TextureAtlas, seed: Option<u64>) -> Self {
        let frame = FrameBuffer::new(config.screen_width, config.screen_height);
        let depth = DepthBuffer::new(config.screen_width);
        let player = Player::new(PLAYER_START, 0.0, config.player_health);
        let mut game = Self {
            config,
            map,
            atlas,
            player,
            agents: AgentManager::new(seed),
            frame,
            depth,
            stats: GameStats::default(),
            show_minimap: true,
        };
        game.reset();
        game
    }

    /// Start a new round: clear agents, respawn the player, place targets.
    pub fn reset(&mut self) {
        self.agents.reset();
        self.player = Player::new(self.start_position(), 0.0, self.config.player_health);

        let mut placed = 0;
        for _ in 0..self.config.initial_targets {
            if self.agents.try_spawn_target(&self.map, self.player.pos, &self.config).is_some() {
                placed += 1;
            }
        }

        self.stats.round += 1;
        self.stats.agents_alive = self.agents.agent_count();
        info!("round {} started with {} target(s)", self.stats.round, placed);
    }

    /// `PLAYER_START`, or the first floor tile if the map has a wall there.
    fn start_position(&self) -> Vec2 {
        let start = super::map::world_to_tile(PLAYER_START);
        if self.map.is_walkable(start) {
            return PLAYER_START;
        }
        self.map.floor_tiles().next().map(tile_center).unwrap_or(PLAYER_START)
    }

    pub fn update(&mut self, dt: f32, input: &InputState) {
        if self.player.update(input, &self.map, &self.config, dt) {
            self.fire();
        }

        let report = self.agents.update(&self.map, self.player.pos, dt, &self.config);
        self.stats.repaths_last_frame = report.repaths;
        if report.hits > 0 {
            self.player.take_damage(report.damage);
            self.stats.hits_taken += report.hits;
            info!("player health {}", self.player.health);
        }

        if self.player.is_dead() {
            warn!("player died in round {}", self.stats.round);
            self.reset();
        }
        self.stats.agents_alive = self.agents.agent_count();
    }

    /// Hitscan along the center column. Returns the agent that was hit.
    fn fire(&mut self) -> Option<Entity> {
        self.stats.shots += 1;
        let camera = self.player.camera(&self.config);
        let (w, h) = (self.frame.width, self.frame.height);
        let x = w / 2;
        let wall_dist = cast_ray(&self.map, &camera, Camera::column_offset(x, w)).perp_dist;

        let agents = self.agents.snapshots();
        let hit = pick_agent_at_column(&camera, wall_dist, &agents, x, w, h)?;
        if self.agents.damage(hit, SHOT_DAMAGE) {
            self.stats.kills += 1;
            info!("agent destroyed ({} kills)", self.stats.kills);
        }
        Some(hit)
    }

    pub fn render(&mut self) -> &FrameBuffer {
        let camera = self.player.camera(&self.config);
        render_walls(
            &mut self.frame,
            &mut self.depth,
            &self.map,
            &self.atlas,
            &camera,
            self.config.side_shade,
        );

        let agents = self.agents.snapshots();
        draw_billboards(&mut self.frame, &self.depth, &self.atlas, &camera, &agents);

        if self.show_minimap {
            self.draw_minimap(&agents);
        }
        self.draw_crosshair();
        &self.frame
    }

    fn draw_crosshair(&mut self) {
        let cx = (self.frame.width / 2) as i32;
        let cy = (self.frame.height / 2) as i32;
        self.frame.fill_rect(cx - 8, cy - 1, cx + 9, cy + 1, CROSSHAIR_COLOR);
        self.frame.fill_rect(cx - 1, cy - 8, cx + 1, cy + 9, CROSSHAIR_COLOR);
        self.frame.fill_ellipse(cx as f32, cy as f32, 2.0, 2.0, CROSSHAIR_DOT);
    }

    /// Top-down view in the top-left corner: tiles, agents, player + facing.
    fn draw_minimap(&mut self, agents: &[AgentSnapshot]) {
        let s = MINIMAP_TILE_PX;
        let o = MINIMAP_MARGIN;
        for y in 0..self.map.height() {
            for x in 0..self.map.width() {
                let color = match self.map.tile_at(glam::IVec2::new(x, y)) {
                    Ok(TileKind::Wall(tex)) => self.atlas.sample_slot(tex.slot(), 64, 64),
                    _ => MINIMAP_FLOOR,
                };
                let (px, py) = (o + x * s, o + y * s);
                self.frame.fill_rect(px, py, px + s, py + s, color);
            }
        }

        let to_px = |p: Vec2| (o as f32 + p.x * s as f32, o as f32 + p.y * s as f32);
        let sf = s as f32;
        for a in agents {
            let (x, y) = to_px(a.pos);
            let color = match a.sprite {
                SpriteKind::Walker => MINIMAP_WALKER,
                SpriteKind::Target => MINIMAP_TARGET,
            };
            self.frame.fill_ellipse(x, y, sf * 0.3, sf * 0.3, color);
        }

        let (x, y) = to_px(self.player.pos);
        self.frame.fill_ellipse(x, y, sf * 0.4, sf * 0.4, MINIMAP_PLAYER);
        let (px, py) = to_px(self.player.pos + self.player.forward() * 0.8);
        self.frame.fill_ellipse(px, py, sf * 0.15, sf * 0.15, MINIMAP_POINTER);
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::open_room;
    use winit::keyboard::KeyCode;

    fn quiet_config() -> GameConfig {
        GameConfig {
            screen_width: 64,
            screen_height: 48,
            initial_targets: 0,
            max_enemies: 0,
            ..Default::default()
        }
    }

    fn fire_input() -> InputState {
        let mut input = InputState::new();
        input.set_key(KeyCode::Space, true);
        input
    }

    #[test]
    fn new_game_places_targets_away_from_player() {
        let mut game = Game::new(GameConfig { screen_width: 64, screen_height: 48, ..Default::default() })
            .unwrap();
        assert_eq!(game.stats().round, 1);
        assert_eq!(game.player().pos, PLAYER_START);
        assert_eq!(game.agents.agent_count(), game.config.initial_targets);
        for a in game.agents.snapshots() {
            assert!(a.pos.distance(PLAYER_START) >= game.config.spawn_min_distance);
        }
    }

    #[test]
    fn shooting_destroys_the_agent_in_the_crosshair() {
        let mut game = Game::with_map(quiet_config(), open_room(10, 10), TextureAtlas::procedural(), Some(1));
        game.agents.spawn_target(Vec2::new(6.5, 2.5), &game.config);

        game.update(0.016, &fire_input());
        assert_eq!(game.agents.agent_count(), 0);
        assert_eq!(game.stats().kills, 1);
        assert_eq!(game.stats().shots, 1);
    }

    #[test]
    fn walls_block_shots() {
        let rows = ["##########", "#...#....#", "##########"];
        let map = GridMap::from_rows(10, 3, &rows).unwrap();
        let mut game = Game::with_map(quiet_config(), map, TextureAtlas::procedural(), Some(1));
        game.player = Player::new(Vec2::new(1.5, 1.5), 0.0, 10);
        game.agents.spawn_target(Vec2::new(6.5, 1.5), &game.config);

        game.update(0.016, &fire_input());
        assert_eq!(game.agents.agent_count(), 1);
        assert_eq!(game.stats().kills, 0);
    }

    #[test]
    fn death_starts_a_new_round() {
        let cfg = GameConfig { player_health: 1, ..quiet_config() };
        let mut game = Game::with_map(cfg, open_room(10, 10), TextureAtlas::procedural(), Some(1));
        // Already in range: the first attack lands once the interval has passed.
        game.agents.spawn_walker(PLAYER_START + Vec2::new(1.0, 0.0), &game.config);

        game.update(game.config.attack_interval, &InputState::new());
        assert_eq!(game.stats().round, 2);
        assert_eq!(game.stats().hits_taken, 1);
        assert_eq!(game.agents.agent_count(), 0);
        assert_eq!(game.player().health, 1);
        assert_eq!(game.player().pos, PLAYER_START);
    }

    #[test]
    fn render_draws_world_and_crosshair() {
        let mut game = Game::with_map(quiet_config(), open_room(10, 10), TextureAtlas::procedural(), Some(1));
        game.show_minimap = false;
        let frame = game.render();
        assert_eq!(frame.get(32, 24), Some(CROSSHAIR_DOT));
        assert_eq!(frame.get(32 - 6, 24), Some(CROSSHAIR_COLOR));
        // Wall columns leave a recorded depth everywhere.
        assert!((0..64).all(|x| game.depth.get(x).is_finite()));
    }

    #[test]
    fn minimap_marks_the_player() {
        let mut game = Game::with_map(quiet_config(), open_room(10, 10), TextureAtlas::procedural(), Some(1));
        let frame = game.render();
        let px = MINIMAP_MARGIN + (PLAYER_START.x * MINIMAP_TILE_PX as f32) as i32;
        let py = MINIMAP_MARGIN + (PLAYER_START.y * MINIMAP_TILE_PX as f32) as i32;
        assert_eq!(frame.get(px as u32, py as u32), Some(MINIMAP_PLAYER));
    }
}
