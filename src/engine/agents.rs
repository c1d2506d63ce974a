// Agent simulation: spawning, re-pathing, path following and attacks.
//
// Agents live in a bevy_ecs `World` owned by `AgentManager`. Per frame:
//   1. the spawner may add one walker,
//   2. every walker advances its timers, re-paths if needed, moves along
//      its path (sliding along walls) and tries to attack,
//   3. the renderer reads `snapshots()` for billboards.
// Targets are skipped by step 2 entirely.

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::collision::slide_move;
use super::components::*;
use super::config::GameConfig;
use super::map::{GridMap, tile_center, world_to_tile};
use super::pathfinding::{find_path, nearest_walkable};

// ============================================================================
// WALKER CONTROLLER
// ============================================================================

/// What one walker did during a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkerStep {
    pub attacked: bool,
    pub repathed: bool,
}

impl WalkerState {
    fn needs_repath(&self, player_tile: IVec2, repath_interval: f32) -> bool {
        match self.last_goal {
            None => true,
            Some(goal) => {
                goal != player_tile
                    || self.time_since_repath >= repath_interval
                    || self.path.is_empty()
                    || self.cursor >= self.path.len()
            }
        }
    }

    fn repath(&mut self, map: &GridMap, pos: Vec2, player_tile: IVec2, search_radius: i32) {
        self.last_goal = Some(player_tile);
        self.time_since_repath = 0.0;

        let start = world_to_tile(pos);
        if !map.is_walkable(start) {
            self.path.clear();
            self.cursor = 0;
            return;
        }

        let goal = nearest_walkable(map, player_tile, search_radius);
        self.path = find_path(map, start, goal);
        // path[0] is the tile we stand in; head for the next one.
        self.cursor = if self.path.len() > 1 { 1 } else { 0 };
        if self.path.is_empty() {
            debug!("no path from {start} to {goal}");
        }
    }

    /// Attack if the player is within `range` and the cooldown has elapsed.
    pub fn try_attack(&mut self, pos: Vec2, player_pos: Vec2, range: f32, interval: f32) -> bool {
        if pos.distance(player_pos) <= range && self.time_since_attack >= interval {
            self.time_since_attack = 0.0;
            return true;
        }
        false
    }

    /// Displacement toward the current waypoint for this frame.
    fn steer(&mut self, pos: Vec2, max_step: f32, arrival_radius: f32) -> Vec2 {
        let Some(&tile) = self.path.get(self.cursor) else {
            return Vec2::ZERO;
        };
        let mut target = tile_center(tile);
        if pos.distance(target) <= arrival_radius {
            self.cursor += 1;
            match self.path.get(self.cursor) {
                Some(&next) => target = tile_center(next),
                None => return Vec2::ZERO,
            }
        }
        let to = target - pos;
        // Never overshoot the waypoint; overshooting makes walkers jitter
        // around the arrival radius.
        to.normalize_or_zero() * max_step.min(to.length())
    }
}

/// Advance one walker by `dt` seconds. Moves `pos` in place.
pub fn update_walker(
    state: &mut WalkerState,
    pos: &mut Vec2,
    body: &Body,
    map: &GridMap,
    player_pos: Vec2,
    dt: f32,
    cfg: &GameConfig,
) -> WalkerStep {
    let mut step = WalkerStep::default();
    state.time_since_attack += dt;
    state.time_since_repath += dt;

    let player_tile = world_to_tile(player_pos);
    if state.needs_repath(player_tile, cfg.repath_interval) {
        state.repath(map, *pos, player_tile, cfg.nearest_walkable_radius);
        step.repathed = true;
    }

    // Hold position once close enough to hit.
    if pos.distance(player_pos) > cfg.attack_range {
        let delta = state.steer(*pos, body.speed * dt, cfg.arrival_radius);
        *pos = slide_move(map, *pos, delta, body.half_extents);
    }

    step.attacked = state.try_attack(*pos, player_pos, cfg.attack_range, cfg.attack_interval);
    step
}

// ============================================================================
// AGENT MANAGER
// ============================================================================

/// Read-only per-agent data handed to the renderer and hit tests.
#[derive(Debug, Clone, Copy)]
pub struct AgentSnapshot {
    pub entity: Entity,
    pub pos: Vec2,
    pub sprite: SpriteKind,
}

/// Summary of one `AgentManager::update`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentFrameReport {
    /// Number of attacks that landed this frame.
    pub hits: u32,
    /// Total damage of those attacks.
    pub damage: i32,
    pub repaths: u32,
}

pub struct AgentManager {
    world: World,
    spawn_accumulator: f32,
    rng: StdRng,
}

impl AgentManager {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { world: World::new(), spawn_accumulator: 0.0, rng }
    }

    /// Remove every agent and restart the spawn timer.
    pub fn reset(&mut self) {
        self.world = World::new();
        self.spawn_accumulator = 0.0;
    }

    pub fn spawn_walker(&mut self, pos: Vec2, cfg: &GameConfig) -> Entity {
        self.world
            .spawn((
                Transform::from_position(pos),
                Agent::walker(1),
                Body { half_extents: cfg.agent_half_extents, speed: cfg.walker_speed },
            ))
            .id()
    }

    pub fn spawn_target(&mut self, pos: Vec2, cfg: &GameConfig) -> Entity {
        self.world
            .spawn((
                Transform::from_position(pos),
                Agent::target(1),
                Body { half_extents: cfg.agent_half_extents, speed: 0.0 },
            ))
            .id()
    }

    pub fn agent_count(&mut self) -> usize {
        self.world.query::<&Agent>().iter(&self.world).count()
    }

    pub fn walker_count(&mut self) -> usize {
        self.world
            .query::<&Agent>()
            .iter(&self.world)
            .filter(|a| matches!(a.kind, AgentKind::Walker(_)))
            .count()
    }

    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.world.get::<Transform>(entity).map(|t| t.position)
    }

    /// Pick a random free floor tile at least `spawn_min_distance` from the
    /// player. Gives up after `spawn_attempts` tries. Draws from the map's
    /// floor tiles, so maps of any size (or with no floor) are safe.
    fn random_spawn_point(&mut self, map: &GridMap, player_pos: Vec2, cfg: &GameConfig) -> Option<Vec2> {
        let floors: Vec<IVec2> = map.floor_tiles().collect();
        if floors.is_empty() {
            return None;
        }
        let occupied: Vec<IVec2> = self
            .world
            .query::<&Transform>()
            .iter(&self.world)
            .map(|t| world_to_tile(t.position))
            .collect();
        let min_d2 = cfg.spawn_min_distance * cfg.spawn_min_distance;

        for _ in 0..cfg.spawn_attempts {
            let tile = floors[self.rng.gen_range(0..floors.len())];
            if occupied.contains(&tile) {
                continue;
            }
            let p = tile_center(tile);
            if p.distance_squared(player_pos) < min_d2 {
                continue;
            }
            return Some(p);
        }
        None
    }

    /// Spawn a walker at a random point unless the walker cap is reached.
    pub fn try_spawn_walker(&mut self, map: &GridMap, player_pos: Vec2, cfg: &GameConfig) -> Option<Entity> {
        if self.walker_count() >= cfg.max_enemies {
            return None;
        }
        let p = self.random_spawn_point(map, player_pos, cfg)?;
        let e = self.spawn_walker(p, cfg);
        info!("walker spawned at ({:.1}, {:.1})", p.x, p.y);
        Some(e)
    }

    pub fn try_spawn_target(&mut self, map: &GridMap, player_pos: Vec2, cfg: &GameConfig) -> Option<Entity> {
        let p = self.random_spawn_point(map, player_pos, cfg)?;
        Some(self.spawn_target(p, cfg))
    }

    /// Run spawner and every walker for one frame.
    pub fn update(&mut self, map: &GridMap, player_pos: Vec2, dt: f32, cfg: &GameConfig) -> AgentFrameReport {
        let mut report = AgentFrameReport::default();

        self.spawn_accumulator += dt;
        if self.spawn_accumulator >= cfg.spawn_interval {
            self.spawn_accumulator = 0.0;
            self.try_spawn_walker(map, player_pos, cfg);
        }

        let mut query = self.world.query::<(&mut Transform, &mut Agent, &Body)>();
        for (mut transform, mut agent, body) in query.iter_mut(&mut self.world) {
            let AgentKind::Walker(state) = &mut agent.kind else {
                continue;
            };
            let step = update_walker(state, &mut transform.position, body, map, player_pos, dt, cfg);
            if step.repathed {
                report.repaths += 1;
            }
            if step.attacked {
                report.hits += 1;
                report.damage += cfg.agent_damage;
            }
        }

        if report.hits > 0 {
            info!("player hit {} time(s)", report.hits);
        }
        report
    }

    /// Apply damage; despawns the agent when its health runs out.
    /// Returns true if the agent was destroyed.
    pub fn damage(&mut self, entity: Entity, amount: i32) -> bool {
        let Some(mut agent) = self.world.get_mut::<Agent>(entity) else {
            return false;
        };
        agent.health -= amount;
        if agent.health > 0 {
            return false;
        }
        self.world.despawn(entity)
    }

    pub fn snapshots(&mut self) -> Vec<AgentSnapshot> {
        self.world
            .query::<(Entity, &Transform, &Agent)>()
            .iter(&self.world)
            .map(|(entity, t, a)| AgentSnapshot { entity, pos: t.position, sprite: a.sprite() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::open_room;

    fn quiet_config() -> GameConfig {
        // No random spawns during scripted scenarios.
        GameConfig { max_enemies: 0, ..Default::default() }
    }

    fn manhattan(a: IVec2, b: IVec2) -> i32 {
        (a.x - b.x).abs() + (a.y - b.y).abs()
    }

    #[test]
    fn walker_closes_in_then_attacks_on_cooldown() {
        let map = open_room(14, 14);
        let cfg = quiet_config();
        let mut mgr = AgentManager::new(Some(1));
        let walker = mgr.spawn_walker(tile_center(IVec2::new(10, 10)), &cfg);
        let player = tile_center(IVec2::new(2, 2));
        let player_tile = world_to_tile(player);
        let dt = 0.125;

        let start_dist = manhattan(world_to_tile(mgr.position(walker).unwrap()), player_tile);
        let mut prev = start_dist;
        let mut frames = 0;
        while mgr.position(walker).unwrap().distance(player) > cfg.attack_range {
            mgr.update(&map, player, dt, &cfg);
            let d = manhattan(world_to_tile(mgr.position(walker).unwrap()), player_tile);
            assert!(d <= prev, "tile distance went up: {prev} -> {d}");
            prev = d;
            frames += 1;
            assert!(frames < 400, "walker never arrived");
        }
        assert!(prev < start_dist);

        // Ten simulated seconds in range: one hit per attack interval.
        let mut hit_frames = Vec::new();
        for frame in 0..80 {
            if mgr.update(&map, player, dt, &cfg).hits > 0 {
                hit_frames.push(frame);
            }
        }
        let interval_frames = (cfg.attack_interval / dt) as i32;
        assert!(hit_frames.len() >= 4, "{hit_frames:?}");
        for pair in hit_frames.windows(2) {
            assert_eq!(pair[1] - pair[0], interval_frames);
        }
    }

    #[test]
    fn targets_never_move_or_attack() {
        let map = open_room(8, 8);
        let cfg = quiet_config();
        let mut mgr = AgentManager::new(Some(2));
        let pos = tile_center(IVec2::new(3, 3));
        let target = mgr.spawn_target(pos, &cfg);
        let player = tile_center(IVec2::new(4, 3));
        for _ in 0..100 {
            let report = mgr.update(&map, player, 0.1, &cfg);
            assert_eq!(report.hits, 0);
            assert_eq!(report.repaths, 0);
        }
        assert_eq!(mgr.position(target), Some(pos));
    }

    #[test]
    fn repath_triggers() {
        let map = open_room(10, 10);
        let cfg = quiet_config();
        let body = Body { half_extents: cfg.agent_half_extents, speed: 1.0 };
        let mut state = WalkerState::default();
        let mut pos = tile_center(IVec2::new(7, 7));
        let player = tile_center(IVec2::new(2, 7));

        // First update always computes a path.
        assert!(update_walker(&mut state, &mut pos, &body, &map, player, 0.01, &cfg).repathed);
        assert_eq!(state.path.first(), Some(&IVec2::new(7, 7)));
        assert_eq!(state.path.last(), Some(&IVec2::new(2, 7)));
        assert_eq!(state.cursor, 1);

        // Nothing changed: no re-path.
        assert!(!update_walker(&mut state, &mut pos, &body, &map, player, 0.01, &cfg).repathed);

        // Player changed tile.
        let moved = tile_center(IVec2::new(2, 6));
        assert!(update_walker(&mut state, &mut pos, &body, &map, moved, 0.01, &cfg).repathed);
        assert_eq!(state.last_goal, Some(IVec2::new(2, 6)));

        // Cooldown elapsed.
        assert!(update_walker(&mut state, &mut pos, &body, &map, moved, cfg.repath_interval, &cfg).repathed);
    }

    #[test]
    fn exhausted_path_triggers_repath() {
        let map = open_room(10, 10);
        let cfg = quiet_config();
        let body = Body { half_extents: cfg.agent_half_extents, speed: 1.0 };
        let mut state = WalkerState::default();
        let mut pos = tile_center(IVec2::new(7, 7));
        let player = tile_center(IVec2::new(2, 7));
        update_walker(&mut state, &mut pos, &body, &map, player, 0.01, &cfg);

        // Same goal, cooldown not elapsed, but the path is gone.
        state.path.clear();
        state.cursor = 0;
        assert_eq!(state.last_goal, Some(IVec2::new(2, 7)));
        assert!(update_walker(&mut state, &mut pos, &body, &map, player, 0.01, &cfg).repathed);
        assert_eq!(state.path.last(), Some(&IVec2::new(2, 7)));
        assert!(state.time_since_repath < cfg.repath_interval);

        // Cursor walked off the end of the path.
        state.cursor = state.path.len();
        assert!(update_walker(&mut state, &mut pos, &body, &map, player, 0.01, &cfg).repathed);
        assert_eq!(state.cursor, 1);
        assert!(!update_walker(&mut state, &mut pos, &body, &map, player, 0.01, &cfg).repathed);
    }

    #[test]
    fn walker_inside_a_wall_clears_its_path() {
        let map = open_room(10, 10);
        let cfg = quiet_config();
        let body = Body { half_extents: cfg.agent_half_extents, speed: 1.0 };
        let mut state = WalkerState {
            path: vec![IVec2::new(1, 1), IVec2::new(2, 1)],
            ..Default::default()
        };
        let mut pos = Vec2::new(0.5, 5.5);
        let step = update_walker(&mut state, &mut pos, &body, &map, tile_center(IVec2::new(5, 5)), 0.1, &cfg);
        assert!(step.repathed);
        assert!(state.path.is_empty());
        assert_eq!(pos, Vec2::new(0.5, 5.5));
    }

    #[test]
    fn unreachable_player_leaves_walker_idle() {
        let rows = ["#######", "#..#..#", "#######"];
        let map = GridMap::from_rows(7, 3, &rows).unwrap();
        let cfg = quiet_config();
        let body = Body { half_extents: cfg.agent_half_extents, speed: 1.0 };
        let mut state = WalkerState::default();
        let start = tile_center(IVec2::new(1, 1));
        let mut pos = start;
        for _ in 0..20 {
            update_walker(&mut state, &mut pos, &body, &map, tile_center(IVec2::new(5, 1)), 0.1, &cfg);
        }
        assert!(state.path.is_empty());
        assert_eq!(pos, start);
    }

    #[test]
    fn wall_goal_is_replaced_by_nearest_floor() {
        let map = open_room(10, 10);
        let cfg = quiet_config();
        let body = Body { half_extents: cfg.agent_half_extents, speed: 1.0 };
        let mut state = WalkerState::default();
        let mut pos = tile_center(IVec2::new(5, 5));
        // "Player" standing on the east wall column.
        update_walker(&mut state, &mut pos, &body, &map, Vec2::new(9.5, 5.5), 0.01, &cfg);
        assert_eq!(state.path.last(), Some(&IVec2::new(8, 5)));
    }

    #[test]
    fn attack_respects_range_and_cooldown() {
        let mut state = WalkerState { time_since_attack: 1.0, ..Default::default() };
        let (pos, player) = (Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0));
        assert!(!state.try_attack(pos, player, 1.2, 2.0));
        state.time_since_attack = 2.0;
        assert!(!state.try_attack(pos, Vec2::new(5.0, 1.0), 1.2, 2.0));
        assert!(state.try_attack(pos, player, 1.2, 2.0));
        assert_eq!(state.time_since_attack, 0.0);
        assert!(!state.try_attack(pos, player, 1.2, 2.0));
    }

    #[test]
    fn spawner_respects_cap_and_distance() {
        let map = GridMap::reference().unwrap();
        let cfg = GameConfig { max_enemies: 3, spawn_interval: 1.0, ..Default::default() };
        let mut mgr = AgentManager::new(Some(7));
        let player = tile_center(IVec2::new(2, 2));
        for _ in 0..10 {
            mgr.update(&map, player, 1.0, &cfg);
        }
        assert_eq!(mgr.walker_count(), 3);
        let snaps = mgr.snapshots();
        for s in &snaps {
            assert!(map.is_walkable(world_to_tile(s.pos)));
        }

        mgr.reset();
        assert_eq!(mgr.agent_count(), 0);
    }

    #[test]
    fn spawns_keep_minimum_distance_from_player() {
        let map = open_room(8, 8);
        let cfg = GameConfig { max_enemies: 50, ..Default::default() };
        let mut mgr = AgentManager::new(Some(3));
        let player = tile_center(IVec2::new(1, 1));
        for _ in 0..30 {
            if let Some(e) = mgr.try_spawn_walker(&map, player, &cfg) {
                let p = mgr.position(e).unwrap();
                assert!(p.distance(player) >= cfg.spawn_min_distance);
            }
        }
        // No two agents share a tile.
        let mut tiles: Vec<IVec2> = mgr.snapshots().iter().map(|s| world_to_tile(s.pos)).collect();
        let n = tiles.len();
        tiles.sort_by_key(|t| (t.x, t.y));
        tiles.dedup();
        assert_eq!(tiles.len(), n);
    }

    #[test]
    fn spawner_only_picks_floor_tiles_on_tiny_maps() {
        let map = GridMap::from_rows(3, 3, &["###", "#.#", "###"]).unwrap();
        let cfg = GameConfig { max_enemies: 5, ..Default::default() };
        let mut mgr = AgentManager::new(Some(5));
        let far = Vec2::new(40.0, 40.0);

        let t = mgr.try_spawn_target(&map, far, &cfg).unwrap();
        assert_eq!(mgr.position(t), Some(tile_center(IVec2::new(1, 1))));
        // The only floor tile is taken now.
        assert!(mgr.try_spawn_walker(&map, far, &cfg).is_none());
        // Too close to the player.
        mgr.reset();
        assert!(mgr.try_spawn_target(&map, Vec2::new(1.5, 1.5), &cfg).is_none());
    }

    #[test]
    fn damage_destroys_agents() {
        let cfg = quiet_config();
        let mut mgr = AgentManager::new(Some(4));
        let t = mgr.spawn_target(Vec2::new(2.5, 2.5), &cfg);
        assert!(mgr.damage(t, 1));
        assert!(mgr.position(t).is_none());
        assert!(!mgr.damage(t, 1));
    }
}
