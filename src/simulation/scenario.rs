//! Demo scenarios and the random demand spawner used by the binary

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::config::SimConfig;
use super::error::ConfigError;
use super::grid::build_grid_world;
use super::policy::PolicyKind;
use super::types::{Direction, GridCoord, RoadId, VehicleId};
use super::vehicle::VehicleKind;
use super::world::{SimWorld, Spawner};

/// Approach length of the single-intersection demo, meters
pub const DEMO_ROAD_LENGTH: f32 = 120.0;

/// Speed limit of the single-intersection demo, m/s
pub const DEMO_ROAD_SPEED: f32 = 10.0;

/// Per-entry spawn probability per tick
pub const DEFAULT_SPAWN_RATE: f64 = 0.15;

/// A 5x5 block grid: a ring road with two crossing avenues
pub const GRID_DEMO: [&str; 5] = ["+++++", "+ + +", "+++++", "+ + +", "+++++"];

/// One intersection `X1` fed by a NS and an EW approach
pub fn build_intersection_world(config: SimConfig, policy: PolicyKind) -> Result<SimWorld, ConfigError> {
    let mut world = SimWorld::with_config(config)?;
    let x1 = world.add_intersection("X1", policy.build());
    world.add_approach("North-South", DEMO_ROAD_LENGTH, DEMO_ROAD_SPEED, Direction::NS, x1)?;
    world.add_approach("East-West", DEMO_ROAD_LENGTH, DEMO_ROAD_SPEED, Direction::EW, x1)?;
    info!("built intersection demo with {} approaches", world.roads().len());
    Ok(world)
}

pub fn build_grid_demo(config: SimConfig, policy: PolicyKind) -> Result<SimWorld, ConfigError> {
    build_grid_world(&GRID_DEMO, config, policy)
}

/// Grid tiles on the outer edge that hold an intersection
pub fn border_tiles(world: &SimWorld) -> Vec<GridCoord> {
    world
        .intersections()
        .iter()
        .filter(|intersection| world.road_network.is_border(intersection.id))
        .filter_map(|intersection| intersection.coord)
        .collect()
}

/// Where new vehicles come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandMode {
    /// Unrouted vehicles at the start of every road without an origin node
    Approaches,
    /// Routed vehicles between two random border tiles
    BorderToBorder,
}

/// Bernoulli demand: every entry point spawns with probability `spawn_rate`
/// each tick, provided its first few meters are clear
#[derive(Debug)]
pub struct DemandSpawner {
    rng: StdRng,
    spawn_rate: f64,
    mode: DemandMode,
}

impl DemandSpawner {
    pub fn new(seed: u64, spawn_rate: f64, mode: DemandMode) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&spawn_rate) {
            return Err(ConfigError::InvalidConfig("spawn rate must be within [0, 1]"));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            spawn_rate,
            mode,
        })
    }

    pub fn spawn_rate(&self) -> f64 {
        self.spawn_rate
    }

    pub fn mode(&self) -> DemandMode {
        self.mode
    }

    fn random_kind(&mut self) -> VehicleKind {
        VehicleKind::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
    }

    fn spawn_on_approaches(&mut self, now: f32, world: &mut SimWorld) -> Vec<VehicleId> {
        let entries: Vec<RoadId> = world
            .roads()
            .iter()
            .filter(|road| road.origin.is_none())
            .map(|road| road.id)
            .collect();

        let mut spawned = Vec::new();
        for road_id in entries {
            // Draw first so the random sequence does not depend on congestion
            let roll = self.rng.random_bool(self.spawn_rate);
            let kind = self.random_kind();
            if !roll || !world.entry_clear(road_id) {
                continue;
            }
            match world.spawn_vehicle(road_id, now, kind) {
                Ok(id) => spawned.push(id),
                Err(err) => warn!("Failed to spawn on road {:?}: {}", road_id, err),
            }
        }
        spawned
    }

    fn spawn_between_borders(&mut self, now: f32, world: &mut SimWorld) -> Vec<VehicleId> {
        let borders = border_tiles(world);
        let mut spawned = Vec::new();

        for start in borders.iter().copied() {
            if !self.rng.random_bool(self.spawn_rate) {
                continue;
            }
            let goals: Vec<GridCoord> = borders.iter().copied().filter(|g| *g != start).collect();
            let Some(goal) = goals.choose(&mut self.rng).copied() else {
                continue;
            };
            let kind = self.random_kind();

            let first_road = match world.road_network.bfs_route(start, goal) {
                Ok(route) => route.and_then(|route| route.first().copied()),
                Err(err) => {
                    warn!("Failed to route {} -> {}: {}", start, goal, err);
                    None
                }
            };
            let Some(first_road) = first_road else {
                continue;
            };
            if !world.entry_clear(first_road) {
                continue;
            }

            match world.spawn_routed(start, goal, now, kind) {
                Ok(Some(id)) => spawned.push(id),
                Ok(None) => {}
                Err(err) => warn!("Failed to spawn {} -> {}: {}", start, goal, err),
            }
        }
        spawned
    }
}

impl Spawner for DemandSpawner {
    fn spawn(&mut self, now: f32, world: &mut SimWorld) -> Vec<VehicleId> {
        match self.mode {
            DemandMode::Approaches => self.spawn_on_approaches(now, world),
            DemandMode::BorderToBorder => self.spawn_between_borders(now, world),
        }
    }
}
