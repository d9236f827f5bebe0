//! Main simulation world that ties everything together
//!
//! The world owns roads, intersections and vehicles and runs one tick in a
//! fixed order: signal policies, spawning, kinematics, routing advancement,
//! exit bookkeeping.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::{non_negative, positive, SimConfig};
use super::error::ConfigError;
use super::intersection::SimIntersection;
use super::kinematics::{self, FollowingParams};
use super::metrics::Metrics;
use super::policy::{ApproachingVehicle, IntersectionState, SignalPolicy};
use super::road_network::SimRoadNetwork;
use super::routing;
use super::types::{Direction, GridCoord, IntersectionId, RoadId, SimRoad, VehicleId};
use super::vehicle::{SimVehicle, VehicleKind};

/// Source of new vehicles, consulted once per tick after the signals update
pub trait Spawner {
    /// Create vehicles in `world` and return the ones created this tick
    fn spawn(&mut self, now: f32, world: &mut SimWorld) -> Vec<VehicleId>;
}

impl<F> Spawner for F
where
    F: FnMut(f32, &mut SimWorld) -> Vec<VehicleId>,
{
    fn spawn(&mut self, now: f32, world: &mut SimWorld) -> Vec<VehicleId> {
        self(now, world)
    }
}

/// Spawner that never creates vehicles
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpawn;

impl Spawner for NoSpawn {
    fn spawn(&mut self, _now: f32, _world: &mut SimWorld) -> Vec<VehicleId> {
        Vec::new()
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: usize,
    /// Vehicles that reached the end of their road this tick
    pub reached_end: usize,
    /// Vehicles moved onto their next road
    pub advanced: usize,
    /// Vehicles that left the network and were recorded
    pub exited: usize,
}

/// The main simulation world
pub struct SimWorld {
    /// Roads and the routing graph
    pub road_network: SimRoadNetwork,

    /// All intersections, indexed by `IntersectionId`
    intersections: Vec<SimIntersection>,

    /// Live vehicles in creation order
    vehicles: Vec<SimVehicle>,

    /// Next ID to assign
    next_vehicle_id: usize,

    /// Vehicles added since the last tick, not yet reported to the metrics
    pending_entries: usize,

    config: SimConfig,

    /// Seeded RNG for the next-road heuristic
    rng: StdRng,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(config: SimConfig) -> Self {
        Self {
            road_network: SimRoadNetwork::new(),
            intersections: Vec::new(),
            vehicles: Vec::new(),
            next_vehicle_id: 0,
            pending_entries: 0,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn new() -> Self {
        Self::new_internal(SimConfig::default())
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(SimConfig::default().with_seed(seed))
    }

    pub fn with_config(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new_internal(config))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Add an intersection driven by `policy`
    pub fn add_intersection(
        &mut self,
        name: impl Into<String>,
        policy: Box<dyn SignalPolicy>,
    ) -> IntersectionId {
        let id = IntersectionId(self.intersections.len());
        self.intersections.push(SimIntersection::new(id, name, policy));
        self.road_network.add_intersection(id, None);
        id
    }

    /// Add an intersection anchored to a grid cell
    pub fn add_grid_intersection(
        &mut self,
        name: impl Into<String>,
        policy: Box<dyn SignalPolicy>,
        coord: GridCoord,
        phase_offset: f32,
    ) -> IntersectionId {
        let id = IntersectionId(self.intersections.len());
        let intersection = SimIntersection::new(id, name, policy)
            .with_coord(coord)
            .with_phase_offset(phase_offset);
        self.intersections.push(intersection);
        self.road_network.add_intersection(id, Some(coord));
        id
    }

    /// Handle the next road passed to [`SimWorld::add_road`] must use
    pub fn next_road_id(&self) -> RoadId {
        self.road_network.next_road_id()
    }

    /// Add a road and register it as incoming at its destination
    pub fn add_road(&mut self, road: SimRoad) -> Result<RoadId, ConfigError> {
        let destination = road.destination;
        let approach = road.approach;
        if destination.0 >= self.intersections.len() {
            return Err(ConfigError::UnknownIntersection(destination));
        }
        let id = self.road_network.add_road(road)?;
        self.intersections[destination.0].register_road(id, approach);
        Ok(id)
    }

    /// Add an approach road with no origin node, ending at `destination`
    pub fn add_approach(
        &mut self,
        name: impl Into<String>,
        length: f32,
        speed: f32,
        approach: Direction,
        destination: IntersectionId,
    ) -> Result<RoadId, ConfigError> {
        if !positive(length) || !non_negative(speed) {
            return Err(ConfigError::InvalidConfig(
                "road length must be positive and speed non-negative",
            ));
        }
        let road = SimRoad::new(self.next_road_id(), name, length, speed, approach, destination);
        self.add_road(road)
    }

    fn next_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_vehicle_id);
        self.next_vehicle_id += 1;
        id
    }

    /// Put a new vehicle at the start of `road`
    pub fn spawn_vehicle(
        &mut self,
        road_id: RoadId,
        now: f32,
        kind: VehicleKind,
    ) -> Result<VehicleId, ConfigError> {
        let road = self.road_network.road(road_id)?.clone();
        let id = self.next_id();
        self.vehicles.push(SimVehicle::new(id, &road, kind, now));
        self.pending_entries += 1;
        trace!("spawned vehicle {:?} on {}", id, road.name);
        Ok(id)
    }

    /// Spawn a vehicle that follows the shortest route from `start` to `goal`
    ///
    /// Returns `Ok(None)` when there is no route or nothing to drive.
    pub fn spawn_routed(
        &mut self,
        start: GridCoord,
        goal: GridCoord,
        now: f32,
        kind: VehicleKind,
    ) -> Result<Option<VehicleId>, ConfigError> {
        let route = match self.road_network.bfs_route(start, goal)? {
            Some(route) if !route.is_empty() => route,
            _ => return Ok(None),
        };
        let first = self.road_network.road(route[0])?.clone();
        let id = self.next_id();
        self.vehicles
            .push(SimVehicle::new(id, &first, kind, now).with_route(route));
        self.pending_entries += 1;
        trace!("spawned routed vehicle {:?} from {} to {}", id, start, goal);
        Ok(Some(id))
    }

    /// Place an already built vehicle, e.g. at a chosen position
    pub fn insert_vehicle(&mut self, vehicle: SimVehicle) -> Result<VehicleId, ConfigError> {
        self.road_network.road(vehicle.road)?;
        let id = vehicle.id;
        self.next_vehicle_id = self.next_vehicle_id.max(id.0 + 1);
        self.vehicles.push(vehicle);
        self.pending_entries += 1;
        Ok(id)
    }

    /// Handle for a vehicle built outside the world
    pub fn allocate_vehicle_id(&mut self) -> VehicleId {
        self.next_id()
    }

    /// True when no live vehicle is within the minimum gap of the road start
    pub fn entry_clear(&self, road_id: RoadId) -> bool {
        !self
            .vehicles
            .iter()
            .any(|v| v.road == road_id && !v.finished && v.position < self.config.min_gap_m)
    }

    pub fn intersections(&self) -> &[SimIntersection] {
        &self.intersections
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&SimIntersection> {
        self.intersections.get(id.0)
    }

    pub fn intersection_mut(&mut self, id: IntersectionId) -> Option<&mut SimIntersection> {
        self.intersections.get_mut(id.0)
    }

    pub fn roads(&self) -> &[SimRoad] {
        self.road_network.roads()
    }

    pub fn vehicles(&self) -> &[SimVehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicles_on_road(&self, road_id: RoadId) -> impl Iterator<Item = &SimVehicle> {
        self.vehicles.iter().filter(move |v| v.road == road_id)
    }

    /// Queue snapshot handed to an intersection's policy
    pub fn intersection_state(&self, id: IntersectionId) -> Option<IntersectionState> {
        let intersection = self.intersections.get(id.0)?;
        let mut approaching = Vec::new();
        for road_id in intersection.all_incoming_roads() {
            let Some(road) = self.road_network.get_road(road_id) else {
                continue;
            };
            approaching.extend(
                self.vehicles_on_road(road_id)
                    .filter(|v| !v.finished)
                    .map(|v| ApproachingVehicle {
                        approach: road.approach,
                        distance_to_stop: road.length - v.position,
                    }),
            );
        }
        Some(IntersectionState {
            intersection: Some(id),
            light: intersection.light,
            approaching,
        })
    }

    /// Apply every intersection's policy at `now`
    fn update_signals(&mut self, now: f32) {
        for index in 0..self.intersections.len() {
            let id = IntersectionId(index);
            let Some(state) = self.intersection_state(id) else {
                continue;
            };
            let before = self.intersections[index].light;
            self.intersections[index].apply_policy(&state, now);
            let after = self.intersections[index].light;
            if before != after {
                debug!(
                    "{}: {} {} at {:.1}s",
                    self.intersections[index].name,
                    after.direction(),
                    after.color(),
                    now
                );
            }
        }
    }

    /// Main simulation tick
    pub fn tick<S: Spawner + ?Sized>(
        &mut self,
        now: f32,
        delta_secs: f32,
        spawner: &mut S,
        metrics: &mut Metrics,
    ) -> Result<TickReport, ConfigError> {
        if self.intersections.is_empty() {
            return Err(ConfigError::NoIntersections);
        }

        self.update_signals(now);

        // Counts every vehicle added since the last tick, spawner or not
        let spawned = spawner.spawn(now, self);
        for _ in 0..std::mem::take(&mut self.pending_entries) {
            metrics.on_enter();
        }

        let params = FollowingParams {
            min_gap: self.config.min_gap_m,
            stop_line_offset: self.config.stop_line_offset_m,
        };
        let reached_end = kinematics::advance_all(
            delta_secs,
            &self.road_network,
            &self.intersections,
            &mut self.vehicles,
            &params,
        )?;

        let advanced = routing::advance_routing(
            &mut self.vehicles,
            &self.road_network,
            self.config.border_exit_probability,
            &mut self.rng,
        );

        let mut exited = 0;
        for vehicle in self.vehicles.iter_mut() {
            if vehicle.finished && vehicle.exit_time.is_none() {
                vehicle.exit_time = Some(now);
                metrics.on_exit(now, vehicle);
                exited += 1;
            }
        }
        self.vehicles.retain(|v| !v.has_exited());

        Ok(TickReport {
            spawned: spawned.len(),
            reached_end,
            advanced,
            exited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::policy::FixedCyclePolicy;
    use crate::simulation::types::SignalColor;

    fn two_road_world() -> (SimWorld, RoadId, RoadId) {
        let mut world = SimWorld::new();
        let x1 = world.add_intersection("X1", Box::new(FixedCyclePolicy::default()));
        let ns = world
            .add_approach("North-South", 120.0, 10.0, Direction::NS, x1)
            .unwrap();
        let ew = world
            .add_approach("East-West", 120.0, 10.0, Direction::EW, x1)
            .unwrap();
        (world, ns, ew)
    }

    #[test]
    fn test_tick_without_intersections_fails() {
        let mut world = SimWorld::new();
        let mut metrics = Metrics::new();
        assert_eq!(
            world.tick(0.0, 1.0, &mut NoSpawn, &mut metrics),
            Err(ConfigError::NoIntersections)
        );
    }

    #[test]
    fn test_road_registered_at_destination() {
        let (world, ns, ew) = two_road_world();
        let x1 = world.intersection(IntersectionId(0)).unwrap();
        assert_eq!(x1.incoming_roads(Direction::NS), &[ns]);
        assert_eq!(x1.incoming_roads(Direction::EW), &[ew]);
    }

    #[test]
    fn test_road_to_unknown_intersection_rejected() {
        let (mut world, _, _) = two_road_world();
        assert_eq!(
            world.add_approach("nowhere", 10.0, 10.0, Direction::NS, IntersectionId(5)),
            Err(ConfigError::UnknownIntersection(IntersectionId(5)))
        );
    }

    #[test]
    fn test_spawned_vehicle_moves_under_current_signal() {
        let (mut world, ns, _) = two_road_world();
        let mut metrics = Metrics::new();
        let mut spawner = |now: f32, world: &mut SimWorld| {
            if now == 0.0 {
                vec![world.spawn_vehicle(ns, now, VehicleKind::Standard).unwrap()]
            } else {
                Vec::new()
            }
        };

        let report = world.tick(0.0, 1.0, &mut spawner, &mut metrics).unwrap();
        assert_eq!(report.spawned, 1);
        assert_eq!(metrics.entered, 1);
        // Policies run first, so the new vehicle already sees NS green and moves
        assert_eq!(world.vehicles()[0].position, 10.0);
    }

    #[test]
    fn test_policy_applied_to_every_intersection() {
        let mut world = SimWorld::new();
        world.add_intersection("A", Box::new(FixedCyclePolicy::default()));
        let b = world.add_intersection("B", Box::new(FixedCyclePolicy::default()));
        world.intersection_mut(b).unwrap().phase_offset = 10.0;

        let mut metrics = Metrics::new();
        world.tick(0.0, 1.0, &mut NoSpawn, &mut metrics).unwrap();

        let a_light = world.intersections()[0].light;
        let b_light = world.intersections()[1].light;
        assert!(a_light.is_green_for(Direction::NS));
        assert!(b_light.is_green_for(Direction::EW));
        assert_eq!(b_light.color(), SignalColor::Green);
    }

    #[test]
    fn test_exited_vehicle_recorded_once_and_removed() {
        let (mut world, ns, _) = two_road_world();
        let id = world.allocate_vehicle_id();
        let road = world.road_network.road(ns).unwrap().clone();
        world
            .insert_vehicle(SimVehicle::new(id, &road, VehicleKind::Standard, 0.0).with_position(115.0))
            .unwrap();

        let mut metrics = Metrics::new();
        let report = world.tick(3.0, 1.0, &mut NoSpawn, &mut metrics).unwrap();
        assert_eq!(report.exited, 1);
        assert_eq!(report.reached_end, 1);
        assert_eq!(metrics.entered, 1);
        assert_eq!(metrics.exited, 1);
        assert_eq!(metrics.completed_times, vec![3.0]);
        assert!(world.vehicles().is_empty());

        world.tick(4.0, 1.0, &mut NoSpawn, &mut metrics).unwrap();
        assert_eq!(metrics.exited, 1);
    }

    #[test]
    fn test_intersection_state_lists_waiting_vehicles() {
        let (mut world, ns, ew) = two_road_world();
        world.spawn_vehicle(ns, 0.0, VehicleKind::Standard).unwrap();
        world.spawn_vehicle(ew, 0.0, VehicleKind::Standard).unwrap();

        let state = world.intersection_state(IntersectionId(0)).unwrap();
        assert_eq!(state.approaching.len(), 2);
        assert!(state.has_queue(Direction::NS, 120.0));
        assert!(!state.has_queue(Direction::NS, 25.0));
    }

    #[test]
    fn test_vehicles_added_outside_spawner_count_as_entered() {
        let (mut world, ns, ew) = two_road_world();
        world.spawn_vehicle(ns, 0.0, VehicleKind::Standard).unwrap();
        let mut metrics = Metrics::new();
        let mut spawner = |now: f32, world: &mut SimWorld| {
            vec![world.spawn_vehicle(ew, now, VehicleKind::Van).unwrap()]
        };

        let report = world.tick(0.0, 1.0, &mut spawner, &mut metrics).unwrap();
        assert_eq!(report.spawned, 1);
        assert_eq!(metrics.entered, 2);

        world.tick(1.0, 1.0, &mut NoSpawn, &mut metrics).unwrap();
        assert_eq!(metrics.entered, 2);
    }

    #[test]
    fn test_entry_clear() {
        let (mut world, ns, ew) = two_road_world();
        world.spawn_vehicle(ns, 0.0, VehicleKind::Standard).unwrap();
        assert!(!world.entry_clear(ns));
        assert!(world.entry_clear(ew));
    }
}
