//! Standalone traffic simulation module
//!
//! This module contains the discrete-time simulation core: roads and
//! intersections, pluggable signal policies, vehicle kinematics, routing and
//! metrics. Nothing in here draws to a screen; renderers only get read access
//! to the world through the driver's callback.

mod ascii;
mod clock;
mod config;
mod driver;
mod error;
mod grid;
mod intersection;
mod kinematics;
mod metrics;
mod policy;
mod road_network;
mod routing;
mod scenario;
mod traffic_light;
mod types;
mod vehicle;
mod world;

pub use ascii::{draw, render, ASCII_WIDTH};
pub use clock::SimClock;
pub use config::SimConfig;
pub use driver::{RenderFn, Simulation};
pub use error::ConfigError;
pub use grid::{build_grid_world, is_road, phase_offset_for, TileGrid};
pub use intersection::SimIntersection;
pub use kinematics::{advance_all, advance_road, vehicles_by_road, FollowingParams};
pub use metrics::{Metrics, RunSummary};
pub use policy::{
    ActuatedPolicy, ApproachingVehicle, FixedCyclePolicy, IntersectionState, LearnedPolicy,
    PolicyKind, SignalDecision, SignalPolicy,
};
pub use road_network::SimRoadNetwork;
pub use routing::{advance_routing, choose_next_road, NextRoad};
pub use scenario::{
    border_tiles, build_grid_demo, build_intersection_world, DemandMode, DemandSpawner,
    DEFAULT_SPAWN_RATE, DEMO_ROAD_LENGTH, DEMO_ROAD_SPEED, GRID_DEMO,
};
pub use traffic_light::TrafficLight;
pub use types::{
    Direction, GridCoord, IntersectionId, RoadId, SignalColor, SimRoad, VehicleId,
    POSITION_EPSILON, TILE_PX, VEHICLE_LENGTH, VEHICLE_MAX_ACCEL, VEHICLE_MAX_DECEL,
};
pub use vehicle::{SimVehicle, VehicleKind};
pub use world::{NoSpawn, SimWorld, Spawner, TickReport};
