//! Vehicle movement and car-following
//!
//! Each road is updated front to back: the lead vehicle moves first, so every
//! follower's gap constraint is computed against its leader's new position.

use ordered_float::OrderedFloat;
use sorted_vec::SortedVec;
use std::collections::HashMap;

use super::error::ConfigError;
use super::intersection::SimIntersection;
use super::road_network::SimRoadNetwork;
use super::traffic_light::TrafficLight;
use super::types::{RoadId, SimRoad, POSITION_EPSILON};
use super::vehicle::SimVehicle;

/// Car-following limits shared by every road
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowingParams {
    pub min_gap: f32,
    pub stop_line_offset: f32,
}

/// Vehicle indices per road, ordered by position rear to front
pub fn vehicles_by_road(vehicles: &[SimVehicle]) -> HashMap<RoadId, SortedVec<(OrderedFloat<f32>, usize)>> {
    let mut by_road: HashMap<RoadId, SortedVec<(OrderedFloat<f32>, usize)>> = HashMap::new();
    for (index, vehicle) in vehicles.iter().enumerate() {
        if vehicle.finished {
            continue;
        }
        by_road
            .entry(vehicle.road)
            .or_default()
            .insert((OrderedFloat(vehicle.position), index));
    }
    by_road
}

/// Upper bound on a vehicle's next position imposed by the signal
fn signal_bound(road: &SimRoad, light: &TrafficLight, position: f32, params: &FollowingParams) -> f32 {
    if light.is_green_for(road.approach) {
        return road.length;
    }
    let stop_line = road.stop_line(params.stop_line_offset);
    // Already over the line when the light changed: hold where it is
    if position > stop_line {
        position
    } else {
        stop_line
    }
}

/// Advance the non-finished vehicles of one road
///
/// `order` holds indices into `vehicles` sorted by position, rear first.
/// Returns the number of vehicles that reached the end of the road.
pub fn advance_road(
    road: &SimRoad,
    light: &TrafficLight,
    order: &[(OrderedFloat<f32>, usize)],
    vehicles: &mut [SimVehicle],
    delta_secs: f32,
    params: &FollowingParams,
) -> usize {
    let green = light.is_green_for(road.approach);
    let mut leader_position: Option<f32> = None;
    let mut finished = 0;

    for &(_, index) in order.iter().rev() {
        let vehicle = &mut vehicles[index];
        let old_position = vehicle.position;
        let desired = old_position + vehicle.target_speed * delta_secs;

        let mut bound = signal_bound(road, light, old_position, params);
        if let Some(leader) = leader_position {
            bound = bound.min(leader - params.min_gap);
        }

        let mut new_position = road.clamp_position(desired.min(bound));
        if green && new_position >= road.length - POSITION_EPSILON {
            new_position = road.length;
            vehicle.finished = true;
            finished += 1;
        }

        vehicle.position = new_position;
        leader_position = Some(new_position);
    }

    finished
}

/// Advance every vehicle on every road by one step
pub fn advance_all(
    delta_secs: f32,
    network: &SimRoadNetwork,
    intersections: &[SimIntersection],
    vehicles: &mut [SimVehicle],
    params: &FollowingParams,
) -> Result<usize, ConfigError> {
    let by_road = vehicles_by_road(vehicles);
    let mut finished = 0;

    for road in network.roads() {
        let Some(order) = by_road.get(&road.id) else {
            continue;
        };
        let intersection = intersections
            .get(road.destination.0)
            .ok_or(ConfigError::UnknownIntersection(road.destination))?;
        finished += advance_road(road, &intersection.light, order, vehicles, delta_secs, params);
    }

    Ok(finished)
}
