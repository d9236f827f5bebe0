//! Routing advancement for vehicles that reached the end of a road
//!
//! Routed vehicles follow their planned road list. Unrouted vehicles pick the
//! next road at each intersection: a chance to leave at border tiles, no
//! U-turns, and a preference for going straight.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::road_network::SimRoadNetwork;
use super::types::{RoadId, SimRoad};
use super::vehicle::SimVehicle;

/// What happens to a vehicle at the end of its road
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRoad {
    Continue(RoadId),
    Exit,
}

/// Pick the next road for an unrouted vehicle that finished `current`
pub fn choose_next_road(
    network: &SimRoadNetwork,
    current: &SimRoad,
    border_exit_probability: f64,
    rng: &mut StdRng,
) -> NextRoad {
    let node = current.destination;

    if network.is_border(node) && rng.random_bool(border_exit_probability) {
        return NextRoad::Exit;
    }

    let candidates: Vec<RoadId> = network
        .departing_roads(node)
        .into_iter()
        .filter(|road_id| match (current.origin, network.get_road(*road_id)) {
            (Some(origin), Some(road)) => road.destination != origin,
            (None, Some(_)) => true,
            (_, None) => false,
        })
        .collect();

    let straight: Vec<RoadId> = candidates
        .iter()
        .copied()
        .filter(|road_id| {
            network
                .get_road(*road_id)
                .is_some_and(|road| road.approach == current.approach)
        })
        .collect();

    let pool = if straight.is_empty() { &candidates } else { &straight };
    match pool.choose(rng) {
        Some(road_id) => NextRoad::Continue(*road_id),
        None => NextRoad::Exit,
    }
}

/// Move every vehicle that finished its road onto the next one, or leave it
/// finished if it has exited the network
///
/// Returns the number of vehicles moved onto another road.
pub fn advance_routing(
    vehicles: &mut [SimVehicle],
    network: &SimRoadNetwork,
    border_exit_probability: f64,
    rng: &mut StdRng,
) -> usize {
    let mut advanced = 0;

    for vehicle in vehicles.iter_mut() {
        if !vehicle.finished || vehicle.has_exited() {
            continue;
        }

        let next = match vehicle.route.as_mut() {
            Some(route) => {
                if route.front() == Some(&vehicle.road) {
                    route.pop_front();
                }
                match route.front() {
                    Some(road_id) => NextRoad::Continue(*road_id),
                    None => NextRoad::Exit,
                }
            }
            None => match network.get_road(vehicle.road) {
                Some(current) => {
                    choose_next_road(network, current, border_exit_probability, rng)
                }
                None => NextRoad::Exit,
            },
        };

        match next {
            NextRoad::Continue(road_id) => {
                debug!("vehicle {:?} continues onto road {:?}", vehicle.id, road_id);
                vehicle.enter_road(road_id);
                if let Some(road) = network.get_road(road_id) {
                    vehicle.target_speed = road.speed * vehicle.kind.speed_factor();
                }
                advanced += 1;
            }
            NextRoad::Exit => debug!("vehicle {:?} leaves the network", vehicle.id),
        }
    }

    advanced
}
