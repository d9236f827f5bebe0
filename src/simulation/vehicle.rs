//! Vehicle state for the traffic simulation

use std::collections::VecDeque;

use super::types::{RoadId, SimRoad, VehicleId, VEHICLE_LENGTH, VEHICLE_MAX_ACCEL, VEHICLE_MAX_DECEL};

/// Flavor of a vehicle; scales the target speed at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleKind {
    #[default]
    Standard,
    Sports,
    Van,
    Motorcycle,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 4] = [
        VehicleKind::Standard,
        VehicleKind::Sports,
        VehicleKind::Van,
        VehicleKind::Motorcycle,
    ];

    pub fn speed_factor(self) -> f32 {
        match self {
            VehicleKind::Standard => 1.0,
            VehicleKind::Sports => 1.25,
            VehicleKind::Van => 0.85,
            VehicleKind::Motorcycle => 1.1,
        }
    }
}

/// A vehicle in the traffic simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub road: RoadId,
    /// Meters from the start of the current road
    pub position: f32,
    pub length: f32,
    pub max_accel: f32,
    pub max_decel: f32,
    pub kind: VehicleKind,
    pub target_speed: f32,
    /// Reached the end of the current road; cleared when routed onward
    pub finished: bool,
    /// Remaining planned roads, current road first
    pub route: Option<VecDeque<RoadId>>,
    pub enter_time: f32,
    pub exit_time: Option<f32>,
}

impl SimVehicle {
    pub fn new(id: VehicleId, road: &SimRoad, kind: VehicleKind, enter_time: f32) -> Self {
        Self {
            id,
            road: road.id,
            position: 0.0,
            length: VEHICLE_LENGTH,
            max_accel: VEHICLE_MAX_ACCEL,
            max_decel: VEHICLE_MAX_DECEL,
            kind,
            target_speed: road.speed * kind.speed_factor(),
            finished: false,
            route: None,
            enter_time,
            exit_time: None,
        }
    }

    /// Attach a planned route; its head must be the vehicle's current road
    pub fn with_route(mut self, route: impl IntoIterator<Item = RoadId>) -> Self {
        self.route = Some(route.into_iter().collect());
        self
    }

    pub fn with_position(mut self, position: f32) -> Self {
        self.position = position;
        self
    }

    /// Move onto the start of another road
    pub fn enter_road(&mut self, road: RoadId) {
        self.road = road;
        self.position = 0.0;
        self.finished = false;
    }

    pub fn has_exited(&self) -> bool {
        self.exit_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::{Direction, IntersectionId};

    fn road() -> SimRoad {
        SimRoad::new(RoadId(0), "Test", 100.0, 10.0, Direction::NS, IntersectionId(0))
    }

    #[test]
    fn test_target_speed_defaults_to_road_speed() {
        let vehicle = SimVehicle::new(VehicleId(1), &road(), VehicleKind::Standard, 0.0);
        assert_eq!(vehicle.target_speed, 10.0);
        assert_eq!(vehicle.position, 0.0);
        assert!(!vehicle.finished);
        assert!(vehicle.exit_time.is_none());
    }

    #[test]
    fn test_kind_scales_target_speed() {
        let sports = SimVehicle::new(VehicleId(1), &road(), VehicleKind::Sports, 0.0);
        let van = SimVehicle::new(VehicleId(2), &road(), VehicleKind::Van, 0.0);
        assert_eq!(sports.target_speed, 12.5);
        assert!(van.target_speed < 10.0);
    }

    #[test]
    fn test_enter_road_resets_progress() {
        let mut vehicle = SimVehicle::new(VehicleId(1), &road(), VehicleKind::Standard, 0.0)
            .with_position(100.0);
        vehicle.finished = true;
        vehicle.enter_road(RoadId(5));

        assert_eq!(vehicle.road, RoadId(5));
        assert_eq!(vehicle.position, 0.0);
        assert!(!vehicle.finished);
    }
}
