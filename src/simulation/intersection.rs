//! Intersection logic for the traffic simulation
//!
//! An intersection owns its traffic light and the policy that drives it. It
//! keeps a registry of incoming roads per approach direction but never owns
//! vehicles: queue information arrives as an [`IntersectionState`] snapshot.

use super::policy::{IntersectionState, SignalDecision, SignalPolicy};
use super::traffic_light::TrafficLight;
use super::types::{Direction, GridCoord, IntersectionId, RoadId};

#[derive(Debug)]
pub struct SimIntersection {
    pub id: IntersectionId,
    pub name: String,
    pub light: TrafficLight,
    /// Shift applied to the clock before the policy is consulted
    pub phase_offset: f32,
    pub coord: Option<GridCoord>,
    policy: Box<dyn SignalPolicy>,
    incoming_ns: Vec<RoadId>,
    incoming_ew: Vec<RoadId>,
}

impl SimIntersection {
    pub fn new(id: IntersectionId, name: impl Into<String>, policy: Box<dyn SignalPolicy>) -> Self {
        Self {
            id,
            name: name.into(),
            light: TrafficLight::new(),
            phase_offset: 0.0,
            coord: None,
            policy,
            incoming_ns: Vec::new(),
            incoming_ew: Vec::new(),
        }
    }

    pub fn with_phase_offset(mut self, offset: f32) -> Self {
        self.phase_offset = offset;
        self
    }

    pub fn with_coord(mut self, coord: GridCoord) -> Self {
        self.coord = Some(coord);
        self
    }

    /// Register a road ending at this intersection
    pub fn register_road(&mut self, road: RoadId, approach: Direction) {
        let incoming = match approach {
            Direction::NS => &mut self.incoming_ns,
            Direction::EW => &mut self.incoming_ew,
        };
        if !incoming.contains(&road) {
            incoming.push(road);
        }
    }

    pub fn incoming_roads(&self, direction: Direction) -> &[RoadId] {
        match direction {
            Direction::NS => &self.incoming_ns,
            Direction::EW => &self.incoming_ew,
        }
    }

    pub fn all_incoming_roads(&self) -> impl Iterator<Item = RoadId> + '_ {
        self.incoming_ns.iter().chain(self.incoming_ew.iter()).copied()
    }

    /// Ask the policy for a decision and show it on the light
    pub fn apply_policy(&mut self, state: &IntersectionState, now: f32) -> SignalDecision {
        let decision = self.policy.decide(state, now + self.phase_offset);
        self.light.set(decision.direction, decision.color);
        decision
    }
}
