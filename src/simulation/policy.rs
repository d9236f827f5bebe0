//! Signal control policies
//!
//! A policy looks at a read-only snapshot of its intersection and returns the
//! (direction, color) pair to display. The world applies the decision to the
//! traffic light, so policies never touch intersection state themselves.

use std::fmt::Debug;

use log::debug;

use super::error::ConfigError;
use super::traffic_light::TrafficLight;
use super::types::{Direction, IntersectionId, SignalColor};

/// The state a policy wants its traffic light to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalDecision {
    pub direction: Direction,
    pub color: SignalColor,
}

impl SignalDecision {
    pub fn new(direction: Direction, color: SignalColor) -> Self {
        Self { direction, color }
    }
}

/// A vehicle on one of the intersection's incoming roads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachingVehicle {
    pub approach: Direction,
    /// Distance left to the end of its road
    pub distance_to_stop: f32,
}

/// Snapshot of an intersection handed to a policy each tick
#[derive(Debug, Clone, Default)]
pub struct IntersectionState {
    pub intersection: Option<IntersectionId>,
    pub light: TrafficLight,
    pub approaching: Vec<ApproachingVehicle>,
}

impl IntersectionState {
    /// True when a vehicle of `direction` is within `window` meters of its stop line
    pub fn has_queue(&self, direction: Direction, window: f32) -> bool {
        self.approaching
            .iter()
            .any(|v| v.approach == direction && v.distance_to_stop <= window)
    }
}

pub trait SignalPolicy: Debug {
    fn decide(&mut self, state: &IntersectionState, now: f32) -> SignalDecision;
}

/// Repeats NS green, NS yellow, EW green, EW yellow with fixed durations
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCyclePolicy {
    green_ns: f32,
    yellow_ns: f32,
    green_ew: f32,
    yellow_ew: f32,
    cycle: f32,
}

impl Default for FixedCyclePolicy {
    fn default() -> Self {
        Self {
            green_ns: 8.0,
            yellow_ns: 2.0,
            green_ew: 8.0,
            yellow_ew: 2.0,
            cycle: 20.0,
        }
    }
}

impl FixedCyclePolicy {
    pub fn new(
        green_ns: f32,
        yellow_ns: f32,
        green_ew: f32,
        yellow_ew: f32,
    ) -> Result<Self, ConfigError> {
        let durations = [green_ns, yellow_ns, green_ew, yellow_ew];
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ConfigError::InvalidTiming(
                "phase durations must be finite and non-negative",
            ));
        }
        let cycle: f32 = durations.iter().sum();
        if cycle <= 0.0 {
            return Err(ConfigError::InvalidTiming("cycle length must be positive"));
        }
        Ok(Self {
            green_ns,
            yellow_ns,
            green_ew,
            yellow_ew,
            cycle,
        })
    }

    pub fn cycle(&self) -> f32 {
        self.cycle
    }

    /// Phase shown at `now`; boundaries belong to the later phase
    pub fn phase_at(&self, now: f32) -> SignalDecision {
        let t = now.rem_euclid(self.cycle);

        if t < self.green_ns {
            SignalDecision::new(Direction::NS, SignalColor::Green)
        } else if t < self.green_ns + self.yellow_ns {
            SignalDecision::new(Direction::NS, SignalColor::Yellow)
        } else if t < self.green_ns + self.yellow_ns + self.green_ew {
            SignalDecision::new(Direction::EW, SignalColor::Green)
        } else {
            SignalDecision::new(Direction::EW, SignalColor::Yellow)
        }
    }
}

impl SignalPolicy for FixedCyclePolicy {
    fn decide(&mut self, _state: &IntersectionState, now: f32) -> SignalDecision {
        self.phase_at(now)
    }
}

/// Queue-detection switching bounded by minimum and maximum green times
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatedPolicy {
    min_green: f32,
    max_green: f32,
    yellow: f32,
    queue_window_m: f32,
    direction: Direction,
    color: SignalColor,
    phase_start: f32,
}

impl Default for ActuatedPolicy {
    fn default() -> Self {
        Self {
            min_green: 6.0,
            max_green: 20.0,
            yellow: 2.0,
            queue_window_m: 25.0,
            direction: Direction::NS,
            color: SignalColor::Green,
            phase_start: 0.0,
        }
    }
}

impl ActuatedPolicy {
    pub fn new(
        min_green: f32,
        max_green: f32,
        yellow: f32,
        queue_window_m: f32,
    ) -> Result<Self, ConfigError> {
        let values = [min_green, max_green, yellow, queue_window_m];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidTiming(
                "actuated timings must be finite and non-negative",
            ));
        }
        if min_green > max_green {
            return Err(ConfigError::InvalidTiming("min_green exceeds max_green"));
        }
        Ok(Self {
            min_green,
            max_green,
            yellow,
            queue_window_m,
            ..Self::default()
        })
    }

    pub fn queue_window(&self) -> f32 {
        self.queue_window_m
    }

    fn switch_to_yellow(&mut self, now: f32) {
        debug!("actuated: {} green -> yellow at {:.1}s", self.direction, now);
        self.color = SignalColor::Yellow;
        self.phase_start = now;
    }

    fn switch_to_other_green(&mut self, now: f32) {
        self.direction = self.direction.other();
        self.color = SignalColor::Green;
        self.phase_start = now;
        debug!("actuated: {} green at {:.1}s", self.direction, now);
    }
}

impl SignalPolicy for ActuatedPolicy {
    fn decide(&mut self, state: &IntersectionState, now: f32) -> SignalDecision {
        let time_in_phase = now - self.phase_start;

        match self.color {
            SignalColor::Green => {
                if time_in_phase >= self.max_green {
                    self.switch_to_yellow(now);
                } else if time_in_phase >= self.min_green
                    && !state.has_queue(self.direction, self.queue_window_m)
                {
                    self.switch_to_yellow(now);
                }
            }
            SignalColor::Yellow => {
                if time_in_phase >= self.yellow {
                    self.switch_to_other_green(now);
                }
            }
            // Never entered: the policy only cycles green and yellow
            SignalColor::Red => self.switch_to_other_green(now),
        }

        SignalDecision::new(self.direction, self.color)
    }
}

/// Placeholder for a learned controller
///
/// Every decision is forwarded to an [`ActuatedPolicy`] so the interface is
/// in place while the signal behavior stays a working heuristic.
#[derive(Debug, Clone, Default)]
pub struct LearnedPolicy {
    delegate: ActuatedPolicy,
}

impl LearnedPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalPolicy for LearnedPolicy {
    fn decide(&mut self, state: &IntersectionState, now: f32) -> SignalDecision {
        self.delegate.decide(state, now)
    }
}

/// Policy family used when a whole network needs one instance per intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Fixed,
    Actuated,
    Learned,
}

impl PolicyKind {
    /// A fresh policy with default timings
    pub fn build(self) -> Box<dyn SignalPolicy> {
        match self {
            PolicyKind::Fixed => Box::new(FixedCyclePolicy::default()),
            PolicyKind::Actuated => Box::new(ActuatedPolicy::default()),
            PolicyKind::Learned => Box::new(LearnedPolicy::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued(approach: Direction, distance_to_stop: f32) -> IntersectionState {
        IntersectionState {
            approaching: vec![ApproachingVehicle {
                approach,
                distance_to_stop,
            }],
            ..IntersectionState::default()
        }
    }

    #[test]
    fn test_fixed_cycle_decisions() {
        let mut policy = FixedCyclePolicy::new(8.0, 2.0, 8.0, 2.0).unwrap();
        let state = IntersectionState::default();
        let expect = |d, c| SignalDecision::new(d, c);

        assert_eq!(policy.decide(&state, 0.0), expect(Direction::NS, SignalColor::Green));
        assert_eq!(policy.decide(&state, 7.0), expect(Direction::NS, SignalColor::Green));
        assert_eq!(policy.decide(&state, 9.0), expect(Direction::NS, SignalColor::Yellow));
        assert_eq!(policy.decide(&state, 10.0), expect(Direction::EW, SignalColor::Green));
        assert_eq!(policy.decide(&state, 17.9), expect(Direction::EW, SignalColor::Green));
        assert_eq!(policy.decide(&state, 18.0), expect(Direction::EW, SignalColor::Yellow));
        assert_eq!(policy.decide(&state, 21.5), expect(Direction::NS, SignalColor::Green));
    }

    #[test]
    fn test_fixed_cycle_boundary_belongs_to_next_phase() {
        let policy = FixedCyclePolicy::new(8.0, 2.0, 8.0, 2.0).unwrap();
        assert_eq!(policy.phase_at(8.0).color, SignalColor::Yellow);
        assert_eq!(policy.phase_at(20.0).direction, Direction::NS);
        assert_eq!(policy.phase_at(20.0).color, SignalColor::Green);
    }

    #[test]
    fn test_fixed_cycle_zero_length_phase_is_skipped() {
        let policy = FixedCyclePolicy::new(5.0, 0.0, 5.0, 0.0).unwrap();
        assert_eq!(policy.phase_at(5.0), SignalDecision::new(Direction::EW, SignalColor::Green));
    }

    #[test]
    fn test_fixed_cycle_rejects_bad_durations() {
        assert!(FixedCyclePolicy::new(-1.0, 2.0, 8.0, 2.0).is_err());
        assert!(FixedCyclePolicy::new(0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_actuated_holds_green_while_queue_present() {
        let mut policy = ActuatedPolicy::default();
        let state = queued(Direction::NS, 10.0);

        for t in 0..20 {
            let decision = policy.decide(&state, t as f32);
            assert_eq!(decision, SignalDecision::new(Direction::NS, SignalColor::Green));
        }
        // max_green reached even though demand remains
        assert_eq!(policy.decide(&state, 20.0).color, SignalColor::Yellow);
    }

    #[test]
    fn test_actuated_terminates_early_without_demand() {
        let mut policy = ActuatedPolicy::default();
        let empty = IntersectionState::default();

        assert_eq!(policy.decide(&empty, 5.0).color, SignalColor::Green);
        assert_eq!(policy.decide(&empty, 6.0).color, SignalColor::Yellow);
        assert_eq!(policy.decide(&empty, 7.0).color, SignalColor::Yellow);
        assert_eq!(
            policy.decide(&empty, 8.0),
            SignalDecision::new(Direction::EW, SignalColor::Green)
        );
    }

    #[test]
    fn test_actuated_ignores_queue_outside_window_or_direction() {
        let mut far = ActuatedPolicy::default();
        assert_eq!(far.decide(&queued(Direction::NS, 40.0), 6.0).color, SignalColor::Yellow);

        let mut crossing = ActuatedPolicy::default();
        assert_eq!(
            crossing.decide(&queued(Direction::EW, 1.0), 6.0).color,
            SignalColor::Yellow
        );
    }

    #[test]
    fn test_learned_policy_matches_actuated() {
        let mut learned = LearnedPolicy::new();
        let mut actuated = ActuatedPolicy::default();
        let state = queued(Direction::NS, 5.0);

        for step in 0..60 {
            let now = step as f32 * 0.5;
            assert_eq!(learned.decide(&state, now), actuated.decide(&state, now));
        }
    }

    #[test]
    fn test_actuated_validation() {
        assert!(ActuatedPolicy::new(10.0, 5.0, 2.0, 25.0).is_err());
        assert!(ActuatedPolicy::new(6.0, 20.0, -2.0, 25.0).is_err());
        let policy = ActuatedPolicy::new(4.0, 12.0, 3.0, 15.0).unwrap();
        assert_eq!(policy.queue_window(), 15.0);
    }
}
