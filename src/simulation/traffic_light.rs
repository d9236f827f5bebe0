//! Traffic light state for a single intersection
//!
//! Only one direction is ever shown; every approach of the other direction
//! is red by construction.

use super::error::ConfigError;
use super::types::{Direction, SignalColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficLight {
    direction: Direction,
    color: SignalColor,
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self {
            direction: Direction::NS,
            color: SignalColor::Red,
        }
    }
}

impl TrafficLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn color(&self) -> SignalColor {
        self.color
    }

    pub fn set(&mut self, direction: Direction, color: SignalColor) {
        self.direction = direction;
        self.color = color;
    }

    /// Set the state from its textual form (`"NS"`/`"EW"`, `"GREEN"`/`"YELLOW"`/`"RED"`)
    ///
    /// Both values are parsed before anything is written, so a rejected call
    /// leaves the light untouched.
    pub fn set_state(&mut self, direction: &str, color: &str) -> Result<(), ConfigError> {
        let direction: Direction = direction.parse()?;
        let color: SignalColor = color.parse()?;
        self.set(direction, color);
        Ok(())
    }

    pub fn is_green_for(&self, approach: Direction) -> bool {
        self.direction == approach && self.color == SignalColor::Green
    }

    pub fn is_yellow_for(&self, approach: Direction) -> bool {
        self.direction == approach && self.color == SignalColor::Yellow
    }

    pub fn is_red_for(&self, approach: Direction) -> bool {
        !self.is_green_for(approach) && !self.is_yellow_for(approach)
    }
}
