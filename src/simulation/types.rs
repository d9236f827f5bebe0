//! Core types for the traffic simulation
//!
//! Handles, enumerations and the road segment type shared by every other
//! simulation module.

use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;

/// Handle of a road: its index in the network's insertion-ordered road list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoadId(pub usize);

/// Handle of an intersection: its index in the world's intersection list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntersectionId(pub usize);

/// Handle of a vehicle, never reused within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

/// Signal phase group a road belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    NS,
    EW,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::NS, Direction::EW];

    /// The crossing phase group
    pub fn other(self) -> Self {
        match self {
            Direction::NS => Direction::EW,
            Direction::EW => Direction::NS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::NS => "NS",
            Direction::EW => "EW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NS" => Ok(Direction::NS),
            "EW" => Ok(Direction::EW),
            other => Err(ConfigError::InvalidDirection(other.to_string())),
        }
    }
}

/// Color shown by a traffic light for its active direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalColor {
    Green,
    Yellow,
    Red,
}

impl SignalColor {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalColor::Green => "GREEN",
            SignalColor::Yellow => "YELLOW",
            SignalColor::Red => "RED",
        }
    }
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GREEN" => Ok(SignalColor::Green),
            "YELLOW" => Ok(SignalColor::Yellow),
            "RED" => Ok(SignalColor::Red),
            other => Err(ConfigError::InvalidColor(other.to_string())),
        }
    }
}

/// A cell of the grid description, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Centre of the tile in render pixels
    pub fn tile_center(&self) -> (f32, f32) {
        (
            (self.col as f32 + 0.5) * TILE_PX,
            (self.row as f32 + 0.5) * TILE_PX,
        )
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A directed road segment ending at an intersection
#[derive(Debug, Clone)]
pub struct SimRoad {
    pub id: RoadId,
    pub name: String,
    pub length: f32,
    pub speed: f32,
    pub approach: Direction,
    /// Intersection controlling the end of the road
    pub destination: IntersectionId,
    /// Intersection the road departs from, if it is part of the routable graph
    pub origin: Option<IntersectionId>,
    pub from_tile: Option<GridCoord>,
    pub to_tile: Option<GridCoord>,
    /// Polyline in render pixels, only read by renderers
    pub screen_points: Vec<(f32, f32)>,
}

impl SimRoad {
    pub fn new(
        id: RoadId,
        name: impl Into<String>,
        length: f32,
        speed: f32,
        approach: Direction,
        destination: IntersectionId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            length,
            speed,
            approach,
            destination,
            origin: None,
            from_tile: None,
            to_tile: None,
            screen_points: Vec::new(),
        }
    }

    /// Attach grid topology: origin node and the tiles at both ends
    pub fn with_topology(
        mut self,
        origin: IntersectionId,
        from_tile: GridCoord,
        to_tile: GridCoord,
    ) -> Self {
        self.origin = Some(origin);
        self.from_tile = Some(from_tile);
        self.to_tile = Some(to_tile);
        self.screen_points = vec![from_tile.tile_center(), to_tile.tile_center()];
        self
    }

    pub fn clamp_position(&self, position: f32) -> f32 {
        position.clamp(0.0, self.length.max(0.0))
    }

    /// Position along the road where vehicles wait for a green light
    pub fn stop_line(&self, offset: f32) -> f32 {
        (self.length - offset).max(0.0)
    }

    /// Fraction of the road covered at `position`, safe for zero-length roads
    pub fn progress(&self, position: f32) -> f32 {
        (position / self.length.max(POSITION_EPSILON)).clamp(0.0, 1.0)
    }
}

/// Physical length of a vehicle in meters
pub const VEHICLE_LENGTH: f32 = 4.5;

/// Maximum acceleration (m/s^2), reserved for car-following refinement
pub const VEHICLE_MAX_ACCEL: f32 = 2.0;

/// Maximum deceleration (m/s^2), reserved for car-following refinement
pub const VEHICLE_MAX_DECEL: f32 = 4.5;

/// Tolerance used when deciding a vehicle reached the end of its road
pub const POSITION_EPSILON: f32 = 1e-6;

/// Render pixels per grid tile
pub const TILE_PX: f32 = 32.0;
