//! Configuration errors raised by the simulation core
//!
//! These are fatal: they signal a world, grid or policy that was built
//! incorrectly. Expected negative outcomes (no route, no next road) are not
//! errors and never show up here.

use thiserror::Error;

use super::types::{GridCoord, IntersectionId, RoadId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("world must contain at least one intersection")]
    NoIntersections,
    #[error("invalid direction: {0:?}")]
    InvalidDirection(String),
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
    #[error("grid coordinate {0} is not a registered network node")]
    UnknownCoordinate(GridCoord),
    #[error("intersection {0:?} does not exist")]
    UnknownIntersection(IntersectionId),
    #[error("road {0:?} does not exist")]
    UnknownRoad(RoadId),
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("invalid signal timing: {0}")]
    InvalidTiming(&'static str),
    #[error("invalid grid: {0}")]
    InvalidGrid(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
