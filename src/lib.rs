//! Traffic Signal Simulation Library
//!
//! A discrete-time traffic simulation core: signalised intersections, pluggable
//! signal policies, car-following kinematics and grid routing.

pub mod simulation;
