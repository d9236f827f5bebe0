//! Throughput and travel-time metrics

use std::fmt;

use super::vehicle::SimVehicle;

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunSummary {
    pub entered: usize,
    pub exited: usize,
    /// Mean travel time in seconds, rounded to two decimals
    pub avg_travel_time_s: f32,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entered={} exited={} avg_travel_time_s={:.2}",
            self.entered, self.exited, self.avg_travel_time_s
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub entered: usize,
    pub exited: usize,
    pub completed_times: Vec<f32>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter(&mut self) {
        self.entered += 1;
    }

    pub fn on_exit(&mut self, now: f32, vehicle: &SimVehicle) {
        self.record_exit((now - vehicle.enter_time).max(0.0));
    }

    /// Record an exit with an already computed travel time
    pub fn record_exit(&mut self, travel_time: f32) {
        self.exited += 1;
        self.completed_times.push(travel_time.max(0.0));
    }

    pub fn average_travel_time(&self) -> f32 {
        if self.completed_times.is_empty() {
            return 0.0;
        }
        let total: f64 = self.completed_times.iter().map(|t| *t as f64).sum();
        (total / self.completed_times.len() as f64) as f32
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            entered: self.entered,
            exited: self.exited,
            avg_travel_time_s: (self.average_travel_time() * 100.0).round() / 100.0,
        }
    }
}
