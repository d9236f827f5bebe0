//! Fixed-step simulation driver
//!
//! Owns the clock, the world and the metrics, and runs ticks until the time
//! budget is spent. Rendering is a read-only callback invoked after each tick.

use anyhow::{Context, Result};
use log::{debug, info};

use super::clock::SimClock;
use super::metrics::{Metrics, RunSummary};
use super::world::{SimWorld, Spawner, TickReport};

/// Render callback: a read-only view of the world and the running summary
pub type RenderFn<'a> = dyn FnMut(&SimWorld, &RunSummary) -> Option<String> + 'a;

/// Log text for a frame rendered after the tick that started at `tick_start`
fn frame_message(tick_start: f32, frame: &str) -> String {
    format!("frame at {:.1}s\n{}", tick_start, frame)
}

pub struct Simulation {
    world: SimWorld,
    clock: SimClock,
    metrics: Metrics,
    max_time: f32,
}

impl Simulation {
    pub fn new(world: SimWorld, delta_secs: f32, max_time: f32) -> Result<Self> {
        let clock = SimClock::new(delta_secs).context("Invalid simulation time step")?;
        Ok(Self {
            world,
            clock,
            metrics: Metrics::new(),
            max_time,
        })
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Run one tick at the current time, then advance the clock
    pub fn step<S: Spawner + ?Sized>(&mut self, spawner: &mut S) -> Result<TickReport> {
        let now = self.clock.now();
        let report = self
            .world
            .tick(now, self.clock.dt(), spawner, &mut self.metrics)
            .with_context(|| format!("Tick at {:.2}s failed", now))?;
        if report.exited > 0 || report.spawned > 0 {
            debug!(
                "t={:.1}s spawned={} reached_end={} exited={} live={}",
                now,
                report.spawned,
                report.reached_end,
                report.exited,
                self.world.vehicles().len()
            );
        }
        self.clock.advance();
        Ok(report)
    }

    /// Run every tick starting in `[0, max_time]`, returning the final summary
    pub fn run<S: Spawner + ?Sized>(
        &mut self,
        spawner: &mut S,
        mut render: Option<&mut RenderFn<'_>>,
    ) -> Result<RunSummary> {
        info!(
            "Running simulation: dt={}s, max_time={}s, {} intersections, {} roads",
            self.clock.dt(),
            self.max_time,
            self.world.intersections().len(),
            self.world.roads().len()
        );

        let total_ticks = self.clock.ticks_until(self.max_time);
        while self.clock.ticks() < total_ticks {
            let now = self.clock.now();
            self.step(spawner)?;

            if let Some(render) = render.as_deref_mut() {
                let summary = self.metrics.summary();
                if let Some(frame) = render(&self.world, &summary) {
                    info!("{}", frame_message(now, &frame));
                }
            }
        }

        Ok(self.metrics.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::policy::FixedCyclePolicy;
    use crate::simulation::types::{Direction, SignalColor};
    use crate::simulation::world::NoSpawn;

    fn single_intersection() -> SimWorld {
        let mut world = SimWorld::new();
        let x1 = world.add_intersection("X1", Box::new(FixedCyclePolicy::default()));
        world
            .add_approach("North-South", 120.0, 10.0, Direction::NS, x1)
            .unwrap();
        world
    }

    #[test]
    fn test_run_is_inclusive_of_max_time() {
        let mut sim = Simulation::new(single_intersection(), 1.0, 5.0).unwrap();
        let mut frames = 0;
        let mut render = |_: &SimWorld, _: &RunSummary| -> Option<String> {
            frames += 1;
            None
        };
        let render: &mut RenderFn<'_> = &mut render;
        sim.run(&mut NoSpawn, Some(render)).unwrap();
        assert_eq!(frames, 6);
        assert_eq!(sim.now(), 6.0);
    }

    #[test]
    fn test_short_steps_reach_max_time() {
        let mut sim = Simulation::new(single_intersection(), 0.1, 1.0).unwrap();
        let mut frames = 0;
        let mut render = |_: &SimWorld, _: &RunSummary| -> Option<String> {
            frames += 1;
            None
        };
        let render: &mut RenderFn<'_> = &mut render;
        sim.run(&mut NoSpawn, Some(render)).unwrap();
        assert_eq!(frames, 11);
        assert!((sim.now() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_frames_follow_tick_start_times() {
        // Ticks start at 0, 4, 8 and 12 s
        let mut sim = Simulation::new(single_intersection(), 4.0, 12.0).unwrap();
        let mut seen = Vec::new();
        let mut render = |world: &SimWorld, _: &RunSummary| -> Option<String> {
            let light = world.intersections()[0].light;
            seen.push((light.direction(), light.color()));
            None
        };
        let render: &mut RenderFn<'_> = &mut render;
        sim.run(&mut NoSpawn, Some(render)).unwrap();
        assert_eq!(
            seen,
            vec![
                (Direction::NS, SignalColor::Green),
                (Direction::NS, SignalColor::Green),
                (Direction::NS, SignalColor::Yellow),
                (Direction::EW, SignalColor::Green),
            ]
        );
        assert_eq!(frame_message(8.0, "NS:C"), "frame at 8.0s\nNS:C");
    }

    #[test]
    fn test_invalid_step_rejected() {
        assert!(Simulation::new(single_intersection(), 0.0, 5.0).is_err());
    }

    #[test]
    fn test_empty_world_fails_fast() {
        let mut sim = Simulation::new(SimWorld::new(), 1.0, 5.0).unwrap();
        assert!(sim.run(&mut NoSpawn, None).is_err());
    }
}
