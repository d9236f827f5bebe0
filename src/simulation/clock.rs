//! Fixed-step simulation clock

use super::error::ConfigError;

/// Time is derived from the tick count so it never accumulates rounding error
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    ticks: u64,
    dt: f32,
}

impl SimClock {
    pub fn new(dt: f32) -> Result<Self, ConfigError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep(dt));
        }
        Ok(Self { ticks: 0, dt })
    }

    /// Current simulation time in seconds
    pub fn now(&self) -> f32 {
        (self.ticks as f64 * self.dt as f64) as f32
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Advance by one step
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Number of ticks whose start time lies in `[0, max_time]`
    pub fn ticks_until(&self, max_time: f32) -> u64 {
        if max_time.is_nan() || max_time < 0.0 {
            return 0;
        }
        // Tolerate f32 representation error in dt, e.g. 1.0 / 0.1
        let last = (max_time as f64 / self.dt as f64 + 1e-6).floor();
        last as u64 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_by_fixed_step() {
        let mut clock = SimClock::new(0.5).unwrap();
        assert_eq!(clock.now(), 0.0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), 1.0);
        assert_eq!(clock.dt(), 0.5);
    }

    #[test]
    fn test_clock_does_not_drift() {
        let mut clock = SimClock::new(0.1).unwrap();
        for _ in 0..100_000 {
            clock.advance();
        }
        let expected = 100_000.0 * 0.1;
        assert!(((clock.now() as f64 - expected) / expected).abs() < 1e-6, "now {}", clock.now());
        assert_eq!(clock.ticks(), 100_000);
    }

    #[test]
    fn test_ticks_until_is_inclusive() {
        assert_eq!(SimClock::new(0.1).unwrap().ticks_until(1.0), 11);
        assert_eq!(SimClock::new(1.0).unwrap().ticks_until(5.0), 6);
        assert_eq!(SimClock::new(2.0).unwrap().ticks_until(5.0), 3);
        assert_eq!(SimClock::new(0.3).unwrap().ticks_until(3.0), 11);
        assert_eq!(SimClock::new(1.0).unwrap().ticks_until(-1.0), 0);
    }

    #[test]
    fn test_clock_rejects_non_positive_step() {
        assert_eq!(SimClock::new(0.0), Err(ConfigError::InvalidTimeStep(0.0)));
        assert!(SimClock::new(-1.0).is_err());
        assert!(SimClock::new(f32::INFINITY).is_err());
    }
}
