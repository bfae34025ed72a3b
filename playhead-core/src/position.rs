//! Engine tick normalization.

/// Raw progress report from the playback engine.
///
/// Engines differ in what they fill in reliably: some report only fractions,
/// some only seconds, and the duration usually arrives late.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineTick {
    pub played_fraction: f64,
    pub played_seconds: f64,
    pub loaded_fraction: f64,
    pub loaded_seconds: f64,
    /// Total length if the engine includes it with the tick
    pub duration_seconds: Option<f64>,
}

impl EngineTick {
    /// Tick at `fraction` of a `duration_seconds` long stream.
    pub fn at_fraction(fraction: f64, duration_seconds: f64) -> Self {
        Self {
            played_fraction: fraction,
            played_seconds: fraction * duration_seconds,
            loaded_fraction: fraction,
            loaded_seconds: fraction * duration_seconds,
            duration_seconds: Some(duration_seconds),
        }
    }

    /// Tick at `seconds` of a `duration_seconds` long stream.
    pub fn at_seconds(seconds: f64, duration_seconds: f64) -> Self {
        let fraction = if duration_seconds > 0.0 {
            seconds / duration_seconds
        } else {
            0.0
        };
        Self {
            played_fraction: fraction,
            played_seconds: seconds,
            loaded_fraction: fraction,
            loaded_seconds: seconds,
            duration_seconds: Some(duration_seconds),
        }
    }

    pub fn with_loaded_fraction(mut self, loaded_fraction: f64) -> Self {
        self.loaded_fraction = loaded_fraction;
        self
    }
}

/// Normalized position/duration pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockReading {
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub buffered_fraction: f64,
}

impl ClockReading {
    pub fn play_ratio(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Derives `{position, duration}` from engine ticks. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionClock;

impl PositionClock {
    /// Duration the engine itself vouches for: the reported duration, or one
    /// derived from `played_seconds / played_fraction`.
    pub fn engine_duration(tick: &EngineTick) -> Option<f64> {
        if let Some(duration) = tick.duration_seconds
            && is_positive(duration)
        {
            return Some(duration);
        }

        if is_positive(tick.played_seconds) && is_positive(tick.played_fraction)
        {
            let derived = tick.played_seconds / tick.played_fraction;
            if is_positive(derived) {
                return Some(derived);
            }
        }

        None
    }

    /// Normalizes `tick` against the last valid reading.
    ///
    /// Ticks without any usable duration leave `last` untouched.
    pub fn read(tick: &EngineTick, last: ClockReading) -> ClockReading {
        let duration = match Self::engine_duration(tick) {
            Some(duration) => duration,
            None if is_positive(last.duration_seconds) => last.duration_seconds,
            None => return last,
        };

        let position = if tick.played_seconds.is_finite()
            && tick.played_seconds >= 0.0
        {
            tick.played_seconds
        } else if tick.played_fraction.is_finite() {
            tick.played_fraction * duration
        } else {
            last.position_seconds
        };

        let buffered = if tick.loaded_fraction.is_finite() {
            tick.loaded_fraction.clamp(0.0, 1.0)
        } else {
            last.buffered_fraction
        };

        ClockReading {
            position_seconds: position.clamp(0.0, duration),
            duration_seconds: duration,
            buffered_fraction: buffered,
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_duration_wins() {
        let reading = PositionClock::read(
            &EngineTick::at_seconds(30.0, 600.0),
            ClockReading::default(),
        );
        assert_eq!(reading.position_seconds, 30.0);
        assert_eq!(reading.duration_seconds, 600.0);
    }

    #[test]
    fn duration_is_derived_from_fraction_and_seconds() {
        let tick = EngineTick {
            played_fraction: 0.25,
            played_seconds: 150.0,
            ..Default::default()
        };
        assert_eq!(PositionClock::engine_duration(&tick), Some(600.0));
    }

    #[test]
    fn tick_without_duration_uses_last_duration() {
        let last = ClockReading {
            position_seconds: 10.0,
            duration_seconds: 600.0,
            buffered_fraction: 0.1,
        };
        let tick = EngineTick {
            played_seconds: 42.0,
            ..Default::default()
        };
        let reading = PositionClock::read(&tick, last);
        assert_eq!(reading.position_seconds, 42.0);
        assert_eq!(reading.duration_seconds, 600.0);
    }

    #[test]
    fn malformed_tick_keeps_last_reading() {
        let last = ClockReading {
            position_seconds: 10.0,
            duration_seconds: 0.0,
            buffered_fraction: 0.0,
        };
        let tick = EngineTick {
            played_seconds: 5.0,
            duration_seconds: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(PositionClock::read(&tick, last), last);
    }

    #[test]
    fn position_is_clamped_into_duration() {
        let tick = EngineTick {
            played_seconds: 700.0,
            duration_seconds: Some(600.0),
            ..Default::default()
        };
        let reading = PositionClock::read(&tick, ClockReading::default());
        assert_eq!(reading.position_seconds, 600.0);
        assert_eq!(reading.play_ratio(), 1.0);
    }

    #[test]
    fn nan_seconds_fall_back_to_fraction() {
        let tick = EngineTick {
            played_fraction: 0.5,
            played_seconds: f64::NAN,
            duration_seconds: Some(200.0),
            ..Default::default()
        };
        let reading = PositionClock::read(&tick, ClockReading::default());
        assert_eq!(reading.position_seconds, 100.0);
    }
}
