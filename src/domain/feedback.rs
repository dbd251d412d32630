//! Proximity feedback
//!
//! Maps the smoothed distance to one of three levels and gates a periodic
//! pulse. The pulse gate is a prescaler over a fast fixed-period tick: each
//! level fires once every `divisor` ticks.

use std::time::Duration;

/// Distance above which the accessory is considered far
pub const FAR_THRESHOLD_M: f32 = 4.0;
/// Distance above which the accessory is considered near
pub const NEAR_THRESHOLD_M: f32 = 2.0;

/// Cadence of the pulse gate tick
pub const TICK_PERIOD: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLevel {
    /// Level 0, more than 4 m away
    Far,
    /// Level 1, between 2 and 4 m
    Near,
    /// Level 2, 2 m or closer
    Close,
}

impl FeedbackLevel {
    pub fn from_distance(distance: f32) -> Self {
        if distance > FAR_THRESHOLD_M {
            Self::Far
        } else if distance > NEAR_THRESHOLD_M {
            Self::Near
        } else {
            Self::Close
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Far => 0,
            Self::Near => 1,
            Self::Close => 2,
        }
    }

    /// Ticks between pulses
    pub fn divisor(self) -> u32 {
        match self {
            Self::Far => 8,
            Self::Near => 4,
            Self::Close => 1,
        }
    }

    pub fn pulse_duration(self) -> Duration {
        match self {
            Self::Far => Duration::from_millis(1000),
            Self::Near => Duration::from_millis(500),
            Self::Close => Duration::from_millis(100),
        }
    }
}

/// One haptic/audio pulse to be played by the output devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseSpec {
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackState {
    pub level: FeedbackLevel,
    /// `None` until the first level has been selected
    pub previous_level: Option<FeedbackLevel>,
    pub tick_counter: u32,
}

impl Default for FeedbackState {
    fn default() -> Self {
        Self {
            level: FeedbackLevel::Far,
            previous_level: None,
            tick_counter: 0,
        }
    }
}

/// Level selection and pulse gate.
///
/// Gating on connection and the feedback switch is done by the caller.
#[derive(Debug, Clone, Default)]
pub struct FeedbackSelector {
    state: FeedbackState,
}

impl FeedbackSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the level for a smoothed distance, restarting the cadence when it changes
    pub fn select_level(&mut self, avg_distance: f32) -> FeedbackLevel {
        let level = FeedbackLevel::from_distance(avg_distance);
        self.state.level = level;

        if self.state.previous_level != Some(level) {
            self.state.tick_counter = 0;
            self.state.previous_level = Some(level);
            tracing::debug!(
                "Feedback level changed to {} ({:.2} m)",
                level.index(),
                avg_distance
            );
        }

        level
    }

    pub fn tick(&mut self) -> Option<PulseSpec> {
        self.state.tick_counter += 1;

        if self.state.tick_counter < self.state.level.divisor() {
            return None;
        }

        self.state.tick_counter = 0;
        Some(PulseSpec {
            duration: self.state.level.pulse_duration(),
        })
    }

    pub fn level(&self) -> FeedbackLevel {
        self.state.level
    }

    pub fn state(&self) -> FeedbackState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = FeedbackState::default();
    }
}
