//! Orientation indicator mapping
//!
//! Converts the smoothed direction vector into integer azimuth/elevation
//! angles and turns successive angles into incremental rotations for the
//! on-screen indicator.

use crate::domain::models::{Direction, InteractionMode};
use std::f32::consts::FRAC_PI_2;

/// Raw multiplier applied to the angle in radians. Not a degree conversion;
/// readouts and indicator deltas are calibrated against it.
const ANGLE_SCALE: f32 = 90.0;

/// Elevation the indicator rests at in fixed-spin mode
const FLAT_ELEVATION: i32 = 90;

pub fn azimuth(direction: &Direction) -> f32 {
    direction.x.asin()
}

pub fn elevation(direction: &Direction) -> f32 {
    direction.z.atan2(direction.y) + FRAC_PI_2
}

/// Integer (azimuth, elevation) for a direction vector
pub fn derive_angles(direction: &Direction) -> (i32, i32) {
    (
        scale_angle(azimuth(direction)),
        scale_angle(elevation(direction)),
    )
}

fn scale_angle(radians: f32) -> i32 {
    // Truncates toward zero
    (ANGLE_SCALE * radians) as i32
}

/// Per-axis rotation to apply to the indicator, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationDelta {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrientationState {
    pub azimuth: i32,
    pub elevation: i32,
    pub spin: i32,
    pub mode: InteractionMode,
}

impl OrientationState {
    /// Pure transition: the next state and the delta that reaches it
    pub fn step(
        self,
        new_azimuth: i32,
        new_elevation: i32,
        mode: InteractionMode,
    ) -> (OrientationState, RotationDelta) {
        let (elevation, azimuth, spin) = match mode {
            InteractionMode::Free => (new_elevation, new_azimuth, 0),
            InteractionMode::FixedSpin => (FLAT_ELEVATION, 0, new_azimuth),
        };

        let delta = RotationDelta {
            dx: elevation - self.elevation,
            dy: azimuth - self.azimuth,
            dz: spin - self.spin,
        };

        let next = OrientationState {
            azimuth,
            elevation,
            spin,
            mode,
        };

        (next, delta)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrientationMapper {
    state: OrientationState,
}

impl OrientationMapper {
    pub fn new(mode: InteractionMode) -> Self {
        Self {
            state: OrientationState {
                mode,
                ..Default::default()
            },
        }
    }

    pub fn apply(
        &mut self,
        new_azimuth: i32,
        new_elevation: i32,
        mode: InteractionMode,
    ) -> RotationDelta {
        let (next, delta) = self.state.step(new_azimuth, new_elevation, mode);
        self.state = next;
        delta
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.state.mode = mode;
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    /// Back to the resting pose, keeping the selected mode
    pub fn reset(&mut self) {
        *self = Self::new(self.state.mode);
    }
}
