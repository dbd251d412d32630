//! Moving-average smoothing of ranging samples.

use crate::domain::models::Direction;
use std::ops::{Add, Div};

/// Number of samples held by each window
pub const WINDOW_CAPACITY: usize = 10;

/// A value that can be averaged inside a [`SampleWindow`]
pub trait Sample: Copy + Add<Output = Self> + Div<f32, Output = Self> {
    fn zero() -> Self;
}

impl Sample for f32 {
    fn zero() -> Self {
        0.0
    }
}

impl Sample for Direction {
    fn zero() -> Self {
        Direction::zeros()
    }
}

/// Fixed-size circular history of samples.
///
/// The average always divides by the full capacity, so slots that were
/// never written pull early averages towards zero.
#[derive(Debug, Clone)]
pub struct SampleWindow<T: Sample> {
    slots: [T; WINDOW_CAPACITY],
    cursor: usize,
}

impl<T: Sample> SampleWindow<T> {
    pub fn new() -> Self {
        Self {
            slots: [T::zero(); WINDOW_CAPACITY],
            cursor: 0,
        }
    }

    /// Write at the cursor and advance it by one, wrapping at capacity
    pub fn push(&mut self, value: T) {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % WINDOW_CAPACITY;
    }

    pub fn average(&self) -> T {
        let sum = self
            .slots
            .iter()
            .fold(T::zero(), |acc, &value| acc + value);
        sum / WINDOW_CAPACITY as f32
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl<T: Sample> Default for SampleWindow<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Independent distance and direction windows for one accessory
#[derive(Debug, Clone, Default)]
pub struct SpatialSmoother {
    distances: SampleWindow<f32>,
    directions: SampleWindow<Direction>,
}

impl SpatialSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_distance(&mut self, distance: f32) {
        self.distances.push(distance);
    }

    pub fn average_distance(&self) -> f32 {
        self.distances.average()
    }

    pub fn push_direction(&mut self, direction: Direction) {
        self.directions.push(direction);
    }

    pub fn average_direction(&self) -> Direction {
        self.directions.average()
    }

    pub fn distance_cursor(&self) -> usize {
        self.distances.cursor()
    }

    pub fn direction_cursor(&self) -> usize {
        self.directions.cursor()
    }

    pub fn reset(&mut self) {
        self.distances.reset();
        self.directions.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_distance_after_full_window() {
        for len in [10, 11, 25] {
            let mut smoother = SpatialSmoother::new();
            for _ in 0..len {
                smoother.push_distance(3.5);
            }
            assert!((smoother.average_distance() - 3.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cold_start_includes_zero_slots() {
        let mut smoother = SpatialSmoother::new();
        smoother.push_distance(5.0);
        assert!((smoother.average_distance() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut window = SampleWindow::<f32>::new();
        for i in 0..23 {
            assert_eq!(window.cursor(), i % WINDOW_CAPACITY);
            window.push(f32::from(i as u8) * -1.5);
        }
        assert_eq!(window.cursor(), 3);
    }

    #[test]
    fn test_oldest_sample_is_overwritten() {
        let mut window = SampleWindow::<f32>::new();
        window.push(100.0);
        for _ in 0..WINDOW_CAPACITY {
            window.push(1.0);
        }
        assert!((window.average() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_direction_average() {
        let mut smoother = SpatialSmoother::new();
        for _ in 0..5 {
            smoother.push_direction(Direction::new(0.0, 1.0, 0.0));
            smoother.push_direction(Direction::new(1.0, 0.0, 0.0));
        }
        let avg = smoother.average_direction();
        assert!((avg.x - 0.5).abs() < 1e-6);
        assert!((avg.y - 0.5).abs() < 1e-6);
        assert_eq!(avg.z, 0.0);
        assert_eq!(smoother.direction_cursor(), 0);
        assert_eq!(smoother.distance_cursor(), 0);
    }
}
