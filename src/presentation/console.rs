//! Headless presenter
//!
//! Renders the status line and ranging readout as log lines in place of the
//! on-screen labels, indicator and haptic/audio outputs.

use crate::domain::models::{MessageSeverity, PresentationEvent, RangingReading, StatusMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// `"<name|not> connected.\n<text>"`
pub fn status_line(accessory_name: Option<&str>, status: &StatusMessage) -> String {
    format!(
        "{} connected.\n{}",
        accessory_name.unwrap_or("not"),
        status.message
    )
}

pub fn reading_text(reading: &RangingReading) -> String {
    format!(
        "{:.1} meters away\nAzimuth: {}°\nElevation: {}°",
        reading.distance, reading.azimuth, reading.elevation
    )
}

pub struct ConsolePresenter {
    events: mpsc::UnboundedReceiver<PresentationEvent>,
}

impl ConsolePresenter {
    pub fn new(events: mpsc::UnboundedReceiver<PresentationEvent>) -> Self {
        Self { events }
    }

    /// Runs until the session drops its sender
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.render(&event);
        }
    }

    fn render(&self, event: &PresentationEvent) {
        match event {
            PresentationEvent::Status {
                accessory_name,
                status,
            } => {
                let line = status_line(accessory_name.as_deref(), status);
                match status.severity {
                    MessageSeverity::Error => error!(target: "presentation", "{}", line),
                    MessageSeverity::Warning => warn!(target: "presentation", "{}", line),
                    _ => info!(target: "presentation", "{}", line),
                }
            }
            PresentationEvent::StateChanged(state) => {
                info!(target: "presentation", "UWB state: {}", state);
            }
            PresentationEvent::Reading(reading) => {
                info!(
                    target: "presentation",
                    "{} (level {}, rotate {:+}/{:+}/{:+})",
                    reading_text(reading).replace('\n', ", "),
                    reading.feedback_level.index(),
                    reading.rotation.dx,
                    reading.rotation.dy,
                    reading.rotation.dz
                );
            }
            PresentationEvent::Pulse {
                pulse,
                sound,
                haptics,
            } => {
                debug!(
                    target: "presentation",
                    "Pulse {} ms (sound: {}, haptics: {})",
                    pulse.duration.as_millis(),
                    sound,
                    haptics
                );
            }
        }
    }
}
