//! Serialized session task
//!
//! Data channel callbacks, ranging engine callbacks and user commands all
//! arrive on one unbounded channel. The feedback tick fires from an interval
//! on the same task, so the controller is never touched concurrently.

use crate::domain::errors::SessionError;
use crate::domain::models::SessionEvent;
use crate::domain::session::SessionController;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct SessionRuntime {
    controller: SessionController,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    tick_period: Duration,
}

impl SessionRuntime {
    pub fn new(
        controller: SessionController,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        tick_period: Duration,
    ) -> Self {
        Self {
            controller,
            events,
            tick_period,
        }
    }

    /// Process events until `Shutdown` arrives or every sender is gone.
    /// Returns the controller so its final state can be inspected.
    pub async fn run(mut self) -> SessionController {
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Session task started (feedback tick every {} ms)",
            self.tick_period.as_millis()
        );

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(SessionEvent::Shutdown) | None => break,
                    Some(event) => self.dispatch(event),
                },
                _ = ticker.tick() => self.dispatch(SessionEvent::FeedbackTick),
            }
        }

        info!("Session task stopped in state {}", self.controller.state());
        self.controller
    }

    fn dispatch(&mut self, event: SessionEvent) {
        match self.controller.handle_event(event) {
            Ok(()) => {}
            Err(SessionError::PermissionDenied) => {
                error!("Ranging stopped until nearby interaction access is granted");
            }
            Err(e) => warn!("Session event failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ConfigurationError, TransportError};
    use crate::domain::models::{
        DiscoveryToken, Direction, EngineEvent, NearbyObject, PresentationEvent,
        RangingConfiguration, SessionState,
    };
    use crate::domain::ports::{DataChannel, EngineFactory, RangingEngine};
    use crate::domain::settings::Settings;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingChannel(Arc<Mutex<Vec<Vec<u8>>>>);

    impl DataChannel for RecordingChannel {
        fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
    }

    struct FixedTokenEngine;

    impl RangingEngine for FixedTokenEngine {
        fn configuration_from_data(
            &self,
            data: &[u8],
        ) -> Result<RangingConfiguration, ConfigurationError> {
            Ok(RangingConfiguration {
                accessory_discovery_token: DiscoveryToken(7),
                data: data.to_vec(),
            })
        }

        fn run(&mut self, _configuration: &RangingConfiguration) {}
    }

    fn controller(
        channel: RecordingChannel,
    ) -> (SessionController, mpsc::UnboundedReceiver<PresentationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let factory: EngineFactory =
            Box::new(|| -> Box<dyn RangingEngine> { Box::new(FixedTokenEngine) });
        (
            SessionController::new(Box::new(channel), factory, tx, &Settings::default()),
            rx,
        )
    }

    fn handshake(tx: &mpsc::UnboundedSender<SessionEvent>) {
        let events = [
            SessionEvent::AccessoryConnected {
                name: "Tag".to_string(),
            },
            SessionEvent::AccessoryData {
                data: vec![0x01, 0x55],
                accessory_name: "Tag".to_string(),
            },
            SessionEvent::Engine(EngineEvent::ShareableConfiguration {
                discovery_token: DiscoveryToken(7),
                data: vec![0x66],
            }),
            SessionEvent::AccessoryData {
                data: vec![0x02],
                accessory_name: "Tag".to_string(),
            },
        ];
        for event in events {
            tx.send(event).unwrap();
        }
    }

    #[tokio::test]
    async fn test_events_are_processed_in_order() {
        let channel = RecordingChannel::default();
        let (controller, _presentation) = controller(channel.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = SessionRuntime::new(controller, rx, Duration::from_secs(60));

        handshake(&tx);
        // A malformed message must not stop the loop
        tx.send(SessionEvent::AccessoryData {
            data: vec![0xFF],
            accessory_name: "Tag".to_string(),
        })
        .unwrap();
        tx.send(SessionEvent::Shutdown).unwrap();

        let controller = runtime.run().await;
        assert_eq!(controller.state(), SessionState::Active);
        assert_eq!(*channel.0.lock().unwrap(), vec![vec![0x0B, 0x66]]);
    }

    #[tokio::test]
    async fn test_ticks_drive_pulses() {
        let (controller, mut presentation) = controller(RecordingChannel::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = SessionRuntime::new(controller, rx, Duration::from_millis(5));
        let task = tokio::spawn(runtime.run());

        handshake(&tx);
        for _ in 0..10 {
            tx.send(SessionEvent::Engine(EngineEvent::Updated(vec![NearbyObject {
                discovery_token: DiscoveryToken(7),
                distance: Some(0.5),
                direction: Some(Direction::new(0.0, 1.0, 0.0)),
            }])))
            .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(SessionEvent::Shutdown).unwrap();
        task.await.unwrap();

        let mut pulses = 0;
        while let Ok(event) = presentation.try_recv() {
            if matches!(event, PresentationEvent::Pulse { .. }) {
                pulses += 1;
            }
        }
        assert!(pulses > 0);
    }

    #[tokio::test]
    async fn test_stops_when_senders_are_dropped() {
        let (controller, _presentation) = controller(RecordingChannel::default());
        let (tx, rx) = mpsc::unbounded_channel();
        drop(tx);

        let controller = SessionRuntime::new(controller, rx, Duration::from_secs(60))
            .run()
            .await;
        assert_eq!(controller.state(), SessionState::Disconnected);
    }
}
