//! In-process ranging engine
//!
//! Streams samples along a straight approach towards the accessory while the
//! bearing slowly sweeps left and right.

use crate::domain::errors::ConfigurationError;
use crate::domain::models::{
    DiscoveryToken, Direction, EngineEvent, NearbyObject, RangingConfiguration, SessionEvent,
};
use crate::domain::ports::RangingEngine;
use crate::domain::settings::SimulationSettings;
use crate::infrastructure::simulated::accessory::CONFIGURATION_MAGIC;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const TOKEN_LEN: usize = 8;

/// Peak bearing offset of the sweep, in radians
const SWEEP_AMPLITUDE: f32 = 0.6;
/// Sweep angular rate, in radians per second
const SWEEP_RATE: f32 = 0.5;

pub struct SimulatedRangingEngine {
    event_sender: mpsc::UnboundedSender<SessionEvent>,
    settings: SimulationSettings,
    sampler: Option<JoinHandle<()>>,
}

impl SimulatedRangingEngine {
    pub fn new(
        event_sender: mpsc::UnboundedSender<SessionEvent>,
        settings: SimulationSettings,
    ) -> Self {
        Self {
            event_sender,
            settings,
            sampler: None,
        }
    }

    fn stop_sampler(&mut self) {
        if let Some(handle) = self.sampler.take() {
            handle.abort();
        }
    }
}

impl RangingEngine for SimulatedRangingEngine {
    fn configuration_from_data(
        &self,
        data: &[u8],
    ) -> Result<RangingConfiguration, ConfigurationError> {
        if data.len() < TOKEN_LEN + CONFIGURATION_MAGIC.len() {
            return Err(ConfigurationError::InvalidConfigurationData(format!(
                "expected at least {} bytes, got {}",
                TOKEN_LEN + CONFIGURATION_MAGIC.len(),
                data.len()
            )));
        }

        let (token, rest) = data.split_at(TOKEN_LEN);
        if !rest.starts_with(CONFIGURATION_MAGIC) {
            return Err(ConfigurationError::InvalidConfigurationData(
                "missing configuration marker".to_string(),
            ));
        }

        let mut token_bytes = [0u8; TOKEN_LEN];
        token_bytes.copy_from_slice(token);

        Ok(RangingConfiguration {
            accessory_discovery_token: DiscoveryToken(u64::from_le_bytes(token_bytes)),
            data: data.to_vec(),
        })
    }

    fn run(&mut self, configuration: &RangingConfiguration) {
        self.stop_sampler();

        let token = configuration.accessory_discovery_token;
        info!("Simulated ranging engine running for token {}", token);

        let shareable: Vec<u8> = configuration.data.iter().rev().copied().collect();
        let _ = self
            .event_sender
            .send(SessionEvent::Engine(EngineEvent::ShareableConfiguration {
                discovery_token: token,
                data: shareable,
            }));

        let sender = self.event_sender.clone();
        let settings = self.settings.clone();
        self.sampler = Some(tokio::spawn(async move {
            let period = Duration::from_millis(settings.update_interval_ms.max(1));
            let mut ticker = tokio::time::interval(period);
            let mut elapsed = 0.0_f32;

            loop {
                ticker.tick().await;
                let object = sample_at(&settings, token, elapsed);
                if sender
                    .send(SessionEvent::Engine(EngineEvent::Updated(vec![object])))
                    .is_err()
                {
                    debug!("Session channel closed; stopping simulated samples");
                    break;
                }
                elapsed += period.as_secs_f32();
            }
        }));
    }
}

impl Drop for SimulatedRangingEngine {
    fn drop(&mut self) {
        self.stop_sampler();
    }
}

/// Sample `elapsed` seconds into the approach
pub fn sample_at(
    settings: &SimulationSettings,
    discovery_token: DiscoveryToken,
    elapsed: f32,
) -> NearbyObject {
    let progress = if settings.approach_seconds > 0.0 {
        (elapsed / settings.approach_seconds).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let distance =
        settings.start_distance_m + (settings.end_distance_m - settings.start_distance_m) * progress;

    let bearing = SWEEP_AMPLITUDE * (SWEEP_RATE * elapsed).sin();
    let direction = Direction::new(bearing.sin(), bearing.cos(), 0.0);

    NearbyObject {
        discovery_token,
        distance: Some(distance),
        direction: Some(direction),
    }
}
