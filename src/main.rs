use nearby_accessory_rust::domain::models::{DiscoveryToken, SessionEvent, UserCommand};
use nearby_accessory_rust::domain::ports::{EngineFactory, RangingEngine};
use nearby_accessory_rust::domain::session::SessionController;
use nearby_accessory_rust::domain::settings::{Settings, SettingsService};
use nearby_accessory_rust::infrastructure::logging::init_logger;
use nearby_accessory_rust::infrastructure::runtime::SessionRuntime;
use nearby_accessory_rust::infrastructure::simulated::{SimulatedAccessory, SimulatedRangingEngine};
use nearby_accessory_rust::presentation::ConsolePresenter;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const SIMULATED_TOKEN: DiscoveryToken = DiscoveryToken(0x5457_4241_4343_0001);

fn main() -> anyhow::Result<()> {
    let settings_service = SettingsService::new()?;
    let _logging_guard = init_logger(&settings_service.get().log_settings)?;

    info!("Starting Nearby Accessory session");
    if !settings_service.exists() {
        match settings_service.save() {
            Ok(()) => info!(
                "Wrote default settings to {}",
                settings_service.path().display()
            ),
            Err(e) => warn!("Could not write default settings: {}", e),
        }
    }

    let settings = settings_service.get().clone();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(settings))
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (presentation_tx, presentation_rx) = mpsc::unbounded_channel();

    let accessory = SimulatedAccessory::new(
        settings.simulation.accessory_name.clone(),
        SIMULATED_TOKEN,
        event_tx.clone(),
    );

    let engine_tx = event_tx.clone();
    let simulation = settings.simulation.clone();
    let engine_factory: EngineFactory = Box::new(move || -> Box<dyn RangingEngine> {
        Box::new(SimulatedRangingEngine::new(
            engine_tx.clone(),
            simulation.clone(),
        ))
    });

    let controller = SessionController::new(
        Box::new(accessory.clone()),
        engine_factory,
        presentation_tx,
        &settings,
    );

    let presenter = tokio::spawn(ConsolePresenter::new(presentation_rx).run());
    let session = tokio::spawn(
        SessionRuntime::new(
            controller,
            event_rx,
            Duration::from_millis(settings.feedback_tick_interval_ms),
        )
        .run(),
    );

    accessory.connect()?;
    event_tx.send(SessionEvent::User(UserCommand::ToggleSession))?;

    let run_seconds = settings.simulation.run_seconds;
    if run_seconds > 0 {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(run_seconds)) => {
                info!("Simulation finished after {} s", run_seconds);
            }
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
    } else {
        tokio::signal::ctrl_c().await?;
        info!("Interrupted");
    }

    accessory.disconnect()?;
    event_tx.send(SessionEvent::Shutdown)?;

    let controller = session.await?;
    let snapshot = controller.snapshot();
    info!(
        "Final state: {} (connected: {})",
        snapshot.state, snapshot.connected
    );

    // Dropping the controller closes the presentation channel
    drop(controller);
    presenter.await?;

    Ok(())
}
