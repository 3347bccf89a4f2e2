//! surface-cap: drives a cap controller against a simulated playback window
//!
//! Usage: `surface-cap [config.json] [ladder.json]`
//!
//! Walks a windowed -> fullscreen -> dropped frames -> windowed scenario and
//! logs every cap the controller publishes. Set `RUST_LOG=debug` to see
//! skipped ticks and ignored events.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use surface_cap::{
    spawn_driver, CapConfig, CapController, CapEvent, CapNotice, EventBus, Rung, SharedStream,
    SimulatedSurface, StreamHandle, StreamSwitcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let config = load_config(args.next().map(PathBuf::from))?;
    let rungs = match args.next() {
        Some(path) => load_ladder(PathBuf::from(path))?,
        None => default_ladder(),
    };

    info!("[SurfaceCap] {} rungs, config: {:?}", rungs.len(), config);

    let bus = EventBus::default();
    let stream = Arc::new(SharedStream::new(rungs));

    let mut controller = CapController::new(config, stream.clone())
        .with_notices(bus.notice_sender());
    let switch_stream = stream.clone();
    let switcher: Arc<dyn StreamSwitcher> = Arc::new(move || {
        info!("[SurfaceCap] Switch engine re-evaluating under cap {}", switch_stream.cap());
    });
    controller.set_switcher(Some(switcher));

    let top_rung = stream.rungs().len().saturating_sub(1);
    let driver = spawn_driver(controller, &bus);
    let notice_log = tokio::spawn(log_notices(bus.clone()));

    tokio::select! {
        result = run_scenario(&bus, top_rung) => result?,
        _ = tokio::signal::ctrl_c() => warn!("[SurfaceCap] Interrupted"),
    }

    driver.destroy();
    let controller = driver.join().await.context("Cap driver task failed")?;
    notice_log.abort();

    info!("[SurfaceCap] ✅ Finished in phase {:?}", controller.phase());
    Ok(())
}

/// Windowed playback, fullscreen, dropped frames on the top rung, then back
async fn run_scenario(bus: &EventBus, top_rung: usize) -> Result<()> {
    let surface = SimulatedSurface::new(640.0, 360.0);
    surface.set_density(Some(1.0));

    bus.publish(CapEvent::SurfaceAttached(surface.clone()));
    bus.publish(CapEvent::ManifestParsed {
        first_rung_index: Some(0),
        has_video: true,
    });
    sleep(Duration::from_secs(3)).await;

    info!("[SurfaceCap] Entering fullscreen");
    surface.resize(1920.0, 1080.0);
    sleep(Duration::from_secs(3)).await;

    info!("[SurfaceCap] Reporting dropped frames on the top rung");
    bus.publish(CapEvent::PerformanceDrop {
        dropped_rung_index: top_rung,
    });
    sleep(Duration::from_secs(3)).await;

    info!("[SurfaceCap] Leaving fullscreen");
    surface.resize(640.0, 360.0);
    sleep(Duration::from_secs(3)).await;

    bus.publish(CapEvent::SurfaceDetached);
    sleep(Duration::from_millis(100)).await;

    Ok(())
}

async fn log_notices(bus: EventBus) {
    let mut notices = bus.notices();
    while let Ok(notice) = notices.recv().await {
        match notice {
            CapNotice::CapUpdated(cap) => info!("[SurfaceCap] Cap published: {}", cap),
            CapNotice::RungSwitchRequested { cap } => {
                info!("[SurfaceCap] Rung switch requested (cap {})", cap)
            }
        }
    }
}

/// Explicit path, else the per-user config file if present, else defaults
fn load_config(path: Option<PathBuf>) -> Result<CapConfig> {
    if let Some(path) = path {
        return CapConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    if let Some(path) = dirs::config_dir().map(|dir| dir.join("surface-cap").join("config.json")) {
        if path.exists() {
            return CapConfig::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()));
        }
    }

    Ok(CapConfig::default())
}

fn load_ladder(path: PathBuf) -> Result<Vec<Rung>> {
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read ladder {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid ladder {}", path.display()))
}

fn default_ladder() -> Vec<Rung> {
    vec![
        Rung::new(256, 144, 200_000),
        Rung::new(426, 240, 400_000),
        Rung::new(640, 360, 800_000),
        Rung::new(640, 360, 1_200_000),
        Rung::new(1280, 720, 2_500_000),
        Rung::new(1920, 1080, 5_000_000),
    ]
}
