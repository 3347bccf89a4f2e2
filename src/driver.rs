/*!
 * Periodic Driver
 *
 * Runs a cap controller on a single tokio task. Bus events and timer ticks
 * are multiplexed with `select!`, so no two evaluations ever overlap. The
 * ticker is armed only while the controller is capping.
 */

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bus::{EventBus, Subscription};
use crate::controller::CapController;

/// Re-evaluation period while capping
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running driver task
#[derive(Debug)]
pub struct DriverHandle {
    cancel: CancellationToken,
    task: JoinHandle<CapController>,
}

impl DriverHandle {
    /// Ask the driver to destroy its controller and exit. Idempotent.
    pub fn destroy(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the driver to exit and take back the destroyed controller
    pub async fn join(self) -> Result<CapController, tokio::task::JoinError> {
        self.task.await
    }
}

/// Subscribe `controller` to `bus` and drive it on a new task.
///
/// The subscription is taken before the task starts, so events published
/// right after this call are not missed.
pub fn spawn_driver(controller: CapController, bus: &EventBus) -> DriverHandle {
    let subscription = bus.subscribe();
    let cancel = CancellationToken::new();

    info!("Starting cap driver for controller {}", controller.id());
    let task = tokio::spawn(run(controller, subscription, cancel.clone()));

    DriverHandle { cancel, task }
}

async fn run(
    mut controller: CapController,
    mut subscription: Subscription,
    cancel: CancellationToken,
) -> CapController {
    let mut ticker: Option<Interval> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Cap driver for controller {} cancelled", controller.id());
                break;
            }

            event = subscription.recv() => match event {
                Some(event) => controller.handle_event(event),
                None => {
                    info!("Event bus closed, stopping cap driver for controller {}", controller.id());
                    break;
                }
            },

            _ = next_tick(&mut ticker) => {
                controller.tick();
            }
        }

        sync_ticker(&controller, &mut ticker);
    }

    controller.destroy();
    drop(subscription);
    info!("Cap driver for controller {} stopped", controller.id());

    controller
}

/// Arm the ticker when capping starts, disarm it when capping stops
fn sync_ticker(controller: &CapController, ticker: &mut Option<Interval>) {
    match (controller.is_capping(), ticker.is_some()) {
        (true, false) => {
            // Starting already evaluated once, so the first fire is a full period out
            let mut armed = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            armed.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(armed);
            debug!("Cap ticker armed for controller {}", controller.id());
        }
        (false, true) => {
            *ticker = None;
            debug!("Cap ticker disarmed for controller {}", controller.id());
        }
        _ => {}
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
