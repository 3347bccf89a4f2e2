/*!
 * Surface Cap Library
 *
 * Caps adaptive-bitrate rung selection to the size of the surface the
 * stream is rendered into, re-evaluated once per second while a video
 * stream is playing.
 */

pub mod bus;
pub mod cap;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod exclusion;
pub mod rung;
pub mod selector;
pub mod stream;
pub mod surface;

// Re-export commonly used types
pub use bus::{CapEvent, CapNotice, EventBus, Subscription};
pub use cap::CapLevel;
pub use config::CapConfig;
pub use controller::{CapController, CapPhase, TickOutcome};
pub use driver::{spawn_driver, DriverHandle, TICK_PERIOD};
pub use error::{CapError, SurfaceError};
pub use exclusion::ExclusionSet;
pub use rung::{Rung, RungKey};
pub use selector::select_cap;
pub use stream::{SharedStream, StreamHandle, StreamSwitcher};
pub use surface::{Footprint, PlaybackSurface, SimulatedSurface, SurfaceBox, SurfaceMeter};
