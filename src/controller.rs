//! Size-based cap controller
//!
//! Synchronous lifecycle state machine. Lifecycle events move the controller
//! between `Idle` and `Capping`; while capping, every tick re-measures the
//! playback surface and republishes the cap. The timer itself lives in
//! [`driver`](crate::driver), which calls [`CapController::tick`].

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bus::{CapEvent, CapNotice};
use crate::cap::CapLevel;
use crate::config::CapConfig;
use crate::exclusion::ExclusionSet;
use crate::selector::select_cap;
use crate::stream::{StreamHandle, StreamSwitcher};
use crate::surface::{Footprint, PlaybackSurface, SurfaceMeter};

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapPhase {
    /// Not capping; no timer armed
    Idle,
    /// Capping; the driver ticks once per period
    Capping,
    /// Torn down; all further events are ignored
    Destroyed,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not capping (idle, destroyed or disabled)
    Inactive,
    /// Surface has no usable size; the published cap is unchanged
    Skipped,
    /// A cap was published
    Published { cap: CapLevel, loosened: bool },
}

/// Caps rung selection to the size of the playback surface
pub struct CapController {
    id: Uuid,
    config: CapConfig,
    stream: Arc<dyn StreamHandle>,
    switcher: Option<Arc<dyn StreamSwitcher>>,
    notices: Option<broadcast::Sender<CapNotice>>,
    meter: SurfaceMeter,
    exclusions: ExclusionSet,
    phase: CapPhase,
    published: CapLevel,
    has_video: bool,
}

impl CapController {
    /// Create an idle controller over `stream`
    pub fn new(config: CapConfig, stream: Arc<dyn StreamHandle>) -> Self {
        let id = Uuid::new_v4();
        debug!("Cap controller {} created", id);

        Self {
            id,
            config,
            stream,
            switcher: None,
            notices: None,
            meter: SurfaceMeter::new(),
            exclusions: ExclusionSet::new(),
            phase: CapPhase::Idle,
            published: CapLevel::Uncapped,
            has_video: false,
        }
    }

    /// Publish [`CapNotice`]s through `sender`
    pub fn with_notices(mut self, sender: broadcast::Sender<CapNotice>) -> Self {
        self.notices = Some(sender);
        self
    }

    /// Register (or clear) the stream-switch collaborator
    pub fn set_switcher(&mut self, switcher: Option<Arc<dyn StreamSwitcher>>) {
        self.switcher = switcher;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> CapPhase {
        self.phase
    }

    pub fn is_capping(&self) -> bool {
        self.phase == CapPhase::Capping
    }

    /// Last cap this controller published
    pub fn published_cap(&self) -> CapLevel {
        self.published
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn first_rung(&self) -> Option<usize> {
        self.stream.first_rung()
    }

    pub fn config(&self) -> &CapConfig {
        &self.config
    }

    /// Current footprint of the attached surface (uses the measurement cache)
    pub fn footprint(&mut self) -> Footprint {
        self.meter.footprint(&self.config)
    }

    /// Dispatch an inbound bus event
    pub fn handle_event(&mut self, event: CapEvent) {
        if self.phase == CapPhase::Destroyed {
            debug!("Cap controller {} destroyed, ignoring {:?}", self.id, event);
            return;
        }

        match event {
            CapEvent::PerformanceDrop { dropped_rung_index } => {
                self.on_performance_drop(dropped_rung_index)
            }
            CapEvent::SurfaceAttached(surface) => self.on_surface_attached(surface),
            CapEvent::ManifestParsed {
                first_rung_index,
                has_video,
            } => self.on_manifest_parsed(first_rung_index, has_video),
            CapEvent::CodecsDetected { has_video } => self.on_codecs_detected(has_video),
            CapEvent::SurfaceDetached => self.on_surface_detached(),
            CapEvent::RungsUpdated => self.on_rungs_updated(),
            CapEvent::SetCapToSurfaceSize(enabled) => self.set_cap_to_surface_size(enabled),
        }
    }

    /// Exclude the rung at `index` from future selections
    pub fn on_performance_drop(&mut self, index: usize) {
        let rungs = self.stream.rungs();
        self.exclusions.record_drop(index, &rungs);
    }

    pub fn on_surface_attached(&mut self, surface: Arc<dyn PlaybackSurface>) {
        debug!("Cap controller {}: surface attached", self.id);
        self.meter.attach(surface);
    }

    /// New stream: forget exclusions, record the starting rung, and start
    /// capping if the manifest declares video
    pub fn on_manifest_parsed(&mut self, first_rung: Option<usize>, has_video: bool) {
        self.exclusions.clear();
        self.stream.set_first_rung(first_rung);
        self.has_video = has_video;

        if has_video {
            self.start();
        }
    }

    /// Late video detection for streams whose manifest did not declare codecs
    pub fn on_codecs_detected(&mut self, has_video: bool) {
        if has_video {
            self.has_video = true;
            self.start();
        }
    }

    pub fn on_surface_detached(&mut self) {
        self.stop();
        self.meter.detach();
    }

    /// Re-evaluate right away when the host rebuilds its rung list
    pub fn on_rungs_updated(&mut self) {
        if self.is_capping() && self.published != CapLevel::Uncapped {
            self.tick();
        }
    }

    /// Toggle the master enable at runtime
    pub fn set_cap_to_surface_size(&mut self, enabled: bool) {
        if enabled == self.config.cap_to_surface_size {
            return;
        }
        self.config.cap_to_surface_size = enabled;
        info!("Cap controller {}: size capping enabled={}", self.id, enabled);

        if enabled {
            if self.has_video {
                self.start();
            }
        } else if self.is_capping() {
            self.stop();
            self.request_rung_switch(self.published);
        }
    }

    /// Enter `Capping` and evaluate immediately.
    ///
    /// Returns false if already capping, disabled or destroyed.
    pub fn start(&mut self) -> bool {
        match self.phase {
            CapPhase::Destroyed => return false,
            CapPhase::Capping => {
                debug!("Cap controller {} already capping", self.id);
                return false;
            }
            CapPhase::Idle => {}
        }

        if !self.config.cap_to_surface_size {
            debug!("Cap controller {}: size capping disabled, not starting", self.id);
            return false;
        }

        self.reset_cap();
        self.phase = CapPhase::Capping;
        info!("Cap controller {} started capping to surface size", self.id);

        self.tick();
        true
    }

    /// Return to `Idle`, dropping exclusions, the starting rung and the cap
    pub fn stop(&mut self) {
        if self.phase == CapPhase::Destroyed {
            return;
        }

        let was_capping = self.is_capping();
        self.exclusions.clear();
        self.stream.set_first_rung(None);
        self.reset_cap();
        self.phase = CapPhase::Idle;

        if was_capping {
            info!("Cap controller {} stopped capping", self.id);
        }
    }

    /// Terminal teardown. Safe to call from any phase, any number of times.
    pub fn destroy(&mut self) {
        if self.phase == CapPhase::Destroyed {
            return;
        }

        self.stop();
        self.meter.detach();
        self.switcher = None;
        self.notices = None;
        self.phase = CapPhase::Destroyed;
        info!("Cap controller {} destroyed", self.id);
    }

    /// One evaluation pass: measure, select, publish, maybe request a switch
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_capping() || !self.config.cap_to_surface_size {
            return TickOutcome::Inactive;
        }

        self.meter.invalidate();
        let measured = self.meter.measure();
        if measured.is_degenerate() {
            debug!(
                "Cap controller {}: surface is {}x{}, skipping tick",
                self.id, measured.width, measured.height
            );
            return TickOutcome::Skipped;
        }

        let footprint = Footprint::from_box(measured, self.meter.density(&self.config));
        let rungs = self.stream.rungs();
        let ceiling = rungs.len().saturating_sub(1);
        let selection = select_cap(
            &rungs,
            footprint.width,
            footprint.height,
            ceiling,
            &self.exclusions,
        );
        let cap = CapLevel::from_selection(selection).clamp_to(self.config.max_cap_index);

        let previous = self.published;
        if cap != previous {
            info!(
                "Cap controller {}: footprint {}, cap {} -> {}",
                self.id, footprint, previous, cap
            );
        }

        self.stream.set_cap(cap);
        self.published = cap;
        self.notify(CapNotice::CapUpdated(cap));

        let loosened = cap > previous;
        if loosened {
            self.request_rung_switch(cap);
        }

        TickOutcome::Published { cap, loosened }
    }

    /// Back to the unrestricted cap, still bounded by any configured ceiling
    fn reset_cap(&mut self) {
        let cap = CapLevel::Uncapped.clamp_to(self.config.max_cap_index);
        self.published = cap;
        self.stream.set_cap(cap);
    }

    fn request_rung_switch(&self, cap: CapLevel) {
        if !self.stream.auto_switching() {
            debug!("Cap controller {}: manual rung selection, no switch requested", self.id);
            return;
        }

        let Some(switcher) = &self.switcher else {
            return;
        };

        debug!("Cap controller {}: cap loosened to {}, requesting rung switch", self.id, cap);
        switcher.request_rung_switch();
        self.notify(CapNotice::RungSwitchRequested { cap });
    }

    fn notify(&self, notice: CapNotice) {
        if let Some(notices) = &self.notices {
            // No listeners is fine
            let _ = notices.send(notice);
        }
    }
}

impl std::fmt::Debug for CapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapController")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("published", &self.published)
            .field("exclusions", &self.exclusions.len())
            .field("has_switcher", &self.switcher.is_some())
            .finish()
    }
}
