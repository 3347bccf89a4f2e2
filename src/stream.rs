//! Narrow capability interfaces onto the host stream
//!
//! The controller never sees the host player as a whole. It reads the rung
//! list and writes the cap through [`StreamHandle`], and asks for an
//! immediate rung re-evaluation through an optional [`StreamSwitcher`].

use std::sync::{PoisonError, RwLock};

use crate::cap::CapLevel;
use crate::rung::Rung;

/// What the controller may read and write on the host stream
pub trait StreamHandle: Send + Sync {
    /// Current ordered rung list
    fn rungs(&self) -> Vec<Rung>;

    /// Cap the selection engine currently honours
    fn cap(&self) -> CapLevel;

    /// Publish a new cap
    fn set_cap(&self, cap: CapLevel);

    /// Default starting rung announced by the manifest
    fn first_rung(&self) -> Option<usize>;

    fn set_first_rung(&self, index: Option<usize>);

    /// True while the engine picks rungs automatically
    fn auto_switching(&self) -> bool {
        true
    }
}

/// Stream-switch engine hook, told to re-evaluate the in-flight rung when
/// the cap loosens
pub trait StreamSwitcher: Send + Sync {
    fn request_rung_switch(&self);
}

impl<F> StreamSwitcher for F
where
    F: Fn() + Send + Sync,
{
    fn request_rung_switch(&self) {
        self()
    }
}

/// In-memory [`StreamHandle`] shared between the controller and a
/// selection engine
#[derive(Debug)]
pub struct SharedStream {
    rungs: RwLock<Vec<Rung>>,
    cap: RwLock<CapLevel>,
    first_rung: RwLock<Option<usize>>,
    auto_switching: RwLock<bool>,
}

impl SharedStream {
    pub fn new(rungs: Vec<Rung>) -> Self {
        Self {
            rungs: RwLock::new(rungs),
            cap: RwLock::new(CapLevel::Uncapped),
            first_rung: RwLock::new(None),
            auto_switching: RwLock::new(true),
        }
    }

    /// Replace the rung list (e.g. after a manifest reload)
    pub fn set_rungs(&self, rungs: Vec<Rung>) {
        *self.rungs.write().unwrap_or_else(PoisonError::into_inner) = rungs;
    }

    /// Switch between automatic and manual rung selection
    pub fn set_auto_switching(&self, enabled: bool) {
        *self
            .auto_switching
            .write()
            .unwrap_or_else(PoisonError::into_inner) = enabled;
    }
}

impl Default for SharedStream {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StreamHandle for SharedStream {
    fn rungs(&self) -> Vec<Rung> {
        self.rungs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cap(&self) -> CapLevel {
        *self.cap.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_cap(&self, cap: CapLevel) {
        *self.cap.write().unwrap_or_else(PoisonError::into_inner) = cap;
    }

    fn first_rung(&self) -> Option<usize> {
        *self.first_rung.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_first_rung(&self, index: Option<usize>) {
        *self.first_rung.write().unwrap_or_else(PoisonError::into_inner) = index;
    }

    fn auto_switching(&self) -> bool {
        *self
            .auto_switching
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn shared_stream_starts_uncapped() {
        let stream = SharedStream::new(vec![Rung::new(640, 360, 800_000)]);
        assert_eq!(stream.cap(), CapLevel::Uncapped);
        assert_eq!(stream.first_rung(), None);
        assert!(stream.auto_switching());
        assert_eq!(stream.rungs().len(), 1);
    }

    #[test]
    fn shared_stream_round_trips_writes() {
        let stream = SharedStream::default();
        stream.set_cap(CapLevel::Index(2));
        stream.set_first_rung(Some(1));
        stream.set_auto_switching(false);
        stream.set_rungs(vec![Rung::new(1280, 720, 1_500_000)]);

        assert_eq!(stream.cap(), CapLevel::Index(2));
        assert_eq!(stream.first_rung(), Some(1));
        assert!(!stream.auto_switching());
        assert_eq!(stream.rungs(), vec![Rung::new(1280, 720, 1_500_000)]);
    }

    #[test]
    fn closures_act_as_switchers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let switcher: Arc<dyn StreamSwitcher> = Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        switcher.request_rung_switch();
        switcher.request_rung_switch();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
