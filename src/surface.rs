/*!
 * Playback Surface Measurement
 *
 * Measures the surface the stream renders into and converts it to the
 * pixel footprint the selector evaluates against.
 */

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::config::CapConfig;
use crate::error::SurfaceError;

/// Rendered size of a surface in layout pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceBox {
    pub width: f64,
    pub height: f64,
}

impl SurfaceBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero (nothing to cap against)
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True if both dimensions are zero (surface not laid out)
    pub fn is_unmeasured(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// Source pixels needed to fill a surface at its display density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    /// Scale a layout box by `density`, rounding up to whole pixels
    pub fn from_box(surface: SurfaceBox, density: f64) -> Self {
        Self {
            width: (surface.width * density).ceil() as u32,
            height: (surface.height * density).ceil() as u32,
        }
    }
}

impl fmt::Display for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A surface the stream is rendered into
pub trait PlaybackSurface: Send + Sync + fmt::Debug {
    /// Current rendered bounding box
    fn bounding_box(&self) -> Result<SurfaceBox, SurfaceError>;

    /// Declared width/height attributes, if the surface has any
    fn intrinsic_size(&self) -> Option<SurfaceBox> {
        None
    }

    /// Physical pixels per layout pixel on the surface's display
    fn display_density(&self) -> Result<f64, SurfaceError> {
        Err(SurfaceError::DensityUnavailable)
    }
}

/// Holds the attached surface and memoizes its measurement for one
/// evaluation cycle
#[derive(Debug, Default)]
pub struct SurfaceMeter {
    surface: Option<Arc<dyn PlaybackSurface>>,
    cached: Option<SurfaceBox>,
}

impl SurfaceMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new surface, dropping any cached measurement
    pub fn attach(&mut self, surface: Arc<dyn PlaybackSurface>) {
        self.surface = Some(surface);
        self.cached = None;
    }

    /// Release the surface reference
    pub fn detach(&mut self) {
        self.surface = None;
        self.cached = None;
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Drop the cached measurement so the next `measure` queries the surface
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Measured surface box, cached until the next `invalidate` or `attach`
    pub fn measure(&mut self) -> SurfaceBox {
        if let Some(cached) = self.cached {
            return cached;
        }

        let Some(surface) = &self.surface else {
            return SurfaceBox::default();
        };

        let measured = match surface.bounding_box() {
            Ok(rect) if !rect.is_unmeasured() => rect,
            Ok(_) | Err(SurfaceError::NotLaidOut) => {
                surface.intrinsic_size().unwrap_or_default()
            }
            Err(e) => {
                debug!("Surface measurement failed: {}", e);
                SurfaceBox::default()
            }
        };

        self.cached = Some(measured);
        measured
    }

    /// Density factor applied to the measured box
    pub fn density(&self, config: &CapConfig) -> f64 {
        if config.ignore_display_density {
            return 1.0;
        }

        let density = match self.surface.as_ref().map(|s| s.display_density()) {
            Some(Ok(ratio)) if ratio.is_finite() && ratio > 0.0 => ratio,
            Some(Ok(ratio)) => {
                debug!("Ignoring unusable display density {}", ratio);
                1.0
            }
            Some(Err(e)) => {
                debug!("Falling back to density 1.0: {}", e);
                1.0
            }
            None => 1.0,
        };

        match config.max_display_density {
            Some(max) => density.min(max),
            None => density,
        }
    }

    /// Measured box scaled to source pixels
    pub fn footprint(&mut self, config: &CapConfig) -> Footprint {
        let surface = self.measure();
        Footprint::from_box(surface, self.density(config))
    }
}

/// In-memory surface whose size and density can be changed at runtime.
///
/// Used by the demo binary and by tests in place of a real window.
#[derive(Debug)]
pub struct SimulatedSurface {
    width: AtomicU64,
    height: AtomicU64,
    intrinsic_width: AtomicU64,
    intrinsic_height: AtomicU64,
    /// NaN bits mean "density unavailable"
    density: AtomicU64,
}

impl SimulatedSurface {
    /// Create a surface of the given layout size at density 1.0
    pub fn new(width: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            width: AtomicU64::new(width.to_bits()),
            height: AtomicU64::new(height.to_bits()),
            intrinsic_width: AtomicU64::new(0f64.to_bits()),
            intrinsic_height: AtomicU64::new(0f64.to_bits()),
            density: AtomicU64::new(1f64.to_bits()),
        })
    }

    /// Change the rendered size
    pub fn resize(&self, width: f64, height: f64) {
        self.width.store(width.to_bits(), Ordering::Relaxed);
        self.height.store(height.to_bits(), Ordering::Relaxed);
    }

    /// Set the declared width/height attributes (zero clears them)
    pub fn set_intrinsic(&self, width: f64, height: f64) {
        self.intrinsic_width.store(width.to_bits(), Ordering::Relaxed);
        self.intrinsic_height.store(height.to_bits(), Ordering::Relaxed);
    }

    /// Set the display density; `None` makes density reads fail
    pub fn set_density(&self, density: Option<f64>) {
        let bits = density.unwrap_or(f64::NAN).to_bits();
        self.density.store(bits, Ordering::Relaxed);
    }

    fn load(value: &AtomicU64) -> f64 {
        f64::from_bits(value.load(Ordering::Relaxed))
    }
}

impl PlaybackSurface for SimulatedSurface {
    fn bounding_box(&self) -> Result<SurfaceBox, SurfaceError> {
        let rendered = SurfaceBox::new(Self::load(&self.width), Self::load(&self.height));
        if rendered.is_unmeasured() {
            return Err(SurfaceError::NotLaidOut);
        }
        Ok(rendered)
    }

    fn intrinsic_size(&self) -> Option<SurfaceBox> {
        let declared = SurfaceBox::new(
            Self::load(&self.intrinsic_width),
            Self::load(&self.intrinsic_height),
        );
        if declared.is_unmeasured() {
            None
        } else {
            Some(declared)
        }
    }

    fn display_density(&self) -> Result<f64, SurfaceError> {
        let density = Self::load(&self.density);
        if density.is_nan() {
            Err(SurfaceError::DensityUnavailable)
        } else {
            Ok(density)
        }
    }
}
