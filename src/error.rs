//! Error types for the surface capping crate.
//!
//! The control loop itself never fails: every runtime condition is absorbed
//! and degrades to "no restriction". These errors only cover loading
//! configuration and probing a playback surface.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating [`CapConfig`](crate::CapConfig).
#[derive(Debug, Error)]
pub enum CapError {
    /// The config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid JSON for `CapConfig`
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// The config parsed but holds an unusable value
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Errors a [`PlaybackSurface`](crate::PlaybackSurface) may report while being probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The host could not report a display pixel density
    #[error("display density is unavailable")]
    DensityUnavailable,

    /// The surface exists but has not been laid out yet
    #[error("surface is not laid out")]
    NotLaidOut,
}

pub type CapResult<T> = Result<T, CapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = CapError::Io {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn surface_error_messages() {
        assert_eq!(
            SurfaceError::DensityUnavailable.to_string(),
            "display density is unavailable"
        );
        assert_eq!(SurfaceError::NotLaidOut.to_string(), "surface is not laid out");
    }
}
