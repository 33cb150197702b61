//! tdlight-common - Shared types, errors, and wire models used across all TD-light crates.

pub mod error;
pub mod entities;
pub mod progress;
pub mod backend_config;

// Re-export commonly used types
pub use entities::{CelestialObject, ClassificationResult, LightCurve, LightCurvePoint, SourceId};
pub use error::{Result, TdlightError};
pub use progress::{JobKind, JobProgress, JobStatus, ProgressEvent};
