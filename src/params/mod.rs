//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, etc.)
//! - Documented ranges and meanings
//! - Validation before any GPU resource is touched

mod camera;
mod ocean;
mod render;

// Re-export all types
pub use camera::{CameraPreset, FixedCamera, OrbitCamera};
pub use ocean::{ConfigError, OceanParams, SimpleWaveParams, SimulationMode};
pub use render::{RecordingConfig, RenderConfig};
