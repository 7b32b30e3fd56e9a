//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, radians, etc.)
//! - Documented ranges and meanings
//! - Validation at construction time

mod camera;
mod choreography;
mod render;
mod scene;
mod wave;

// Re-export all types
pub use camera::{CameraRigParams, OrbitLimits, Smoothing, TrackingOffset};
pub use choreography::ChoreographyParams;
pub use render::{LightingParams, PointLight, RenderConfig};
pub use scene::{default_fleet, SceneFile, VesselSpec};
pub use wave::{hex_rgb, MissingEnvironment, OceanPlane, WaveParams, MAX_SEGMENTS};
