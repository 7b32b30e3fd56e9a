//! Ocean surface: fractal height field, shading, and the displaced mesh.

mod mesh;
mod surface;

// Re-export public types
pub use mesh::{OceanGrid, OceanVertex};
pub use surface::{fresnel, reflect, smoothstep, SurfacePoint, WaveSurface};
