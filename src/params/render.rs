//! Window, projection, and lighting configuration.

use serde::{Deserialize, Serialize};

use super::wave::hex_rgb;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    /// Covers the 1000m water plane seen from any tracking offset
    pub far_plane_m: f32,

    /// Clear colour used behind the scene when no skybox is available
    pub clear_color: [f64; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            near_plane_m: 0.1,
            far_plane_m: 2500.0,
            clear_color: [0.004, 0.011, 0.022],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

/// A point light in local or world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    /// Distance at which the light has faded out (0 = infinite)
    pub range_m: f32,
}

/// Scene lighting rig
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingParams {
    pub ambient_intensity: f32,

    /// Direction *towards* the directional light (world space, unnormalized)
    pub sun_position: [f32; 3],
    pub sun_intensity: f32,

    /// Fixed fill light
    pub fill: PointLight,

    /// Lights attached to the active vessel, in vessel-local space
    pub active_vessel_lights: Vec<PointLight>,
}

impl Default for LightingParams {
    fn default() -> Self {
        let accent = hex_rgb(0x60a5fa);
        Self {
            ambient_intensity: 0.5,
            sun_position: [10.0, 10.0, 5.0],
            sun_intensity: 1.0,
            fill: PointLight {
                position: [-10.0, 10.0, -10.0],
                color: [1.0, 1.0, 1.0],
                intensity: 0.5,
                range_m: 0.0,
            },
            active_vessel_lights: vec![
                PointLight {
                    position: [2.0, 0.5, 0.0],
                    color: accent,
                    intensity: 0.8,
                    range_m: 10.0,
                },
                PointLight {
                    position: [-2.0, 0.5, 0.0],
                    color: accent,
                    intensity: 0.8,
                    range_m: 10.0,
                },
            ],
        }
    }
}
