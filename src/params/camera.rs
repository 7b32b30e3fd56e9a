//! Camera rig tracking offsets, smoothing, and orbit limits.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// How the per-frame interpolation factor is derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Fixed factor applied once per frame (frame-rate dependent)
    PerFrame(f32),
    /// Factor `k` defined at `reference_dt`, rescaled to the actual frame time
    TimeScaled { k: f32, reference_dt: f32 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::TimeScaled {
            k: 0.05,
            reference_dt: 1.0 / 60.0,
        }
    }
}

impl Smoothing {
    /// Interpolation factor for a frame of length `dt` seconds, clamped to [0, 1]
    pub fn factor(&self, dt: f32) -> f32 {
        let f = match *self {
            Smoothing::PerFrame(k) => k,
            Smoothing::TimeScaled { k, reference_dt } => {
                if dt <= 0.0 {
                    0.0
                } else {
                    1.0 - (1.0 - k).powf(dt / reference_dt)
                }
            }
        };
        if f.is_finite() {
            f.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Camera placement relative to a tracked vessel (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingOffset {
    /// Height above the vessel base position
    pub height_m: f32,
    /// Distance behind the vessel along +Z
    pub distance_m: f32,
}

/// Orbit/zoom limits for free-camera mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitLimits {
    pub min_distance_m: f32,
    pub max_distance_m: f32,
    /// Polar angle limits measured from +Y (radians)
    pub min_polar_rad: f32,
    pub max_polar_rad: f32,
    /// Radians of rotation per pixel of drag
    pub rotate_speed: f32,
    /// Fractional distance change per scroll line
    pub zoom_speed: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance_m: 3.0,
            max_distance_m: 50.0,
            min_polar_rad: std::f32::consts::PI / 6.0,
            max_polar_rad: std::f32::consts::PI / 2.2,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

/// Camera rig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRigParams {
    /// Interpolation toward the tracking target
    pub smoothing: Smoothing,

    /// Camera position before any vessel is tracked
    pub initial_position: [f32; 3],

    /// Look-at point before any vessel is tracked
    pub initial_look_at: [f32; 3],

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Offset used for surface vessels
    pub surface_offset: TrackingOffset,

    /// Offset used for underwater vessels (closer, lower)
    pub underwater_offset: TrackingOffset,

    /// Allow orbit/zoom input while a vessel is tracked
    pub orbit_while_tracking: bool,

    pub orbit: OrbitLimits,
}

impl Default for CameraRigParams {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::default(),
            initial_position: [0.0, 10.0, 20.0],
            initial_look_at: [0.0, 0.0, 0.0],
            fov_degrees: 50.0,
            surface_offset: TrackingOffset {
                height_m: 8.0,
                distance_m: 15.0,
            },
            underwater_offset: TrackingOffset {
                height_m: 3.0,
                distance_m: 12.0,
            },
            orbit_while_tracking: false,
            orbit: OrbitLimits::default(),
        }
    }
}

impl CameraRigParams {
    pub fn validate(&self) -> Result<()> {
        let k = match self.smoothing {
            Smoothing::PerFrame(k) => k,
            Smoothing::TimeScaled { k, reference_dt } => {
                if !(reference_dt > 0.0) {
                    return Err(SceneError::invalid(
                        "smoothing.reference_dt",
                        format!("must be > 0, got {reference_dt}"),
                    ));
                }
                k
            }
        };
        if !(k > 0.0 && k <= 1.0) {
            return Err(SceneError::invalid(
                "smoothing.k",
                format!("must be in (0, 1], got {k}"),
            ));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SceneError::invalid(
                "fov_degrees",
                format!("must be in (0, 180), got {}", self.fov_degrees),
            ));
        }
        let o = &self.orbit;
        if !(o.min_distance_m > 0.0 && o.min_distance_m <= o.max_distance_m) {
            return Err(SceneError::invalid(
                "orbit.min_distance_m",
                "must be > 0 and <= max_distance_m",
            ));
        }
        if o.min_polar_rad > o.max_polar_rad {
            return Err(SceneError::invalid(
                "orbit.min_polar_rad",
                "must not exceed max_polar_rad",
            ));
        }
        Ok(())
    }
}
