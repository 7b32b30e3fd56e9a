//! Wave field, water shading, and ocean plane parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Convert an sRGB hex colour (0xRRGGBB) to linear RGB.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

/// What to do with the water surface when no environment map could be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingEnvironment {
    /// Do not draw the reflective surface at all
    #[default]
    SkipSurface,
    /// Draw the surface, using the elevation colour in place of the reflection
    NoReflection,
}

/// Fractal wave field and shading parameters (one set per ocean surface)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    /// Overall wave height scale (meters)
    pub amplitude: f32,

    /// Spatial frequency of the first octave (cycles per meter)
    pub frequency: f32,

    /// Amplitude falloff per octave, must be in (0, 1)
    pub persistence: f32,

    /// Frequency growth per octave, must be > 1
    pub lacunarity: f32,

    /// Number of noise octaves, >= 1
    pub iterations: u32,

    /// Scroll speed of the noise domain (units per second)
    pub speed: f32,

    /// Seed for the gradient noise permutation table
    pub noise_seed: u32,

    /// Linear RGB colours blended by elevation
    pub trough_color: [f32; 3],
    pub surface_color: [f32; 3],
    pub peak_color: [f32; 3],

    /// Elevation (meters) around which the surface turns to peak colour
    pub peak_threshold: f32,
    /// Half-width of the peak blend band (meters)
    pub peak_transition: f32,
    /// Elevation (meters) around which the trough turns to surface colour
    pub trough_threshold: f32,
    /// Half-width of the trough blend band (meters)
    pub trough_transition: f32,

    /// Fresnel reflection strength
    pub fresnel_scale: f32,
    /// Fresnel falloff exponent
    pub fresnel_power: f32,

    /// Surface alpha, in [0, 1]
    pub opacity: f32,

    /// Behaviour when the environment cube map is unavailable
    pub missing_environment: MissingEnvironment,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            amplitude: 0.15,
            frequency: 0.05,
            persistence: 0.35,
            lacunarity: 2.0,
            iterations: 15,
            speed: 0.4,
            noise_seed: 0,
            trough_color: hex_rgb(0x186691),
            surface_color: hex_rgb(0x9bd8c0),
            peak_color: hex_rgb(0xbbd8e0),
            peak_threshold: 0.12,
            peak_transition: 0.08,
            trough_threshold: -0.015,
            trough_transition: 0.2,
            fresnel_scale: 0.95,
            fresnel_power: 0.5,
            opacity: 0.9,
            missing_environment: MissingEnvironment::SkipSurface,
        }
    }
}

impl WaveParams {
    /// Reject parameter sets that cannot produce a convergent, finite field
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("amplitude", self.amplitude),
            ("frequency", self.frequency),
            ("speed", self.speed),
            ("peak_threshold", self.peak_threshold),
            ("trough_threshold", self.trough_threshold),
            ("fresnel_scale", self.fresnel_scale),
            ("fresnel_power", self.fresnel_power),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(SceneError::invalid(field, format!("must be finite, got {value}")));
            }
        }
        if self.iterations < 1 {
            return Err(SceneError::invalid("iterations", "must be at least 1"));
        }
        if !(self.persistence > 0.0 && self.persistence < 1.0) {
            return Err(SceneError::invalid(
                "persistence",
                format!("must be in (0, 1), got {}", self.persistence),
            ));
        }
        if !(self.lacunarity > 1.0) || !self.lacunarity.is_finite() {
            return Err(SceneError::invalid(
                "lacunarity",
                format!("must be > 1, got {}", self.lacunarity),
            ));
        }
        if self.amplitude < 0.0 {
            return Err(SceneError::invalid(
                "amplitude",
                format!("must be >= 0, got {}", self.amplitude),
            ));
        }
        if self.trough_threshold >= self.peak_threshold {
            return Err(SceneError::invalid(
                "trough_threshold",
                format!(
                    "must be below peak_threshold ({} >= {})",
                    self.trough_threshold, self.peak_threshold
                ),
            ));
        }
        for (field, value) in [
            ("peak_transition", self.peak_transition),
            ("trough_transition", self.trough_transition),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SceneError::invalid(field, format!("must be >= 0, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(SceneError::invalid(
                "opacity",
                format!("must be in [0, 1], got {}", self.opacity),
            ));
        }
        Ok(())
    }
}

/// Largest accepted `OceanPlane::segments`
pub const MAX_SEGMENTS: usize = 4096;

/// Ocean plane mesh and floor layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanPlane {
    /// Side length of the square water plane (meters)
    pub size_m: f32,

    /// Grid segments per side (vertices per side = segments + 1)
    pub segments: usize,

    /// Height of the ocean floor plane (meters, negative = below surface)
    pub floor_depth_m: f32,

    /// Side length of the floor plane (meters)
    pub floor_size_m: f32,

    /// Linear RGB floor colour
    pub floor_color: [f32; 3],
}

impl Default for OceanPlane {
    fn default() -> Self {
        Self {
            size_m: 1000.0,
            segments: 192, // CPU-evaluated, octaves capped at the grid's Nyquist rate
            floor_depth_m: -20.0,
            floor_size_m: 2000.0,
            floor_color: hex_rgb(0x0a1929),
        }
    }
}

impl OceanPlane {
    pub fn validate(&self) -> Result<()> {
        if self.segments == 0 {
            return Err(SceneError::invalid("segments", "must be at least 1"));
        }
        if self.segments > MAX_SEGMENTS {
            return Err(SceneError::invalid(
                "segments",
                format!("must be at most {MAX_SEGMENTS}, got {}", self.segments),
            ));
        }
        if !(self.size_m > 0.0) || !self.size_m.is_finite() {
            return Err(SceneError::invalid(
                "size_m",
                format!("must be > 0, got {}", self.size_m),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(WaveParams::default().validate().is_ok());
        assert!(OceanPlane::default().validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let params = WaveParams {
            iterations: 0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("iterations"));
    }

    #[test]
    fn test_persistence_out_of_range_rejected() {
        for persistence in [0.0, 1.0, 1.5, -0.2, f32::NAN] {
            let params = WaveParams {
                persistence,
                ..Default::default()
            };
            assert!(params.validate().is_err(), "persistence {persistence} accepted");
        }
    }

    #[test]
    fn test_lacunarity_must_exceed_one() {
        let params = WaveParams {
            lacunarity: 1.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        let params = WaveParams {
            trough_threshold: 0.2,
            peak_threshold: 0.1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_opacity_range() {
        let params = WaveParams {
            opacity: 1.2,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_segments_bounded() {
        for segments in [0, MAX_SEGMENTS + 1, 65536] {
            let plane = OceanPlane {
                segments,
                ..Default::default()
            };
            assert!(plane.validate().is_err(), "segments {segments} accepted");
        }
        let plane = OceanPlane {
            segments: MAX_SEGMENTS,
            ..Default::default()
        };
        assert!(plane.validate().is_ok());
    }

    #[test]
    fn test_hex_rgb_extremes() {
        assert_eq!(hex_rgb(0x000000), [0.0, 0.0, 0.0]);
        let white = hex_rgb(0xffffff);
        for c in white {
            assert!((c - 1.0).abs() < 1e-6);
        }
    }
}
