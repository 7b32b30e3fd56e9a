//! Water surface sampling and reflective shading.
//!
//! `WaveSurface::shade` is the CPU reference of the ocean fragment shader
//! (`shaders/ocean.wgsl`); both follow the same blend order.

use glam::Vec3;

use crate::environment::CubeSampler;
use crate::error::Result;
use crate::noise::NoiseField;
use crate::params::{MissingEnvironment, WaveParams};

/// Elevated point on the water surface with its normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Noise-driven height field with Fresnel-blended colouring
pub struct WaveSurface {
    noise: NoiseField,
    params: WaveParams,
}

impl WaveSurface {
    pub fn new(params: WaveParams) -> Result<Self> {
        let noise = NoiseField::new(&params)?;
        Ok(Self { noise, params })
    }

    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Elevated position and normal at world (x, z)
    pub fn sample(&self, x: f32, z: f32, time_s: f32) -> SurfacePoint {
        let y = self.noise.elevation(x, z, time_s);
        SurfacePoint {
            position: Vec3::new(x, y, z),
            normal: self.noise.normal(x, z, time_s),
        }
    }

    /// Whether the surface is drawn at all given environment availability
    pub fn is_drawn(&self, environment_available: bool) -> bool {
        environment_available || self.params.missing_environment == MissingEnvironment::NoReflection
    }

    /// Shade one surface point as linear RGBA.
    ///
    /// Returns `None` when the environment is missing and the surface is skipped.
    pub fn shade(
        &self,
        point: &SurfacePoint,
        camera_pos: Vec3,
        environment: Option<&dyn CubeSampler>,
    ) -> Option<[f32; 4]> {
        if !self.is_drawn(environment.is_some()) {
            return None;
        }
        let p = &self.params;

        let view = (point.position - camera_pos).normalize_or_zero();
        let fresnel = fresnel(view, point.normal, p.fresnel_scale, p.fresnel_power);

        let elevation = point.position.y;
        let trough_factor = smoothstep(
            p.trough_threshold - p.trough_transition,
            p.trough_threshold + p.trough_transition,
            elevation,
        );
        let peak_factor = smoothstep(
            p.peak_threshold - p.peak_transition,
            p.peak_threshold + p.peak_transition,
            elevation,
        );

        let trough = Vec3::from_array(p.trough_color);
        let surface = Vec3::from_array(p.surface_color);
        let peak = Vec3::from_array(p.peak_color);
        let base = trough.lerp(surface, trough_factor).lerp(peak, peak_factor);

        let reflection = match environment {
            Some(env) => Vec3::from_array(env.sample(reflect(view, point.normal))),
            None => base,
        };
        let color = base.lerp(reflection, fresnel);

        Some([color.x, color.y, color.z, p.opacity])
    }
}

/// Hermite step between `edge0` and `edge1`; a zero-width band is a hard step
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Reflect incident direction `v` about normal `n`
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// `scale * (1 - clamp(dot(view, normal), 0, 1))^power`, with view pointing camera -> surface.
///
/// Not clamped: a scale above 1 extrapolates past the reflection colour.
pub fn fresnel(view: Vec3, normal: Vec3, scale: f32, power: f32) -> f32 {
    let cos = view.dot(normal).clamp(0.0, 1.0);
    scale * (1.0 - cos).powf(power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SolidEnvironment;

    fn flat_params() -> WaveParams {
        WaveParams {
            amplitude: 0.0,
            ..Default::default()
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!(approx(smoothstep(0.0, 1.0, 0.5), 0.5));
        assert_eq!(smoothstep(0.3, 0.3, 0.2), 0.0);
        assert_eq!(smoothstep(0.3, 0.3, 0.3), 1.0);
    }

    #[test]
    fn test_reflect_about_up() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_fresnel_range() {
        // View from above points against the normal: full fresnel scale
        assert!(approx(fresnel(-Vec3::Y, Vec3::Y, 0.95, 0.5), 0.95));
        // View aligned with the normal: no reflection
        assert!(approx(fresnel(Vec3::Y, Vec3::Y, 0.95, 0.5), 0.0));
        // Scales above one pass through unchanged
        assert!(approx(fresnel(-Vec3::Y, Vec3::Y, 1.5, 0.5), 1.5));
    }

    #[test]
    fn test_sample_flat_surface() {
        let surface = WaveSurface::new(flat_params()).unwrap();
        let p = surface.sample(3.0, -7.0, 1.0);
        assert_eq!(p.position, Vec3::new(3.0, 0.0, -7.0));
        assert_eq!(p.normal, Vec3::Y);
    }

    /// Trough -> surface -> peak blend at `elevation`
    fn banded_color(params: &WaveParams, elevation: f32) -> Vec3 {
        let tf = smoothstep(
            params.trough_threshold - params.trough_transition,
            params.trough_threshold + params.trough_transition,
            elevation,
        );
        let pf = smoothstep(
            params.peak_threshold - params.peak_transition,
            params.peak_threshold + params.peak_transition,
            elevation,
        );
        Vec3::from_array(params.trough_color)
            .lerp(Vec3::from_array(params.surface_color), tf)
            .lerp(Vec3::from_array(params.peak_color), pf)
    }

    #[test]
    fn test_shade_blends_toward_environment_by_fresnel() {
        let params = WaveParams {
            fresnel_scale: 0.5,
            fresnel_power: 1.0,
            ..flat_params()
        };
        let surface = WaveSurface::new(params.clone()).unwrap();
        let point = surface.sample(0.0, 0.0, 0.0);
        let env = SolidEnvironment([1.0, 0.0, 0.0]);

        let color = surface
            .shade(&point, Vec3::new(0.0, 10.0, 0.0), Some(&env))
            .unwrap();

        // Elevation 0 sits inside the trough band, below the peak band
        let base = banded_color(&params, 0.0);
        let expected = base.lerp(Vec3::new(1.0, 0.0, 0.0), 0.5);

        assert!(approx(color[0], expected.x));
        assert!(approx(color[1], expected.y));
        assert!(approx(color[2], expected.z));
        assert!(approx(color[3], params.opacity));
    }

    #[test]
    fn test_peak_colour_above_peak_band() {
        let params = WaveParams {
            fresnel_scale: 0.0,
            ..flat_params()
        };
        let surface = WaveSurface::new(params.clone()).unwrap();
        let point = SurfacePoint {
            position: Vec3::new(0.0, 1.0, 0.0),
            normal: Vec3::Y,
        };
        let env = SolidEnvironment([0.0, 0.0, 0.0]);
        let color = surface.shade(&point, Vec3::new(0.0, 5.0, 5.0), Some(&env)).unwrap();
        for i in 0..3 {
            assert!(approx(color[i], params.peak_color[i]));
        }
    }

    #[test]
    fn test_missing_environment_skips_by_default() {
        let surface = WaveSurface::new(flat_params()).unwrap();
        let point = surface.sample(0.0, 0.0, 0.0);
        assert!(!surface.is_drawn(false));
        assert!(surface.shade(&point, Vec3::Y * 10.0, None).is_none());
    }

    #[test]
    fn test_missing_environment_no_reflection_policy() {
        let params = WaveParams {
            missing_environment: MissingEnvironment::NoReflection,
            fresnel_scale: 0.8,
            fresnel_power: 1.0,
            ..flat_params()
        };
        let surface = WaveSurface::new(params.clone()).unwrap();
        for elevation in [-0.3, 0.0, 0.1, 0.5] {
            let point = SurfacePoint {
                position: Vec3::new(0.0, elevation, 0.0),
                normal: Vec3::Y,
            };
            // Seen from above the fresnel term sits at full scale
            let camera = Vec3::new(0.0, elevation + 1.0, 10.0);
            let view = (point.position - camera).normalize();
            assert!(fresnel(view, Vec3::Y, 0.8, 1.0) > 0.5);

            let color = surface.shade(&point, camera, None).unwrap();
            let base = banded_color(&params, elevation);
            assert!(approx(color[0], base.x));
            assert!(approx(color[1], base.y));
            assert!(approx(color[2], base.z));
            assert!(approx(color[3], params.opacity));
        }
    }

    #[test]
    fn test_camera_at_point_is_finite() {
        let surface = WaveSurface::new(WaveParams::default()).unwrap();
        let point = surface.sample(1.0, 1.0, 0.0);
        let env = SolidEnvironment([0.2, 0.3, 0.4]);
        let color = surface.shade(&point, point.position, Some(&env)).unwrap();
        assert!(color.iter().all(|c| c.is_finite()));
    }
}
