//! Fractal noise height field for the ocean surface.
//!
//! A pure function of position and time: the same field is evaluated for
//! vertex heights, finite-difference normals, and tests.

use glam::Vec3;
use noise::{NoiseFn, OpenSimplex};

use crate::error::Result;
use crate::params::WaveParams;

/// Finite-difference step for normals (meters)
pub const NORMAL_EPSILON: f64 = 1e-3;

/// Deterministic fractal (fBm) noise evaluator
pub struct NoiseField {
    simplex: OpenSimplex,
    amplitude: f64,
    frequency: f64,
    persistence: f64,
    lacunarity: f64,
    iterations: u32,
    speed: f64,
}

impl NoiseField {
    /// Build a noise field, rejecting non-convergent parameters
    pub fn new(params: &WaveParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            simplex: OpenSimplex::new(params.noise_seed),
            amplitude: params.amplitude as f64,
            frequency: params.frequency as f64,
            persistence: params.persistence as f64,
            lacunarity: params.lacunarity as f64,
            iterations: params.iterations,
            speed: params.speed as f64,
        })
    }

    /// Surface elevation at world (x, z) and elapsed time `t`
    pub fn elevation(&self, x: f32, z: f32, t: f32) -> f32 {
        self.elevation_f64(x as f64, z as f64, t as f64, self.iterations) as f32
    }

    /// Elevation summed over the first `octaves` octaves only (at least one)
    pub fn elevation_octaves(&self, x: f32, z: f32, t: f32, octaves: u32) -> f32 {
        let octaves = octaves.clamp(1, self.iterations);
        self.elevation_f64(x as f64, z as f64, t as f64, octaves) as f32
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Octaves a grid with `spacing_m` between samples can represent.
    ///
    /// An octave is kept while its frequency stays at or below the grid's
    /// Nyquist rate `0.5 / spacing_m`; the first octave is always kept.
    pub fn octaves_for_spacing(&self, spacing_m: f32) -> u32 {
        if !(spacing_m > 0.0) || !spacing_m.is_finite() {
            return self.iterations;
        }
        let nyquist = 0.5 / spacing_m as f64;
        let mut frequency = self.frequency * self.lacunarity;
        let mut octaves = 1;
        while octaves < self.iterations && frequency <= nyquist {
            octaves += 1;
            frequency *= self.lacunarity;
        }
        octaves
    }

    /// Upper bound on |elevation|: amplitude * sum(persistence^i)
    pub fn bound(&self) -> f32 {
        let mut sum = 0.0;
        let mut weight = 1.0;
        for _ in 0..self.iterations {
            sum += weight;
            weight *= self.persistence;
        }
        (self.amplitude * sum) as f32
    }

    /// Surface normal from central differences of the height field.
    ///
    /// Falls back to world up if the tangents are degenerate.
    pub fn normal(&self, x: f32, z: f32, t: f32) -> Vec3 {
        let (x, z, t) = (x as f64, z as f64, t as f64);
        let eps = NORMAL_EPSILON;
        let n = self.iterations;

        let dh_x = self.elevation_f64(x + eps, z, t, n) - self.elevation_f64(x - eps, z, t, n);
        let dh_z = self.elevation_f64(x, z + eps, t, n) - self.elevation_f64(x, z - eps, t, n);

        slope_normal((dh_x / (2.0 * eps)) as f32, (dh_z / (2.0 * eps)) as f32)
    }

    fn elevation_f64(&self, x: f64, z: f64, t: f64, octaves: u32) -> f64 {
        let offset = t * self.speed;
        let mut elevation = 0.0;
        let mut weight = 1.0;
        let mut frequency = self.frequency;

        for _ in 0..octaves {
            let sample = self
                .simplex
                .get([x * frequency + offset, z * frequency + offset])
                .clamp(-1.0, 1.0);
            elevation += weight * sample;
            weight *= self.persistence;
            frequency *= self.lacunarity;
        }

        elevation * self.amplitude
    }
}

/// Normal of a height field with slopes `dh/dx` and `dh/dz`
pub fn slope_normal(slope_x: f32, slope_z: f32) -> Vec3 {
    // Unit-run tangents: a flat field gives exactly +Y
    let tangent_x = Vec3::new(1.0, slope_x, 0.0);
    let tangent_z = Vec3::new(0.0, slope_z, 1.0);
    upward_normal(tangent_z.cross(tangent_x))
}

/// Normalize `n`, substituting +Y for zero-length or non-finite input
pub fn upward_normal(n: Vec3) -> Vec3 {
    let len_sq = n.length_squared();
    if !len_sq.is_finite() || len_sq <= f32::EPSILON * f32::EPSILON {
        return Vec3::Y;
    }
    n / len_sq.sqrt()
}
