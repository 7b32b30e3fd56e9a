//! Cube-mapped environment used for water reflections and the skybox.

use std::path::Path;

use glam::Vec3;
use image::RgbaImage;

use crate::error::{Result, SceneError};

/// Face file stems in cube layer order (+X, -X, +Y, -Y, +Z, -Z)
pub const FACE_NAMES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Anything that can return a reflection colour for a world direction
pub trait CubeSampler {
    /// Linear RGB colour seen along `direction` (need not be normalized)
    fn sample(&self, direction: Vec3) -> [f32; 3];
}

/// Six square faces of equal size
pub struct EnvironmentMap {
    faces: Vec<RgbaImage>,
    size: u32,
}

impl EnvironmentMap {
    /// Build from decoded faces in cube layer order
    pub fn from_faces(faces: Vec<RgbaImage>) -> Result<Self> {
        if faces.len() != 6 {
            return Err(SceneError::EnvironmentMapUnavailable(format!(
                "expected 6 faces, got {}",
                faces.len()
            )));
        }
        let size = faces[0].width();
        for (face, name) in faces.iter().zip(FACE_NAMES) {
            if face.width() != size || face.height() != size || size == 0 {
                return Err(SceneError::EnvironmentMapUnavailable(format!(
                    "face {name} is {}x{}, expected {size}x{size}",
                    face.width(),
                    face.height()
                )));
            }
        }
        Ok(Self { faces, size })
    }

    /// Load `px.png`, `nx.png`, ... from a directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut faces = Vec::with_capacity(6);
        for name in FACE_NAMES {
            let path = dir.join(format!("{name}.png"));
            let img = image::open(&path).map_err(|e| {
                SceneError::EnvironmentMapUnavailable(format!("{}: {e}", path.display()))
            })?;
            faces.push(img.to_rgba8());
        }
        let map = Self::from_faces(faces)?;
        log::info!("Loaded environment map from {:?} ({}px faces)", dir, map.size);
        Ok(map)
    }

    /// Face edge length in texels
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Faces in cube layer order
    pub fn faces(&self) -> &[RgbaImage] {
        &self.faces
    }
}

impl CubeSampler for EnvironmentMap {
    fn sample(&self, direction: Vec3) -> [f32; 3] {
        let (face, u, v) = cube_face_uv(direction);
        let max = (self.size - 1) as f32;
        let px = (u * max).round() as u32;
        let py = (v * max).round() as u32;
        let texel = self.faces[face].get_pixel(px, py);
        [
            srgb_to_linear(texel[0]),
            srgb_to_linear(texel[1]),
            srgb_to_linear(texel[2]),
        ]
    }
}

/// Uniform-colour environment
#[derive(Debug, Clone, Copy)]
pub struct SolidEnvironment(pub [f32; 3]);

impl CubeSampler for SolidEnvironment {
    fn sample(&self, _direction: Vec3) -> [f32; 3] {
        self.0
    }
}

/// Select the cube face for `dir` and return (face index, u, v) with u, v in [0, 1].
///
/// Follows the GPU cube-map face selection rules so CPU and shader agree.
pub fn cube_face_uv(dir: Vec3) -> (usize, f32, f32) {
    let a = dir.abs();
    let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
        if dir.x >= 0.0 {
            (0, -dir.z, -dir.y, a.x)
        } else {
            (1, dir.z, -dir.y, a.x)
        }
    } else if a.y >= a.z {
        if dir.y >= 0.0 {
            (2, dir.x, dir.z, a.y)
        } else {
            (3, dir.x, -dir.z, a.y)
        }
    } else if dir.z >= 0.0 {
        (4, dir.x, -dir.y, a.z)
    } else {
        (5, -dir.x, -dir.y, a.z)
    };

    if ma <= 0.0 || !ma.is_finite() {
        // Zero direction: look straight up
        return (2, 0.5, 0.5);
    }
    let u = ((sc / ma + 1.0) * 0.5).clamp(0.0, 1.0);
    let v = ((tc / ma + 1.0) * 0.5).clamp(0.0, 1.0);
    (face, u, v)
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
