//! Ocean plane mesh, displaced on the CPU every frame.

use bytemuck::{Pod, Zeroable};

use super::surface::WaveSurface;
use crate::noise::slope_normal;
use crate::params::OceanPlane;

/// Vertex data for the ocean mesh (displaced position + surface normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OceanVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Square XZ grid centred at the origin
pub struct OceanGrid {
    pub vertices: Vec<OceanVertex>,
    pub indices: Vec<u32>,
    segments: usize,
    spacing_m: f32,
}

impl OceanGrid {
    /// Create a flat grid covering `plane.size_m` with `plane.segments` quads per side
    pub fn new(plane: &OceanPlane) -> Self {
        let segments = plane.segments;
        let spacing = plane.size_m / segments as f32;
        let half_size = plane.size_m / 2.0;

        let mut vertices = Vec::with_capacity((segments + 1) * (segments + 1));
        let mut indices = Vec::with_capacity(segments * segments * 6);

        // Generate flat XZ plane grid
        for z in 0..=segments {
            for x in 0..=segments {
                vertices.push(OceanVertex {
                    position: [
                        x as f32 * spacing - half_size,
                        0.0,
                        z as f32 * spacing - half_size,
                    ],
                    normal: [0.0, 1.0, 0.0],
                });
            }
        }

        // Generate triangle indices (counter-clockwise winding seen from +Y)
        for z in 0..segments {
            for x in 0..segments {
                let top_left = (z * (segments + 1) + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * (segments + 1) + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self {
            vertices,
            indices,
            segments,
            spacing_m: spacing,
        }
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn spacing_m(&self) -> f32 {
        self.spacing_m
    }

    /// Noise octaves evaluated per vertex, capped at what the grid resolves
    pub fn octaves(&self, surface: &WaveSurface) -> u32 {
        surface.noise().octaves_for_spacing(self.spacing_m)
    }

    /// Gradient-noise evaluations one `update` costs
    pub fn noise_samples_per_update(&self, surface: &WaveSurface) -> usize {
        self.vertices.len() * self.octaves(surface) as usize
    }

    /// Displace every vertex to the surface elevation and refresh its normal.
    ///
    /// Heights sum only the octaves the grid can resolve; normals come from
    /// differences of neighbouring heights.
    pub fn update(&mut self, surface: &WaveSurface, time_s: f32) {
        let octaves = self.octaves(surface);
        let noise = surface.noise();
        for vertex in &mut self.vertices {
            let [x, _, z] = vertex.position;
            vertex.position[1] = noise.elevation_octaves(x, z, time_s, octaves);
        }

        let side = self.segments + 1;
        let height =
            |vertices: &[OceanVertex], x: usize, z: usize| vertices[z * side + x].position[1];
        for z in 0..side {
            for x in 0..side {
                let (x0, x1) = (x.saturating_sub(1), (x + 1).min(side - 1));
                let (z0, z1) = (z.saturating_sub(1), (z + 1).min(side - 1));
                let slope_x = (height(&self.vertices, x1, z) - height(&self.vertices, x0, z))
                    / ((x1 - x0) as f32 * self.spacing_m);
                let slope_z = (height(&self.vertices, x, z1) - height(&self.vertices, x, z0))
                    / ((z1 - z0) as f32 * self.spacing_m);
                self.vertices[z * side + x].normal = slope_normal(slope_x, slope_z).to_array();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveParams;

    fn small_plane() -> OceanPlane {
        OceanPlane {
            size_m: 100.0,
            segments: 8,
            ..Default::default()
        }
    }

    #[test]
    fn test_ocean_grid_creation() {
        let plane = small_plane();
        let grid = OceanGrid::new(&plane);

        // Check vertex count: (segments + 1)^2
        assert_eq!(grid.vertices.len(), (plane.segments + 1).pow(2));

        // Check triangle count: segments^2 * 2 triangles * 3 indices
        assert_eq!(grid.indices.len(), plane.segments.pow(2) * 6);

        // Corners span the plane
        let first = grid.vertices.first().unwrap().position;
        let last = grid.vertices.last().unwrap().position;
        assert_eq!(first, [-50.0, 0.0, -50.0]);
        assert_eq!(last, [50.0, 0.0, 50.0]);
    }

    #[test]
    fn test_indices_in_range() {
        let grid = OceanGrid::new(&small_plane());
        let count = grid.vertices.len() as u32;
        assert!(grid.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn test_update_matches_surface() {
        let plane = small_plane();
        let mut grid = OceanGrid::new(&plane);
        let surface = WaveSurface::new(WaveParams::default()).unwrap();

        grid.update(&surface, 2.5);

        let noise = surface.noise();
        let octaves = grid.octaves(&surface);
        let bound = noise.bound();
        for v in &grid.vertices {
            let expected = noise.elevation_octaves(v.position[0], v.position[2], 2.5, octaves);
            assert_eq!(v.position[1], expected);
            assert!(v.position[1].abs() <= bound + 1e-6);
            assert!(v.normal[1] > 0.0);
            let length = (v.normal[0].powi(2) + v.normal[1].powi(2) + v.normal[2].powi(2)).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_fine_grid_matches_full_field() {
        // 0.05 m spacing resolves all three octaves
        let plane = OceanPlane {
            size_m: 0.4,
            segments: 8,
            ..Default::default()
        };
        let params = WaveParams {
            iterations: 3,
            ..Default::default()
        };
        let surface = WaveSurface::new(params).unwrap();
        let mut grid = OceanGrid::new(&plane);
        assert_eq!(grid.octaves(&surface), 3);

        grid.update(&surface, 1.0);
        for v in &grid.vertices {
            assert_eq!(v.position[1], surface.noise().elevation(v.position[0], v.position[2], 1.0));
        }
    }

    #[test]
    fn test_flat_field_normals_point_up() {
        let params = WaveParams {
            amplitude: 0.0,
            ..Default::default()
        };
        let surface = WaveSurface::new(params).unwrap();
        let mut grid = OceanGrid::new(&small_plane());
        grid.update(&surface, 3.0);
        assert!(grid.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_default_plane_update_cost_is_bounded() {
        let surface = WaveSurface::new(WaveParams::default()).unwrap();
        let grid = OceanGrid::new(&OceanPlane::default());
        let vertices = grid.vertices.len();
        assert_eq!(vertices, 193 * 193);
        // At most two noise evaluations per vertex per frame
        assert!(grid.noise_samples_per_update(&surface) <= 2 * vertices);
    }
}
