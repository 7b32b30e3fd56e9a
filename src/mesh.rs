//! CPU-side triangle meshes for vessels and the ocean floor.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Lit mesh vertex (position + normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Bevel applied around an extruded profile
#[derive(Debug, Clone, Copy)]
pub struct Bevel {
    /// How far the bevel extends the caps along the extrusion axis
    pub thickness: f32,
    /// How far the bevel grows the outline
    pub size: f32,
    pub segments: u32,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat-shaded mesh from loose triangles (one normal per face)
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let mut mesh = Self::default();
        for tri in triangles {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            for corner in tri {
                mesh.indices.push(mesh.vertices.len() as u32);
                mesh.vertices.push(MeshVertex {
                    position: corner.to_array(),
                    normal: normal.to_array(),
                });
            }
        }
        mesh
    }

    /// Horizontal square facing +Y, centred at (0, y, 0)
    pub fn plane(size: f32, y: f32) -> Self {
        let h = size / 2.0;
        let a = Vec3::new(-h, y, -h);
        let b = Vec3::new(h, y, -h);
        let c = Vec3::new(h, y, h);
        let d = Vec3::new(-h, y, h);
        Self::from_triangles(&[[a, d, c], [a, c, b]])
    }

    /// Extrude a closed, convex 2D outline (XY) along +Z, with bevelled caps.
    ///
    /// The result is centred on the outline's bounding box and the extrusion depth.
    pub fn extrude(outline: &[Vec2], depth: f32, bevel: Bevel) -> Self {
        let mut outline = outline.to_vec();
        if signed_area(&outline) < 0.0 {
            outline.reverse();
        }
        let n = outline.len();
        if n < 3 {
            return Self::default();
        }

        // Outward direction at each outline vertex (average of adjacent edge normals)
        let offsets: Vec<Vec2> = (0..n)
            .map(|i| {
                let prev = outline[(i + n - 1) % n];
                let cur = outline[i];
                let next = outline[(i + 1) % n];
                let n0 = edge_normal(prev, cur);
                let n1 = edge_normal(cur, next);
                (n0 + n1).normalize_or_zero()
            })
            .collect();

        // Rings from the front cap, across the walls, to the back cap
        let segments = bevel.segments.max(1);
        let mut rings: Vec<(f32, f32)> = Vec::new(); // (z, outline growth)
        for s in 0..=segments {
            let theta = s as f32 / segments as f32 * std::f32::consts::FRAC_PI_2;
            rings.push((-bevel.thickness * theta.cos(), bevel.size * theta.sin()));
        }
        for s in 0..=segments {
            let theta = s as f32 / segments as f32 * std::f32::consts::FRAC_PI_2;
            rings.push((depth + bevel.thickness * theta.sin(), bevel.size * theta.cos()));
        }

        let ring_points = |(z, grow): (f32, f32)| -> Vec<Vec3> {
            outline
                .iter()
                .zip(&offsets)
                .map(|(p, o)| {
                    let q = *p + *o * grow;
                    Vec3::new(q.x, q.y, z)
                })
                .collect()
        };

        let mut triangles = Vec::new();

        // Walls between consecutive rings
        for pair in rings.windows(2) {
            let a = ring_points(pair[0]);
            let b = ring_points(pair[1]);
            for i in 0..n {
                let j = (i + 1) % n;
                triangles.push([a[i], a[j], b[j]]);
                triangles.push([a[i], b[j], b[i]]);
            }
        }

        // Caps as fans around the outline centroid
        let centroid = outline.iter().copied().sum::<Vec2>() / n as f32;
        let front = ring_points(rings[0]);
        let back = ring_points(rings[rings.len() - 1]);
        let front_c = Vec3::new(centroid.x, centroid.y, rings[0].0);
        let back_c = Vec3::new(centroid.x, centroid.y, rings[rings.len() - 1].0);
        for i in 0..n {
            let j = (i + 1) % n;
            triangles.push([front_c, front[j], front[i]]);
            triangles.push([back_c, back[i], back[j]]);
        }

        let mut mesh = Self::from_triangles(&triangles);
        mesh.recenter();
        mesh
    }

    /// Axis-aligned bounds (min, max); `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from_array(v.position));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Translate so the bounding box is centred on the origin
    pub fn recenter(&mut self) {
        if let Some((lo, hi)) = self.bounds() {
            let centre = (lo + hi) * 0.5;
            for v in &mut self.vertices {
                v.position = (Vec3::from_array(v.position) - centre).to_array();
            }
        }
    }
}

fn signed_area(outline: &[Vec2]) -> f32 {
    let n = outline.len();
    (0..n)
        .map(|i| outline[i].perp_dot(outline[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Outward normal of a counter-clockwise edge
fn edge_normal(a: Vec2, b: Vec2) -> Vec2 {
    let d = b - a;
    Vec2::new(d.y, -d.x).normalize_or_zero()
}
