//! Stand-in hull geometry while a model is loading or after it failed.

use glam::Vec2;

use super::VesselClass;
use crate::mesh::{Bevel, MeshData};

const SURFACE_HULL: [(f32, f32); 11] = [
    (0.0, 0.0),
    (2.0, 0.6),
    (4.0, 0.9),
    (6.0, 1.0),
    (8.0, 0.9),
    (10.0, 0.6),
    (10.0, -0.3),
    (8.0, -0.6),
    (6.0, -0.7),
    (4.0, -0.6),
    (2.0, -0.3),
];

const UNDERWATER_HULL: [(f32, f32); 11] = [
    (0.0, 0.0),
    (1.5, 0.4),
    (3.0, 0.6),
    (4.5, 0.7),
    (6.0, 0.6),
    (7.5, 0.4),
    (7.5, -0.4),
    (6.0, -0.6),
    (4.5, -0.7),
    (3.0, -0.6),
    (1.5, -0.4),
];

/// Bevelled hull outline extruded across the beam, centred on the origin.
///
/// Deterministic per class, so switching to a placeholder never changes a
/// vessel's footprint between runs.
pub fn placeholder_mesh(class: VesselClass) -> MeshData {
    let (outline, depth, bevel) = match class {
        VesselClass::Surface => (
            &SURFACE_HULL,
            2.0,
            Bevel {
                thickness: 0.1,
                size: 0.1,
                segments: 3,
            },
        ),
        VesselClass::Underwater => (
            &UNDERWATER_HULL,
            1.2,
            Bevel {
                thickness: 0.08,
                size: 0.08,
                segments: 3,
            },
        ),
    };
    let points: Vec<Vec2> = outline.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
    MeshData::extrude(&points, depth, bevel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_deterministic() {
        for class in [VesselClass::Surface, VesselClass::Underwater] {
            assert_eq!(placeholder_mesh(class), placeholder_mesh(class));
        }
    }

    #[test]
    fn test_placeholder_dimensions() {
        let (lo, hi) = placeholder_mesh(VesselClass::Surface).bounds().unwrap();
        let size = hi - lo;
        assert!((size.x - 10.2).abs() < 0.05, "length {}", size.x);
        assert!((size.z - 2.2).abs() < 1e-4, "beam {}", size.z);

        let (lo, hi) = placeholder_mesh(VesselClass::Underwater).bounds().unwrap();
        assert!((hi - lo).x < 10.0);
        assert!(((lo + hi) * 0.5).length() < 1e-4);
    }
}
