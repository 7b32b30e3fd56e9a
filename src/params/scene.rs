//! Scene description: vessel roster plus every tunable parameter block.
//!
//! Loaded from a RON file when `--scene` is given, otherwise the built-in
//! fleet is used.

use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CameraRigParams, ChoreographyParams, LightingParams, OceanPlane, WaveParams};
use crate::error::{Result, SceneError};
use crate::vessel::{SpinAxis, VesselClass};

/// One vessel entry as written in a scene file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselSpec {
    pub id: u32,
    pub name: String,
    pub class: VesselClass,
    /// Base position (meters)
    pub position: [f32; 3],
    /// Base Euler rotation XYZ (radians), includes model mounting corrections
    #[serde(default)]
    pub rotation: [f32; 3],
    /// Model reference, resolved by the asset provider
    pub model: String,
    /// Uniform model scale, > 0
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Axis that carries the idle/active spin
    #[serde(default)]
    pub spin_axis: SpinAxis,
}

fn default_scale() -> f32 {
    1.0
}

/// Complete scene description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    pub vessels: Vec<VesselSpec>,
    pub wave: WaveParams,
    pub ocean: OceanPlane,
    pub choreography: ChoreographyParams,
    pub camera: CameraRigParams,
    pub lighting: LightingParams,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            vessels: default_fleet(),
            wave: WaveParams::default(),
            ocean: OceanPlane::default(),
            choreography: ChoreographyParams::default(),
            camera: CameraRigParams::default(),
            lighting: LightingParams::default(),
        }
    }
}

impl SceneFile {
    /// Parse a scene description from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Read and parse a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::SceneFile {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_ron(&text)?;
        log::info!(
            "Loaded scene {:?} ({} vessels)",
            path,
            scene.vessels.len()
        );
        Ok(scene)
    }
}

/// The default fleet: surface vessels first, then underwater vehicles
pub fn default_fleet() -> Vec<VesselSpec> {
    vec![
        VesselSpec {
            id: 1,
            name: "Kurma ASV".to_string(),
            class: VesselClass::Surface,
            position: [-20.0, -0.5, 0.0],
            // Model is authored lying on its side; roll carries the spin
            rotation: [FRAC_PI_2, 0.0, 0.0],
            model: "kurma_kvlcc2/scene.gltf".to_string(),
            scale: 0.004,
            spin_axis: SpinAxis::Roll,
        },
        VesselSpec {
            id: 2,
            name: "MAtsya ASV".to_string(),
            class: VesselClass::Surface,
            position: [0.0, 0.3, 0.0],
            rotation: [0.0, PI, 0.0],
            model: "240108_matsya_kcs_hull/scene.gltf".to_string(),
            scale: 0.022,
            spin_axis: SpinAxis::Yaw,
        },
        VesselSpec {
            id: 3,
            name: "Makara ASV".to_string(),
            class: VesselClass::Surface,
            position: [20.0, 0.3, 0.0],
            rotation: [0.0, 0.0, 0.0],
            model: "makara_onrt__hull/scene.gltf".to_string(),
            scale: 0.004,
            spin_axis: SpinAxis::Yaw,
        },
        VesselSpec {
            id: 4,
            name: "MAVY mini AUV".to_string(),
            class: VesselClass::Underwater,
            position: [0.0, -5.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            model: "auv_mavy/scene.gltf".to_string(),
            scale: 0.005,
            spin_axis: SpinAxis::Yaw,
        },
        VesselSpec {
            id: 5,
            name: "DHWANI AUV".to_string(),
            class: VesselClass::Underwater,
            position: [10.0, -5.0, 0.0],
            rotation: [0.0, FRAC_PI_2, 0.0],
            model: "AUV_Dhwani/scene.gltf".to_string(),
            scale: 0.005,
            spin_axis: SpinAxis::Yaw,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fleet_has_one_roll_vessel() {
        let fleet = default_fleet();
        assert_eq!(fleet.len(), 5);
        let roll: Vec<_> = fleet
            .iter()
            .filter(|v| v.spin_axis == SpinAxis::Roll)
            .collect();
        assert_eq!(roll.len(), 1);
        assert_eq!(roll[0].name, "Kurma ASV");
    }

    #[test]
    fn test_parse_minimal_scene() {
        let text = r#"(
            vessels: [
                (
                    id: 7,
                    name: "Test AUV",
                    class: Underwater,
                    position: (1.0, -4.0, 2.0),
                    model: "test/scene.gltf",
                ),
            ],
            choreography: (interval_s: 5.0),
        )"#;
        let scene = SceneFile::from_ron(text).unwrap();
        assert_eq!(scene.vessels.len(), 1);
        let v = &scene.vessels[0];
        assert_eq!(v.class, VesselClass::Underwater);
        assert_eq!(v.scale, 1.0);
        assert_eq!(v.spin_axis, SpinAxis::Yaw);
        assert_eq!(v.rotation, [0.0, 0.0, 0.0]);
        assert_eq!(scene.choreography.interval_s, 5.0);
        // Unspecified blocks keep their defaults
        assert_eq!(scene.wave.iterations, WaveParams::default().iterations);
    }

    #[test]
    fn test_parse_error_reported() {
        let err = SceneFile::from_ron("(vessels: [ (id: ) ])").unwrap_err();
        assert!(matches!(err, SceneError::SceneFileParse(_)));
    }

    #[test]
    fn test_missing_file_reported() {
        let err = SceneFile::load(Path::new("/nonexistent/scene.ron")).unwrap_err();
        assert!(matches!(err, SceneError::SceneFile { .. }));
    }
}
