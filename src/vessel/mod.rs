//! Vessel roster: immutable per-vessel configuration.

mod asset;
mod placeholder;
mod pose;

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::params::VesselSpec;

pub use asset::{AssetProvider, AssetStatus, Geometry, ModelHandle, ModelSlot, NullAssetProvider};
#[cfg(feature = "gltf-models")]
pub use asset::GltfAssetProvider;
pub use placeholder::placeholder_mesh;
pub use pose::VesselPose;

/// Where a vessel operates; selects animation amplitudes and camera offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselClass {
    /// Floats on the surface (ASV)
    Surface,
    /// Hovers below the surface (AUV)
    Underwater,
}

/// Axis carrying the slow idle spin and the scroll-driven active spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpinAxis {
    #[default]
    Yaw,
    /// For models authored in a frame rotated 90 degrees about X
    Roll,
}

/// Opaque model reference handed to the asset provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef(String);

impl ModelRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static vessel configuration, never mutated after construction
#[derive(Debug, Clone, PartialEq)]
pub struct Vessel {
    pub id: u32,
    pub name: String,
    pub class: VesselClass,
    pub base_position: Vec3,
    /// Euler XYZ (radians), includes per-model mounting corrections
    pub base_rotation: Vec3,
    pub model: ModelRef,
    pub scale: f32,
    pub spin_axis: SpinAxis,
}

impl Vessel {
    pub fn from_spec(spec: &VesselSpec) -> Result<Self> {
        if !(spec.scale > 0.0) || !spec.scale.is_finite() {
            return Err(SceneError::invalid(
                "vessel.scale",
                format!("`{}` has scale {}, must be > 0", spec.name, spec.scale),
            ));
        }
        let position = Vec3::from_array(spec.position);
        let rotation = Vec3::from_array(spec.rotation);
        if !position.is_finite() || !rotation.is_finite() {
            return Err(SceneError::invalid(
                "vessel.position",
                format!("`{}` has a non-finite pose", spec.name),
            ));
        }
        Ok(Self {
            id: spec.id,
            name: spec.name.clone(),
            class: spec.class,
            base_position: position,
            base_rotation: rotation,
            model: ModelRef::new(spec.model.clone()),
            scale: spec.scale,
            spin_axis: spec.spin_axis,
        })
    }
}

/// Validate a roster and build its vessels in order
pub fn build_fleet(specs: &[VesselSpec]) -> Result<Vec<Vessel>> {
    if specs.is_empty() {
        return Err(SceneError::EmptyRoster);
    }
    let mut seen = HashSet::new();
    specs
        .iter()
        .map(|spec| {
            if !seen.insert(spec.id) {
                return Err(SceneError::DuplicateVesselId(spec.id));
            }
            Vessel::from_spec(spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::default_fleet;

    #[test]
    fn test_build_default_fleet() {
        let fleet = build_fleet(&default_fleet()).unwrap();
        assert_eq!(fleet.len(), 5);
        assert_eq!(fleet[0].spin_axis, SpinAxis::Roll);
        assert_eq!(fleet[3].class, VesselClass::Underwater);
    }

    #[test]
    fn test_empty_roster_rejected() {
        assert!(matches!(build_fleet(&[]), Err(SceneError::EmptyRoster)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut specs = default_fleet();
        specs[2].id = specs[0].id;
        assert!(matches!(
            build_fleet(&specs),
            Err(SceneError::DuplicateVesselId(1))
        ));
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let mut specs = default_fleet();
        specs[1].scale = 0.0;
        assert!(matches!(
            build_fleet(&specs),
            Err(SceneError::InvalidConfiguration { .. })
        ));
    }
}
