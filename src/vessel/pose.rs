//! Per-frame vessel kinematics: bobbing, wave pitch/roll, and spin.
//!
//! Rotation is always composed as `base_rotation + delta` so mounting
//! corrections in the roster survive every frame.

use std::f32::consts::TAU;

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::{SpinAxis, Vessel, VesselClass};

/// Idle spin rate (radians per second)
pub const SPIN_RATE: f32 = 0.05;

/// Pitch oscillation frequency (radians per second)
pub const PITCH_FREQ: f32 = 0.3;

/// Roll oscillation frequency and amplitude for surface vessels
pub const ROLL_FREQ: f32 = 0.4;
pub const ROLL_AMPLITUDE: f32 = 0.05;

impl VesselClass {
    /// Bob (frequency rad/s, amplitude m); underwater vessels move less
    pub fn bob(self) -> (f32, f32) {
        match self {
            VesselClass::Surface => (0.5, 0.4),
            VesselClass::Underwater => (0.3, 0.2),
        }
    }

    /// Pitch oscillation amplitude (radians)
    pub fn pitch_amplitude(self) -> f32 {
        match self {
            VesselClass::Surface => 0.1,
            VesselClass::Underwater => 0.05,
        }
    }
}

/// Pose of one vessel at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesselPose {
    pub vessel_id: u32,
    pub position: Vec3,
    /// Euler XYZ (pitch, yaw, roll) in radians
    pub rotation: Vec3,
    pub is_active: bool,
}

impl VesselPose {
    /// Base pose, before any animation
    pub fn at_rest(vessel: &Vessel) -> Self {
        Self {
            vessel_id: vessel.id,
            position: vessel.base_position,
            rotation: vessel.base_rotation,
            is_active: false,
        }
    }

    /// Evaluate the animation rules at `time_s`.
    ///
    /// `scroll` (clamped to [0, 1]) adds up to one extra turn while active.
    pub fn animate(vessel: &Vessel, time_s: f32, is_active: bool, scroll: f32) -> Self {
        let base = vessel.base_rotation;
        let class = vessel.class;

        let (bob_freq, bob_amp) = class.bob();
        let mut position = vessel.base_position;
        position.y += (time_s * bob_freq).sin() * bob_amp;

        let active_spin = if is_active {
            scroll.clamp(0.0, 1.0) * TAU
        } else {
            0.0
        };

        let rotation = match vessel.spin_axis {
            SpinAxis::Yaw => {
                let pitch = base.x + (time_s * PITCH_FREQ).sin() * class.pitch_amplitude();
                let yaw = base.y + time_s * SPIN_RATE + active_spin;
                let roll = match class {
                    VesselClass::Surface => base.z + (time_s * ROLL_FREQ).sin() * ROLL_AMPLITUDE,
                    VesselClass::Underwater => base.z,
                };
                Vec3::new(pitch, yaw, roll)
            }
            SpinAxis::Roll => Vec3::new(base.x, base.y, base.z - time_s * SPIN_RATE + active_spin),
        };

        Self {
            vessel_id: vessel.id,
            position,
            rotation,
            is_active,
        }
    }

    /// Animation delta on top of the base rotation
    pub fn rotation_delta(&self, vessel: &Vessel) -> Vec3 {
        self.rotation - vessel.base_rotation
    }

    /// Rotation as a quaternion (intrinsic XYZ Euler order)
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// World transform: translate * rotate * uniform scale
    pub fn model_matrix(&self, scale: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(scale), self.orientation(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vessel::ModelRef;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn vessel(class: VesselClass, spin_axis: SpinAxis, rotation: Vec3) -> Vessel {
        Vessel {
            id: 1,
            name: "test".to_string(),
            class,
            base_position: Vec3::new(3.0, -1.0, 2.0),
            base_rotation: rotation,
            model: ModelRef::new("test.gltf"),
            scale: 1.0,
            spin_axis,
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_bob_only_moves_y() {
        for class in [VesselClass::Surface, VesselClass::Underwater] {
            let v = vessel(class, SpinAxis::Yaw, Vec3::ZERO);
            let (_, amp) = class.bob();
            for i in 0..200 {
                let pose = VesselPose::animate(&v, i as f32 * 0.37, false, 0.0);
                assert_eq!(pose.position.x, v.base_position.x);
                assert_eq!(pose.position.z, v.base_position.z);
                assert!((pose.position.y - v.base_position.y).abs() <= amp + 1e-6);
            }
        }
    }

    #[test]
    fn test_underwater_moves_less() {
        let surface = VesselClass::Surface;
        let underwater = VesselClass::Underwater;
        assert!(underwater.bob().1 < surface.bob().1);
        assert!(underwater.pitch_amplitude() < surface.pitch_amplitude());
    }

    #[test]
    fn test_at_time_zero_rotation_is_base() {
        let base = Vec3::new(0.1, 0.2, 0.3);
        let v = vessel(VesselClass::Surface, SpinAxis::Yaw, base);
        let pose = VesselPose::animate(&v, 0.0, false, 0.0);
        assert!(approx(pose.rotation, base));
        assert_eq!(pose.position, v.base_position);
    }

    #[test]
    fn test_yaw_formula() {
        let base = Vec3::new(0.0, PI, 0.0);
        let v = vessel(VesselClass::Surface, SpinAxis::Yaw, base);
        let t = 4.0;
        let pose = VesselPose::animate(&v, t, true, 0.25);
        let expected_yaw = PI + t * 0.05 + 0.25 * TAU;
        assert!((pose.rotation.y - expected_yaw).abs() < 1e-5);
        assert!((pose.rotation.x - (t * 0.3).sin() * 0.1).abs() < 1e-6);
        assert!((pose.rotation.z - (t * 0.4).sin() * 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_underwater_roll_held() {
        let base = Vec3::new(0.0, FRAC_PI_2, 0.7);
        let v = vessel(VesselClass::Underwater, SpinAxis::Yaw, base);
        for i in 0..50 {
            let pose = VesselPose::animate(&v, i as f32 * 1.3, false, 0.0);
            assert_eq!(pose.rotation.z, 0.7);
        }
    }

    #[test]
    fn test_scroll_ignored_when_idle() {
        let v = vessel(VesselClass::Surface, SpinAxis::Yaw, Vec3::ZERO);
        let a = VesselPose::animate(&v, 2.0, false, 0.0);
        let b = VesselPose::animate(&v, 2.0, false, 0.8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rotation_delta_bounds() {
        for class in [VesselClass::Surface, VesselClass::Underwater] {
            let base = Vec3::new(0.4, -1.0, 0.2);
            let v = vessel(class, SpinAxis::Yaw, base);
            for i in 0..500 {
                let t = i as f32 * 0.91;
                let delta = VesselPose::animate(&v, t, false, 0.0).rotation_delta(&v);
                assert!(delta.x.abs() <= class.pitch_amplitude() + 1e-5);
                assert!(delta.z.abs() <= ROLL_AMPLITUDE + 1e-5);
                assert!((delta.y - t * SPIN_RATE).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_roll_override_active_spin() {
        let v = vessel(
            VesselClass::Surface,
            SpinAxis::Roll,
            Vec3::new(FRAC_PI_2, 0.0, 0.0),
        );
        let pose = VesselPose::animate(&v, 0.0, true, 0.5);
        // roll = 0 - 0 * 0.05 + 0.5 * 2pi
        assert!(approx(pose.rotation, Vec3::new(FRAC_PI_2, 0.0, PI)));
    }

    #[test]
    fn test_roll_override_holds_pitch_and_yaw() {
        let base = Vec3::new(FRAC_PI_2, 0.3, 0.1);
        let v = vessel(VesselClass::Surface, SpinAxis::Roll, base);
        for i in 0..100 {
            let t = i as f32 * 0.5;
            let pose = VesselPose::animate(&v, t, false, 0.0);
            assert_eq!(pose.rotation.x, base.x);
            assert_eq!(pose.rotation.y, base.y);
            assert!((pose.rotation.z - (0.1 - t * SPIN_RATE)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_model_matrix_places_origin_at_position() {
        let v = vessel(VesselClass::Surface, SpinAxis::Yaw, Vec3::new(0.3, 1.0, -0.2));
        let pose = VesselPose::animate(&v, 1.7, true, 0.3);
        let m = pose.model_matrix(0.004);
        assert!(approx(m.transform_point3(Vec3::ZERO), pose.position));
    }
}
