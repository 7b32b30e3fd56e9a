//! Camera rig that eases toward the active vessel, with optional free orbit.

use glam::{Mat4, Vec3};

use crate::error::Result;
use crate::params::{CameraRigParams, OrbitLimits, RenderConfig};
use crate::vessel::{Vessel, VesselClass};

/// Where the camera wants to be, and what it looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub desired_position: Vec3,
    pub look_at: Vec3,
}

/// Spherical orbit around a pivot, radius and polar angle clamped to limits
#[derive(Debug, Clone, Copy)]
pub struct OrbitControls {
    limits: OrbitLimits,
    radius: f32,
    /// Angle from +Y
    polar: f32,
    /// Angle around Y, measured from +Z toward +X
    azimuth: f32,
}

impl OrbitControls {
    pub fn new(limits: OrbitLimits) -> Self {
        Self {
            limits,
            radius: limits.min_distance_m,
            polar: limits.max_polar_rad,
            azimuth: 0.0,
        }
    }

    /// Take over the current eye position relative to `pivot`
    pub fn sync(&mut self, eye: Vec3, pivot: Vec3) {
        let offset = eye - pivot;
        let radius = offset.length();
        if radius > f32::EPSILON {
            self.radius = radius;
            self.polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
            self.azimuth = offset.x.atan2(offset.z);
        }
        self.clamp();
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.limits.rotate_speed;
        self.polar -= dy * self.limits.rotate_speed;
        self.clamp();
    }

    /// Positive `lines` moves closer
    pub fn zoom(&mut self, lines: f32) {
        self.radius *= (1.0 - lines * self.limits.zoom_speed).max(0.01);
        self.clamp();
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn eye(&self, pivot: Vec3) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        pivot + self.radius * Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    fn clamp(&mut self) {
        let l = &self.limits;
        self.radius = self.radius.clamp(l.min_distance_m, l.max_distance_m);
        self.polar = self.polar.clamp(l.min_polar_rad, l.max_polar_rad);
    }
}

/// Sole owner of the camera pose
#[derive(Debug, Clone)]
pub struct CameraRig {
    params: CameraRigParams,
    position: Vec3,
    target: CameraTarget,
    tracking: bool,
    orbit: OrbitControls,
    /// Orbit centre pinned while tracking is off
    pivot: Option<Vec3>,
}

impl CameraRig {
    pub fn new(params: CameraRigParams) -> Result<Self> {
        params.validate()?;
        let position = Vec3::from_array(params.initial_position);
        let look_at = Vec3::from_array(params.initial_look_at);
        let mut orbit = OrbitControls::new(params.orbit);
        orbit.sync(position, look_at);
        Ok(Self {
            target: CameraTarget {
                desired_position: position,
                look_at,
            },
            position,
            tracking: true,
            orbit,
            pivot: None,
            params,
        })
    }

    /// Tracking target for a vessel: behind and above its base position
    pub fn target_for(&self, vessel: &Vessel) -> CameraTarget {
        let offset = match vessel.class {
            VesselClass::Surface => self.params.surface_offset,
            VesselClass::Underwater => self.params.underwater_offset,
        };
        let base = vessel.base_position;
        CameraTarget {
            desired_position: base + Vec3::new(0.0, offset.height_m, offset.distance_m),
            look_at: base,
        }
    }

    pub fn retarget(&mut self, vessel: &Vessel) {
        self.target = self.target_for(vessel);
        log::debug!(
            "Camera target {:?} looking at {:?}",
            self.target.desired_position,
            self.target.look_at
        );
    }

    /// Ease toward the target; frozen while the user orbits freely
    pub fn tick(&mut self, dt: f32) {
        if !self.tracking {
            return;
        }
        let factor = self.params.smoothing.factor(dt);
        self.position = self.position.lerp(self.target.desired_position, factor);
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn set_tracking(&mut self, tracking: bool) {
        if tracking == self.tracking {
            return;
        }
        if tracking {
            self.pivot = None;
        } else {
            let pivot = self.target.look_at;
            self.orbit.sync(self.position, pivot);
            self.position = self.orbit.eye(pivot);
            self.pivot = Some(pivot);
        }
        self.tracking = tracking;
        log::info!("Camera {}", if tracking { "tracking" } else { "free orbit" });
    }

    fn accepts_orbit_input(&self) -> bool {
        !self.tracking || self.params.orbit_while_tracking
    }

    /// Drag input in pixels
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if !self.accepts_orbit_input() {
            return;
        }
        let pivot = self.look_at();
        if self.tracking {
            self.orbit.sync(self.position, pivot);
        }
        self.orbit.rotate(dx, dy);
        self.position = self.orbit.eye(pivot);
    }

    /// Scroll input in lines
    pub fn zoom(&mut self, lines: f32) {
        if !self.accepts_orbit_input() {
            return;
        }
        let pivot = self.look_at();
        if self.tracking {
            self.orbit.sync(self.position, pivot);
        }
        self.orbit.zoom(lines);
        self.position = self.orbit.eye(pivot);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> CameraTarget {
        self.target
    }

    /// Point the camera looks at: the target while tracking, the pinned pivot otherwise
    pub fn look_at(&self) -> Vec3 {
        self.pivot.unwrap_or(self.target.look_at)
    }

    /// Projection * view, looking at `look_at()` with +Y up
    pub fn view_proj(&self, aspect: f32, config: &RenderConfig) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.look_at(), Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.params.fov_degrees.to_radians(),
            aspect,
            config.near_plane_m,
            config.far_plane_m,
        );
        proj * view
    }
}
