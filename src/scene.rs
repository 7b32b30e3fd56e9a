//! Scene composition: owns every time-dependent component and advances them
//! once per frame in a fixed order.

use glam::{Mat4, Vec3};

use crate::camera::CameraRig;
use crate::choreography::{ActiveChange, Choreographer};
use crate::environment::EnvironmentMap;
use crate::error::Result;
use crate::mesh::MeshData;
use crate::ocean::{OceanGrid, WaveSurface};
use crate::params::{LightingParams, OceanPlane, SceneFile};
use crate::vessel::{build_fleet, AssetProvider, ModelSlot, Vessel, VesselPose};

/// One vessel with its model slot and latest pose
#[derive(Debug)]
pub struct VesselInstance {
    pub vessel: Vessel,
    pub slot: ModelSlot,
    pub pose: VesselPose,
}

impl VesselInstance {
    fn new(vessel: Vessel) -> Self {
        Self {
            slot: ModelSlot::new(vessel.model.clone(), vessel.class),
            pose: VesselPose::at_rest(&vessel),
            vessel,
        }
    }

    /// World transform of the drawn geometry; placeholders ignore the model scale
    pub fn transform(&self) -> Mat4 {
        let scale = if self.slot.geometry().is_placeholder() {
            1.0
        } else {
            self.vessel.scale
        };
        self.pose.model_matrix(scale)
    }

    pub fn mesh(&self) -> &MeshData {
        self.slot.geometry().mesh()
    }
}

/// Point light resolved to world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLight {
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range_m: f32,
}

/// Snapshot handed to the render host after a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub time_s: f32,
    pub active_index: usize,
    /// Set when the active vessel changed during this tick
    pub change: Option<ActiveChange>,
    pub camera_position: Vec3,
    pub look_at: Vec3,
    /// False when the water surface is skipped for lack of an environment map
    pub draw_surface: bool,
}

/// Owns the vessels, choreography, camera, and water for one scene
pub struct SceneComposer {
    vessels: Vec<VesselInstance>,
    choreographer: Choreographer,
    camera: CameraRig,
    surface: WaveSurface,
    ocean: OceanGrid,
    plane: OceanPlane,
    lighting: LightingParams,
    environment: Option<EnvironmentMap>,
    scroll_progress: f32,
    time_s: f32,
    torn_down: bool,
}

impl SceneComposer {
    /// Validate the scene description and build every component
    pub fn new(scene: SceneFile, environment: Option<EnvironmentMap>) -> Result<Self> {
        let fleet = build_fleet(&scene.vessels)?;
        scene.ocean.validate()?;
        let choreographer = Choreographer::new(fleet.len(), &scene.choreography)?;
        let mut camera = CameraRig::new(scene.camera)?;
        let surface = WaveSurface::new(scene.wave)?;
        let ocean = OceanGrid::new(&scene.ocean);

        if environment.is_none() && !surface.is_drawn(false) {
            log::warn!("No environment map: water surface will not be drawn");
        }

        let vessels: Vec<VesselInstance> = fleet.into_iter().map(VesselInstance::new).collect();
        camera.retarget(&vessels[choreographer.active_index()].vessel);

        log::info!(
            "Scene ready: {} vessels, {}x{} ocean grid",
            vessels.len(),
            ocean.segments(),
            ocean.segments()
        );

        Ok(Self {
            vessels,
            choreographer,
            camera,
            surface,
            ocean,
            plane: scene.ocean,
            lighting: scene.lighting,
            environment,
            scroll_progress: 0.0,
            time_s: 0.0,
            torn_down: false,
        })
    }

    /// Advance the scene to `elapsed_s`.
    ///
    /// Order: time, choreography timer, camera retarget, ocean (only when the
    /// surface is drawn), asset slots, vessel poses, camera pose.
    pub fn tick(&mut self, elapsed_s: f32, dt: f32, assets: &mut dyn AssetProvider) -> FrameState {
        if self.torn_down {
            return self.frame_state(None);
        }
        self.time_s = elapsed_s;

        let change = self.choreographer.update(elapsed_s);
        if let Some(change) = change {
            self.apply_change(change);
        }

        if self.draw_surface() {
            self.ocean.update(&self.surface, elapsed_s);
        }

        for instance in &mut self.vessels {
            instance.slot.poll(assets);
        }

        let active = self.choreographer.active_index();
        for (index, instance) in self.vessels.iter_mut().enumerate() {
            let is_active = index == active;
            let scroll = if is_active { self.scroll_progress } else { 0.0 };
            instance.pose = VesselPose::animate(&instance.vessel, elapsed_s, is_active, scroll);
        }

        self.camera.tick(dt);

        self.frame_state(change)
    }

    /// Highlight the next vessel
    pub fn next(&mut self) -> ActiveChange {
        let change = self.choreographer.advance();
        self.apply_change(change);
        change
    }

    /// Highlight the previous vessel
    pub fn previous(&mut self) -> ActiveChange {
        let change = self.choreographer.retreat();
        self.apply_change(change);
        change
    }

    pub fn select(&mut self, index: usize) -> Result<ActiveChange> {
        let change = self.choreographer.select(index)?;
        self.apply_change(change);
        Ok(change)
    }

    /// Scroll position mapped to the active vessel's extra spin, clamped to [0, 1]
    pub fn set_scroll_progress(&mut self, progress: f32) {
        self.scroll_progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn scroll_progress(&self) -> f32 {
        self.scroll_progress
    }

    fn apply_change(&mut self, change: ActiveChange) {
        let vessel = &self.vessels[change.current].vessel;
        log::debug!(
            "Active vessel {} -> {} ({})",
            change.previous,
            change.current,
            vessel.name
        );
        self.camera.retarget(vessel);
        if change.previous != change.current {
            self.scroll_progress = 0.0;
        }
    }

    fn frame_state(&self, change: Option<ActiveChange>) -> FrameState {
        FrameState {
            time_s: self.time_s,
            active_index: self.choreographer.active_index(),
            change,
            camera_position: self.camera.position(),
            look_at: self.camera.look_at(),
            draw_surface: self.draw_surface(),
        }
    }

    pub fn draw_surface(&self) -> bool {
        self.surface.is_drawn(self.environment.is_some())
    }

    /// Directional sun (unit vector toward the light) and intensity
    pub fn sun(&self) -> (Vec3, f32) {
        let direction = Vec3::from_array(self.lighting.sun_position)
            .try_normalize()
            .unwrap_or(Vec3::Y);
        (direction, self.lighting.sun_intensity)
    }

    pub fn ambient_intensity(&self) -> f32 {
        self.lighting.ambient_intensity
    }

    /// Fill light plus the lights riding on the active vessel
    pub fn lights(&self) -> Vec<SceneLight> {
        let fill = &self.lighting.fill;
        let mut lights = vec![SceneLight {
            position: Vec3::from_array(fill.position),
            color: fill.color,
            intensity: fill.intensity,
            range_m: fill.range_m,
        }];

        if let Some(active) = self.active_vessel() {
            let frame =
                Mat4::from_rotation_translation(active.pose.orientation(), active.pose.position);
            lights.extend(self.lighting.active_vessel_lights.iter().map(|light| SceneLight {
                position: frame.transform_point3(Vec3::from_array(light.position)),
                color: light.color,
                intensity: light.intensity,
                range_m: light.range_m,
            }));
        }
        lights
    }

    pub fn active_vessel(&self) -> Option<&VesselInstance> {
        self.vessels.get(self.choreographer.active_index())
    }

    pub fn vessels(&self) -> &[VesselInstance] {
        &self.vessels
    }

    pub fn choreographer(&self) -> &Choreographer {
        &self.choreographer
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn surface(&self) -> &WaveSurface {
        &self.surface
    }

    pub fn ocean(&self) -> &OceanGrid {
        &self.ocean
    }

    pub fn ocean_plane(&self) -> &OceanPlane {
        &self.plane
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        self.environment.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stop the timer and drop model handles and the environment map.
    ///
    /// Idempotent; later ticks leave the scene unchanged.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.choreographer.cancel();
        for instance in &mut self.vessels {
            instance.slot.release();
        }
        self.environment = None;
        self.torn_down = true;
        log::info!("Scene torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{default_fleet, MissingEnvironment};
    use crate::vessel::{AssetStatus, ModelHandle, ModelRef, NullAssetProvider};

    const DT: f32 = 1.0 / 60.0;

    fn small_scene() -> SceneFile {
        let mut scene = SceneFile::default();
        scene.ocean.segments = 4;
        scene.ocean.size_m = 40.0;
        scene.wave.iterations = 3;
        scene
    }

    fn composer() -> SceneComposer {
        SceneComposer::new(small_scene(), None).unwrap()
    }

    /// Resolves every model to a single triangle immediately
    struct InstantProvider;

    impl AssetProvider for InstantProvider {
        fn poll(&mut self, _model: &ModelRef) -> AssetStatus {
            AssetStatus::Ready(ModelHandle::new(MeshData::from_triangles(&[[
                Vec3::ZERO,
                Vec3::X,
                Vec3::Z,
            ]])))
        }
    }

    #[test]
    fn test_initial_camera_targets_first_vessel() {
        let scene = composer();
        let first = &scene.vessels()[0].vessel;
        assert_eq!(scene.camera().target(), scene.camera().target_for(first));
        assert_eq!(scene.camera().position(), Vec3::new(0.0, 10.0, 20.0));
    }

    #[test]
    fn test_timer_tick_retargets_camera() {
        let mut scene = composer();
        let mut t = 0.0;
        let mut changes = Vec::new();
        while t < 7.0 {
            t += DT;
            if let Some(change) = scene.tick(t, DT, &mut NullAssetProvider).change {
                changes.push(change);
            }
        }
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].current, 2);
        let expected = scene.camera().target_for(&scene.vessels()[2].vessel);
        assert_eq!(scene.camera().target(), expected);
    }

    #[test]
    fn test_free_camera_keeps_pivot_through_auto_advance() {
        let mut scene = composer();
        scene.camera_mut().set_tracking(false);
        let pivot = scene.camera().look_at();
        let mut t = 0.0;
        let mut frame = scene.tick(t, DT, &mut NullAssetProvider);
        while t < 7.0 {
            t += DT;
            frame = scene.tick(t, DT, &mut NullAssetProvider);
        }
        assert_eq!(frame.active_index, 2);
        assert_eq!(frame.look_at, pivot);
    }

    #[test]
    fn test_exactly_one_vessel_active() {
        let mut scene = composer();
        scene.next();
        scene.previous();
        scene.select(3).unwrap();
        let frame = scene.tick(0.5, DT, &mut NullAssetProvider);
        let active: Vec<usize> = scene
            .vessels()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.pose.is_active)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(active, vec![3]);
        assert_eq!(frame.active_index, 3);
    }

    #[test]
    fn test_select_out_of_range_keeps_state() {
        let mut scene = composer();
        scene.select(2).unwrap();
        assert!(scene.select(9).is_err());
        assert_eq!(scene.choreographer().active_index(), 2);
    }

    #[test]
    fn test_scroll_clamped_and_reset_on_change() {
        let mut scene = composer();
        scene.set_scroll_progress(1.7);
        assert_eq!(scene.scroll_progress(), 1.0);
        scene.set_scroll_progress(-0.2);
        assert_eq!(scene.scroll_progress(), 0.0);
        scene.set_scroll_progress(0.4);
        scene.next();
        assert_eq!(scene.scroll_progress(), 0.0);
    }

    #[test]
    fn test_failed_assets_render_placeholders() {
        let mut scene = composer();
        scene.tick(0.1, DT, &mut NullAssetProvider);
        for instance in scene.vessels() {
            assert!(instance.slot.geometry().is_placeholder());
            assert!(!instance.mesh().is_empty());
            // Placeholders ignore tiny model scales
            let scale = instance.transform().to_scale_rotation_translation().0;
            assert!((scale - Vec3::ONE).abs().max_element() < 1e-4);
        }
    }

    #[test]
    fn test_loaded_assets_use_model_scale() {
        let mut scene = composer();
        scene.tick(0.1, DT, &mut InstantProvider);
        let first = &scene.vessels()[0];
        assert!(first.slot.is_loaded());
        let scale = first.transform().to_scale_rotation_translation().0;
        assert!((scale.x - first.vessel.scale).abs() < 1e-6);
    }

    #[test]
    fn test_surface_skipped_without_environment() {
        let scene = composer();
        assert!(!scene.draw_surface());

        let mut file = small_scene();
        file.wave.missing_environment = MissingEnvironment::NoReflection;
        let scene = SceneComposer::new(file, None).unwrap();
        assert!(scene.draw_surface());
    }

    #[test]
    fn test_skipped_surface_leaves_grid_flat() {
        let mut scene = composer();
        assert!(!scene.draw_surface());
        for frame in 1..4 {
            scene.tick(frame as f32 * 0.7, DT, &mut NullAssetProvider);
        }
        assert!(scene
            .ocean()
            .vertices
            .iter()
            .all(|v| v.position[1] == 0.0 && v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_drawn_surface_is_displaced() {
        let mut file = small_scene();
        file.wave.missing_environment = MissingEnvironment::NoReflection;
        let mut scene = SceneComposer::new(file, None).unwrap();
        scene.tick(2.0, DT, &mut NullAssetProvider);
        assert!(scene.ocean().vertices.iter().any(|v| v.position[1] != 0.0));
    }

    #[test]
    fn test_active_vessel_lights_follow_pose() {
        let mut scene = composer();
        scene.tick(1.0, DT, &mut NullAssetProvider);
        let lights = scene.lights();
        assert_eq!(lights.len(), 3);
        let active = scene.active_vessel().unwrap();
        for light in &lights[1..] {
            assert!((light.position.distance(active.pose.position) - 2.0615528).abs() < 1e-3);
        }
    }

    #[test]
    fn test_teardown_is_idempotent_and_freezes_scene() {
        let mut scene = composer();
        scene.tick(1.0, DT, &mut InstantProvider);
        scene.teardown();
        scene.teardown();
        assert!(scene.is_torn_down());
        assert!(!scene.choreographer().timer().is_running());
        assert!(scene.environment().is_none());

        let frame = scene.tick(10.0, DT, &mut InstantProvider);
        assert_eq!(frame.change, None);
        assert_eq!(frame.active_index, 0);
        assert!(scene.vessels().iter().all(|v| !v.slot.is_loaded()));
    }

    #[test]
    fn test_invalid_scene_rejected() {
        let mut file = small_scene();
        file.vessels.clear();
        assert!(SceneComposer::new(file, None).is_err());

        let mut file = small_scene();
        file.wave.persistence = 1.5;
        assert!(SceneComposer::new(file, None).is_err());

        let mut file = small_scene();
        file.vessels = default_fleet();
        file.choreography.initial_index = 5;
        assert!(SceneComposer::new(file, None).is_err());
    }
}
