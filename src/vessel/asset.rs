//! Model resolution: providers report status, slots degrade to placeholders.

use std::sync::Arc;

use super::{placeholder_mesh, ModelRef, VesselClass};
use crate::mesh::MeshData;

/// Shared, immutable model geometry
#[derive(Debug, Clone)]
pub struct ModelHandle(Arc<MeshData>);

impl ModelHandle {
    pub fn new(mesh: MeshData) -> Self {
        Self(Arc::new(mesh))
    }

    pub fn mesh(&self) -> &MeshData {
        &self.0
    }
}

/// Resolution state of one model reference
#[derive(Debug, Clone)]
pub enum AssetStatus {
    Loading,
    Ready(ModelHandle),
    Failed(String),
}

/// External model source, polled once per frame and never blocking
pub trait AssetProvider {
    fn poll(&mut self, model: &ModelRef) -> AssetStatus;
}

/// Provider with nothing to offer: every model fails and falls back
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAssetProvider;

impl AssetProvider for NullAssetProvider {
    fn poll(&mut self, _model: &ModelRef) -> AssetStatus {
        AssetStatus::Failed("no asset provider configured".to_string())
    }
}

/// Geometry a vessel draws this frame
#[derive(Debug, Clone, Copy)]
pub enum Geometry<'a> {
    /// Resolved model, drawn at the vessel's configured scale
    Model(&'a MeshData),
    /// Procedural stand-in, drawn at unit scale
    Placeholder(&'a MeshData),
}

impl<'a> Geometry<'a> {
    pub fn mesh(&self) -> &'a MeshData {
        match self {
            Geometry::Model(mesh) | Geometry::Placeholder(mesh) => mesh,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Geometry::Placeholder(_))
    }
}

#[derive(Debug, Clone)]
enum SlotState {
    Pending,
    Loaded(ModelHandle),
    Failed(String),
    Released,
}

/// Per-vessel model slot.
///
/// Shows the class placeholder until the provider reports `Ready`. A failure
/// is logged once and the placeholder stays for the rest of the run.
#[derive(Debug)]
pub struct ModelSlot {
    model: ModelRef,
    state: SlotState,
    placeholder: MeshData,
}

impl ModelSlot {
    pub fn new(model: ModelRef, class: VesselClass) -> Self {
        Self {
            model,
            state: SlotState::Pending,
            placeholder: placeholder_mesh(class),
        }
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, SlotState::Loaded(_))
    }

    /// Failure reason, if the model could not be resolved
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Ask the provider for progress; returns true when the slot settled this call
    pub fn poll(&mut self, provider: &mut dyn AssetProvider) -> bool {
        if !self.is_pending() {
            return false;
        }
        match provider.poll(&self.model) {
            AssetStatus::Loading => false,
            AssetStatus::Ready(handle) => {
                log::info!(
                    "Loaded model {} ({} triangles)",
                    self.model,
                    handle.mesh().triangle_count()
                );
                self.state = SlotState::Loaded(handle);
                true
            }
            AssetStatus::Failed(reason) => {
                log::warn!("Model {} unavailable, using placeholder: {reason}", self.model);
                self.state = SlotState::Failed(reason);
                true
            }
        }
    }

    pub fn geometry(&self) -> Geometry<'_> {
        match &self.state {
            SlotState::Loaded(handle) => Geometry::Model(handle.mesh()),
            _ => Geometry::Placeholder(&self.placeholder),
        }
    }

    /// Drop the model handle; later polls are ignored
    pub fn release(&mut self) {
        self.state = SlotState::Released;
    }
}

#[cfg(feature = "gltf-models")]
pub use gltf_provider::GltfAssetProvider;

#[cfg(feature = "gltf-models")]
mod gltf_provider {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;

    use glam::{Mat3, Mat4, Vec3};

    use super::{AssetProvider, AssetStatus, ModelHandle};
    use crate::error::SceneError;
    use crate::mesh::{MeshData, MeshVertex};
    use crate::vessel::ModelRef;

    type LoadResult = (ModelRef, Result<MeshData, String>);

    /// Loads glTF files on background threads, one per model reference.
    ///
    /// References are resolved relative to `root`.
    pub struct GltfAssetProvider {
        root: PathBuf,
        tx: Sender<LoadResult>,
        rx: Receiver<LoadResult>,
        status: HashMap<ModelRef, AssetStatus>,
    }

    impl GltfAssetProvider {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                root: root.into(),
                tx,
                rx,
                status: HashMap::new(),
            }
        }

        fn spawn_load(&self, model: ModelRef) {
            let path = self.root.join(model.as_str());
            let tx = self.tx.clone();
            log::info!("Loading model {}", path.display());
            thread::spawn(move || {
                let result = load_mesh(&path).map_err(|err| err.to_string());
                // Receiver gone means the scene was torn down
                let _ = tx.send((model, result));
            });
        }
    }

    impl AssetProvider for GltfAssetProvider {
        fn poll(&mut self, model: &ModelRef) -> AssetStatus {
            while let Ok((loaded, result)) = self.rx.try_recv() {
                let status = match result {
                    Ok(mesh) if mesh.is_empty() => {
                        AssetStatus::Failed("model contains no triangles".to_string())
                    }
                    Ok(mesh) => AssetStatus::Ready(ModelHandle::new(mesh)),
                    Err(reason) => AssetStatus::Failed(reason),
                };
                self.status.insert(loaded, status);
            }

            if let Some(status) = self.status.get(model) {
                return status.clone();
            }
            self.status.insert(model.clone(), AssetStatus::Loading);
            self.spawn_load(model.clone());
            AssetStatus::Loading
        }
    }

    /// Flatten every mesh in the default scene into one mesh in model space
    fn load_mesh(path: &Path) -> Result<MeshData, SceneError> {
        let load_error = |reason: String| SceneError::AssetLoad {
            model: path.display().to_string(),
            reason,
        };
        let (document, buffers, _images) =
            gltf::import(path).map_err(|err| load_error(err.to_string()))?;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| load_error("file has no scene".to_string()))?;

        let mut mesh = MeshData::default();
        for node in scene.nodes() {
            append_node(&node, Mat4::IDENTITY, &buffers, &mut mesh);
        }
        mesh.recenter();
        Ok(mesh)
    }

    fn append_node(
        node: &gltf::Node,
        parent: Mat4,
        buffers: &[gltf::buffer::Data],
        out: &mut MeshData,
    ) {
        let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    continue;
                }
                let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));
                let Some(positions) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<Vec3> = positions
                    .map(|p| transform.transform_point3(Vec3::from_array(p)))
                    .collect();
                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                };

                match reader.read_normals() {
                    Some(normals) => {
                        let base = out.vertices.len() as u32;
                        for (position, normal) in positions.iter().zip(normals) {
                            let normal = (normal_matrix * Vec3::from_array(normal)).normalize_or_zero();
                            out.vertices.push(MeshVertex {
                                position: position.to_array(),
                                normal: normal.to_array(),
                            });
                        }
                        let count = out.vertices.len() as u32 - base;
                        out.indices.extend(
                            indices
                                .chunks_exact(3)
                                .filter(|tri| tri.iter().all(|&i| i < count))
                                .flatten()
                                .map(|&i| base + i),
                        );
                    }
                    None => {
                        let triangles: Vec<[Vec3; 3]> = indices
                            .chunks_exact(3)
                            .filter_map(|tri| {
                                Some([
                                    *positions.get(tri[0] as usize)?,
                                    *positions.get(tri[1] as usize)?,
                                    *positions.get(tri[2] as usize)?,
                                ])
                            })
                            .collect();
                        let flat = MeshData::from_triangles(&triangles);
                        let base = out.vertices.len() as u32;
                        out.vertices.extend(flat.vertices);
                        out.indices.extend(flat.indices.into_iter().map(|i| base + i));
                    }
                }
            }
        }

        for child in node.children() {
            append_node(&child, transform, buffers, out);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::time::{Duration, Instant};

        #[test]
        fn test_missing_file_fails_without_blocking() {
            let mut provider = GltfAssetProvider::new("/nonexistent-models");
            let model = ModelRef::new("missing.gltf");
            assert!(matches!(provider.poll(&model), AssetStatus::Loading));

            let deadline = Instant::now() + Duration::from_secs(5);
            loop {
                match provider.poll(&model) {
                    AssetStatus::Failed(_) => break,
                    AssetStatus::Ready(_) => panic!("missing file reported ready"),
                    AssetStatus::Loading => {
                        assert!(Instant::now() < deadline, "loader never reported");
                        thread::sleep(Duration::from_millis(5));
                    }
                }
            }
        }
    }
}
