//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use vesselwave::environment::EnvironmentMap;
use vesselwave::params::{MissingEnvironment, SceneFile};
use vesselwave::vessel::AssetProvider;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "vesselwave")]
#[command(about = "Animated ocean scene with a choreographed vessel fleet", long_about = None)]
pub struct Args {
    /// RON scene file (vessels and parameters); built-in fleet when omitted
    #[arg(long, value_name = "FILE")]
    pub scene: Option<PathBuf>,

    /// Directory holding px/nx/py/ny/pz/nz.png cube faces
    #[arg(long, value_name = "DIR")]
    pub env_dir: Option<PathBuf>,

    /// Directory model references are resolved against
    #[arg(long, value_name = "DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// Ocean grid segments per side
    #[arg(long, value_name = "N")]
    pub grid_segments: Option<usize>,

    /// Seconds between automatic vessel changes
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<f32>,

    /// Draw the water without reflections when no environment map loads
    #[arg(long)]
    pub no_reflection_fallback: bool,

    /// Start with the free orbit camera instead of vessel tracking
    #[arg(long)]
    pub free_camera: bool,
}

impl Args {
    /// Scene description with command-line overrides applied
    pub fn load_scene(&self) -> anyhow::Result<SceneFile> {
        let mut scene = match &self.scene {
            Some(path) => SceneFile::load(path)
                .with_context(|| format!("Failed to load scene {}", path.display()))?,
            None => SceneFile::default(),
        };
        if let Some(segments) = self.grid_segments {
            scene.ocean.segments = segments;
        }
        if let Some(interval) = self.interval {
            scene.choreography.interval_s = interval;
        }
        if self.no_reflection_fallback {
            scene.wave.missing_environment = MissingEnvironment::NoReflection;
        }
        Ok(scene)
    }

    /// Environment map, or `None` (logged) when it cannot be loaded
    pub fn load_environment(&self) -> Option<EnvironmentMap> {
        let dir = self.env_dir.as_ref()?;
        match EnvironmentMap::load_dir(dir) {
            Ok(map) => Some(map),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    /// glTF loader rooted at `--models-dir`, or a provider that always falls back
    pub fn asset_provider(&self) -> Box<dyn AssetProvider> {
        #[cfg(feature = "gltf-models")]
        {
            Box::new(vesselwave::vessel::GltfAssetProvider::new(&self.models_dir))
        }
        #[cfg(not(feature = "gltf-models"))]
        {
            log::info!("Built without glTF support, vessels use placeholder hulls");
            Box::new(vesselwave::vessel::NullAssetProvider)
        }
    }
}
