//! vesselwave library - procedural ocean and choreographed vessel showcase

pub mod camera;
pub mod choreography;
pub mod environment;
pub mod error;
pub mod mesh;
pub mod noise;
pub mod ocean;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod vessel;

pub use error::{Result, SceneError};
