//! Active-vessel rotation timing.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Choreography configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyParams {
    /// Time between automatic advances (seconds)
    pub interval_s: f32,

    /// Start the auto-advance timer when the scene is built
    pub autoplay: bool,

    /// Manual next/prev/select restarts the interval, so an automatic
    /// advance cannot land right after a click
    pub suppress_tick_after_input: bool,

    /// Index of the vessel active at startup
    pub initial_index: usize,
}

impl Default for ChoreographyParams {
    fn default() -> Self {
        Self {
            interval_s: 3.0,
            autoplay: true,
            suppress_tick_after_input: false,
            initial_index: 0,
        }
    }
}

impl ChoreographyParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_s > 0.0) || !self.interval_s.is_finite() {
            return Err(SceneError::invalid(
                "interval_s",
                format!("must be > 0, got {}", self.interval_s),
            ));
        }
        Ok(())
    }
}
