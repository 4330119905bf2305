//! Maze generation configuration with validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, DEFAULT_OBSTACLE_COUNT, MAX_GRID_DIM, MIN_GRID_DIM,
};

/// Errors raised when generation parameters violate their invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    DimensionRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("requested {requested} obstacles but a {width}x{height} grid has only {cells} cells")]
    ObstacleBudget {
        requested: u32,
        width: u32,
        height: u32,
        cells: u32,
    },
}

/// Parameters for random maze generation.
///
/// The obstacle count is a draw budget, not a guaranteed density: draws may
/// collide with each other and the goal overwrites whatever it lands on, so
/// the effective obstacle count can be lower than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "GridConfig::default_width")]
    pub width: u32,
    #[serde(default = "GridConfig::default_height")]
    pub height: u32,
    #[serde(default = "GridConfig::default_obstacles")]
    pub obstacles: u32,
}

impl GridConfig {
    const fn default_width() -> u32 {
        DEFAULT_GRID_WIDTH
    }

    const fn default_height() -> u32 {
        DEFAULT_GRID_HEIGHT
    }

    const fn default_obstacles() -> u32 {
        DEFAULT_OBSTACLE_COUNT
    }

    /// Total cell count implied by the configured dimensions.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.width.saturating_mul(self.height)
    }

    /// Check every invariant, reporting the first violation.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending field when a dimension
    /// falls outside the supported range or the obstacle budget exceeds the
    /// grid area.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_GRID_DIM || self.width > MAX_GRID_DIM {
            return Err(ConfigError::DimensionRange {
                field: "grid.width",
                min: MIN_GRID_DIM,
                max: MAX_GRID_DIM,
                value: self.width,
            });
        }
        if self.height < MIN_GRID_DIM || self.height > MAX_GRID_DIM {
            return Err(ConfigError::DimensionRange {
                field: "grid.height",
                min: MIN_GRID_DIM,
                max: MAX_GRID_DIM,
                value: self.height,
            });
        }
        let cells = self.cell_count();
        if self.obstacles > cells {
            return Err(ConfigError::ObstacleBudget {
                requested: self.obstacles,
                width: self.width,
                height: self.height,
                cells,
            });
        }
        Ok(())
    }

    /// Clamp every field into its valid range instead of rejecting.
    #[must_use]
    pub fn sanitize(&self) -> Self {
        let width = self.width.clamp(MIN_GRID_DIM, MAX_GRID_DIM);
        let height = self.height.clamp(MIN_GRID_DIM, MAX_GRID_DIM);
        let obstacles = self.obstacles.min(width.saturating_mul(height));
        Self {
            width,
            height,
            obstacles,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            obstacles: Self::default_obstacles(),
        }
    }
}
