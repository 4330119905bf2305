//! Centralized tuning constants for Deadreckon maze logic.
//!
//! These values define the deterministic defaults for grid generation and
//! run driving. Keeping them together ensures the simulation can only be
//! adjusted via code changes reviewed in version control.

// Grid defaults ------------------------------------------------------------
pub(crate) const DEFAULT_GRID_WIDTH: u32 = 10;
pub(crate) const DEFAULT_GRID_HEIGHT: u32 = 7;
pub(crate) const DEFAULT_OBSTACLE_COUNT: u32 = 10;

// Grid bounds accepted by config validation --------------------------------
pub(crate) const MIN_GRID_DIM: u32 = 1;
pub(crate) const MAX_GRID_DIM: u32 = 256;

// Run driving --------------------------------------------------------------
// A depth-first run needs at most one forward and one backtrack move per
// reachable cell; the factor leaves headroom for turning and bumping
// policies that carry no such bound.
pub(crate) const STEP_CAP_FACTOR: u32 = 4;

// Start placement: uniform resampling attempts before falling back to a
// deterministic scan for the first passable cell.
pub(crate) const START_RESAMPLE_ATTEMPTS: u32 = 512;
