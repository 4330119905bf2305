//! Deadreckon Maze Engine
//!
//! Platform-agnostic core logic for the Deadreckon exploration simulator.
//! This crate provides the grid model, transition function, exploration
//! policies, and simulation driver without UI or platform-specific
//! dependencies.

pub mod config;
pub mod constants;
pub mod explorer;
pub mod grid;
pub mod numbers;
pub mod position;
pub mod rng;
pub mod seed;
pub mod session;
pub mod state;
pub mod transition;

// Re-export commonly used types
pub use config::{ConfigError, GridConfig};
pub use explorer::{
    DepthFirstExplorer, ExplorerPolicy, ExplorerStrategy, LeftHandScout, Move, Observation,
    PolicyError, RandomWalker, Terrain,
};
pub use grid::{Cell, Grid, GridError};
pub use position::{Direction, PRIORITY, Position};
pub use rng::{CountingRng, RngBundle};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy};
pub use session::{ExplorationSession, RunStatus, RunSummary, StepAction, StepOutcome};
pub use state::{AgentState, MazeState, SenseMode};
pub use transition::{MoveOutcome, apply_face, apply_move, is_goal_reached};
