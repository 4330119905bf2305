//! Simulation state: the immutable grid plus the mutable agent pose.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::grid::{Cell, Grid};
use crate::position::{Direction, Position};

/// Which observation the driver feeds the policy each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SenseMode {
    /// Terrain of the four adjacent cells, no line of sight.
    #[default]
    Probe,
    /// Forward sight line only, occluded by the first obstacle.
    Vision,
}

impl SenseMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Vision => "vision",
        }
    }

    /// Share-code prefix for this mode.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Probe => "PB",
            Self::Vision => "VN",
        }
    }
}

impl fmt::Display for SenseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenseMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "probe" => Ok(Self::Probe),
            "vision" => Ok(Self::Vision),
            _ => Err(()),
        }
    }
}

/// Agent pose: where it stands and the direction of its last accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentState {
    pub position: Position,
    pub facing: Direction,
}

impl AgentState {
    #[must_use]
    pub const fn new(position: Position, facing: Direction) -> Self {
        Self { position, facing }
    }
}

/// Complete simulation state. The grid is shared read-only; accepted
/// transitions replace the whole value rather than mutating it, so a
/// rejected move can be asserted as plain equality.
#[derive(Debug, Clone, PartialEq)]
pub struct MazeState {
    pub grid: Arc<Grid>,
    pub agent: AgentState,
}

impl MazeState {
    #[must_use]
    pub const fn new(grid: Arc<Grid>, agent: AgentState) -> Self {
        Self { grid, agent }
    }

    /// Wrap an owned grid, sharing it from here on.
    #[must_use]
    pub fn from_grid(grid: Grid, agent: AgentState) -> Self {
        Self::new(Arc::new(grid), agent)
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.agent.position
    }

    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.agent.facing
    }

    /// Cell under the agent. The agent only ever occupies passable cells,
    /// so a missing cell reads as open rather than poisoning callers.
    #[must_use]
    pub fn current_cell(&self) -> Cell {
        self.grid.cell(self.agent.position).unwrap_or_default()
    }
}
