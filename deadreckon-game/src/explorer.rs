//! Exploration policies: statically compiled strategies over local
//! observations. Policies never see the map, only what the driver senses.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::grid::Cell;
use crate::numbers::coord_to_index;
use crate::position::{Direction, PRIORITY, Position};
use crate::state::{MazeState, SenseMode};

/// What the agent senses in one adjacent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Open,
    Goal,
    Obstacle,
    Boundary,
}

impl Terrain {
    /// Whether an agent could advance onto this terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Open | Self::Goal)
    }
}

/// Everything a policy learns in one tick. Exactly one of `neighbors` and
/// `vision` is populated, according to the driver's sense mode; the grid
/// itself is never exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub position: Position,
    pub facing: Direction,
    pub current: Cell,
    /// Adjacent terrain in `[Up, Down, Left, Right]` order (probe mode).
    pub neighbors: Option<[Terrain; 4]>,
    /// Forward sight line, nearest cell first (vision mode). Contains the
    /// cells strictly between the agent and the first obstacle or boundary,
    /// so only open and goal cells ever appear.
    pub vision: Option<SmallVec<[Cell; 8]>>,
}

impl Observation {
    /// Sense the world around the agent in the given mode.
    #[must_use]
    pub fn capture(state: &MazeState, sense: SenseMode) -> Self {
        let position = state.position();
        let facing = state.facing();
        let (neighbors, vision) = match sense {
            SenseMode::Probe => (Some(probe_neighbors(state)), None),
            SenseMode::Vision => (None, Some(sight_line(state))),
        };
        Self {
            position,
            facing,
            current: state.current_cell(),
            neighbors,
            vision,
        }
    }
}

fn probe_neighbors(state: &MazeState) -> [Terrain; 4] {
    let mut terrains = [Terrain::Boundary; 4];
    for direction in PRIORITY {
        let candidate = state.position().stepped(direction);
        terrains[direction.index()] = match state.grid.cell(candidate) {
            None => Terrain::Boundary,
            Some(Cell::Obstacle) => Terrain::Obstacle,
            Some(Cell::Goal) => Terrain::Goal,
            Some(Cell::Open) => Terrain::Open,
        };
    }
    terrains
}

fn sight_line(state: &MazeState) -> SmallVec<[Cell; 8]> {
    let mut cells = SmallVec::new();
    let mut cursor = state.position().stepped(state.facing());
    while let Some(cell) = state.grid.cell(cursor) {
        if cell == Cell::Obstacle {
            break;
        }
        cells.push(cell);
        cursor = cursor.stepped(state.facing());
    }
    cells
}

/// Errors a policy can raise instead of a move. The driver catches these at
/// the step boundary; they never abort a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{policy} policy needs {sense} observations")]
    SenseUnavailable {
        policy: &'static str,
        sense: SenseMode,
    },
    #[error("policy faulted: {reason}")]
    Faulted { reason: String },
}

/// One decision: advance a cell, or turn in place. Turning has no movement
/// candidate, so it can never be rejected by the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Advance(Direction),
    Face(Direction),
}

/// Policy interface for automated exploration.
///
/// A policy is queried once per tick with a fresh observation and answers
/// with a move, `Ok(None)` when it has exhausted its options, or an error.
/// Private memory (visited cells, retreat stack, RNG state) persists across
/// the whole run.
pub trait ExplorerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Decide the next move from the current observation.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] when the observation lacks the sense this
    /// policy requires, or when a substituted implementation fails.
    fn next_move(&mut self, observation: &Observation) -> Result<Option<Move>, PolicyError>;
}

/// Built-in exploration strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExplorerStrategy {
    DepthFirst,
    LeftHand,
    RandomWalk,
}

impl ExplorerStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DepthFirst => "Depth First",
            Self::LeftHand => "Left Hand",
            Self::RandomWalk => "Random Walk",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DepthFirst => "depth-first",
            Self::LeftHand => "left-hand",
            Self::RandomWalk => "random-walk",
        }
    }

    /// Sense mode this strategy is built for.
    #[must_use]
    pub const fn preferred_sense(self) -> SenseMode {
        match self {
            Self::DepthFirst | Self::RandomWalk => SenseMode::Probe,
            Self::LeftHand => SenseMode::Vision,
        }
    }

    /// Instantiate the policy behind this strategy. Policies that keep
    /// per-cell memory are sized against the arena dimensions.
    #[must_use]
    pub fn create_policy(
        self,
        seed: u64,
        width: u32,
        height: u32,
    ) -> Box<dyn ExplorerPolicy + Send> {
        match self {
            Self::DepthFirst => Box::new(DepthFirstExplorer::new(width, height)),
            Self::LeftHand => Box::new(LeftHandScout),
            Self::RandomWalk => Box::new(RandomWalker::new(seed)),
        }
    }
}

impl fmt::Display for ExplorerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplorerStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "depth-first" | "dfs" => Ok(Self::DepthFirst),
            "left-hand" | "scout" => Ok(Self::LeftHand),
            "random-walk" | "drunkard" => Ok(Self::RandomWalk),
            _ => Err(()),
        }
    }
}

/// Blind depth-first maze solver.
///
/// Memory is a boolean visited grid (row-major, sized to the arena at
/// construction) and an explicit stack of the directions taken forward.
/// Each activation: short-circuit at the goal, mark the current cell
/// visited, advance toward the first unvisited walkable neighbor in
/// `[Up, Down, Left, Right]` order (pushing that direction), otherwise pop
/// and retreat along the inverse of the last forward move. An empty stack
/// with no candidate means the reachable component is exhausted.
pub struct DepthFirstExplorer {
    visited: Vec<bool>,
    stack: Vec<Direction>,
    width: u32,
}

impl DepthFirstExplorer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            visited: vec![false; (width as usize) * (height as usize)],
            stack: Vec::new(),
            width,
        }
    }

    /// Cells marked visited so far.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|&&seen| seen).count()
    }

    /// Depth of the retreat stack.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn slot(&self, position: Position) -> Option<usize> {
        let row = coord_to_index(position.row)?;
        let col = coord_to_index(position.col)?;
        if col >= self.width as usize {
            return None;
        }
        let index = row * (self.width as usize) + col;
        (index < self.visited.len()).then_some(index)
    }

    fn is_visited(&self, position: Position) -> bool {
        // Positions outside the remembered arena are never worth a visit.
        self.slot(position).is_none_or(|index| self.visited[index])
    }

    fn mark_visited(&mut self, position: Position) {
        if let Some(index) = self.slot(position) {
            self.visited[index] = true;
        }
    }
}

impl ExplorerPolicy for DepthFirstExplorer {
    fn name(&self) -> &'static str {
        "Depth First"
    }

    fn next_move(&mut self, observation: &Observation) -> Result<Option<Move>, PolicyError> {
        if observation.current == Cell::Goal {
            return Ok(None);
        }
        let Some(neighbors) = observation.neighbors else {
            return Err(PolicyError::SenseUnavailable {
                policy: self.name(),
                sense: SenseMode::Probe,
            });
        };
        self.mark_visited(observation.position);
        for direction in PRIORITY {
            if !neighbors[direction.index()].is_walkable() {
                continue;
            }
            if self.is_visited(observation.position.stepped(direction)) {
                continue;
            }
            self.stack.push(direction);
            return Ok(Some(Move::Advance(direction)));
        }
        if let Some(forward) = self.stack.pop() {
            return Ok(Some(Move::Advance(forward.inverse())));
        }
        Ok(None)
    }
}

/// Vision-mode scout: walk the sight line, turn left when it runs out.
///
/// No termination guarantee; the driver's step cap bounds it.
pub struct LeftHandScout;

impl ExplorerPolicy for LeftHandScout {
    fn name(&self) -> &'static str {
        "Left Hand"
    }

    fn next_move(&mut self, observation: &Observation) -> Result<Option<Move>, PolicyError> {
        if observation.current == Cell::Goal {
            return Ok(None);
        }
        let Some(vision) = &observation.vision else {
            return Err(PolicyError::SenseUnavailable {
                policy: self.name(),
                sense: SenseMode::Vision,
            });
        };
        if vision.is_empty() {
            return Ok(Some(Move::Face(observation.facing.turned_left())));
        }
        Ok(Some(Move::Advance(observation.facing)))
    }
}

/// Uniform random advances; exists to exercise rejected-move handling.
pub struct RandomWalker {
    rng: ChaCha20Rng,
}

impl RandomWalker {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl ExplorerPolicy for RandomWalker {
    fn name(&self) -> &'static str {
        "Random Walk"
    }

    fn next_move(&mut self, observation: &Observation) -> Result<Option<Move>, PolicyError> {
        if observation.current == Cell::Goal {
            return Ok(None);
        }
        let slot = self.rng.gen_range(0..PRIORITY.len());
        Ok(Some(Move::Advance(PRIORITY[slot])))
    }
}
