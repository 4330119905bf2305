//! Exploration session: one maze, one agent, one live policy, stepped to
//! a terminal status.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::config::GridConfig;
use crate::constants::STEP_CAP_FACTOR;
use crate::explorer::{ExplorerPolicy, ExplorerStrategy, Move, Observation};
use crate::grid::{Grid, GridError};
use crate::position::{Direction, PRIORITY, Position};
use crate::rng::RngBundle;
use crate::state::{AgentState, MazeState, SenseMode};
use crate::transition::{apply_face, apply_move, is_goal_reached};

/// Where a run stands. `Exhausted` is terminal and distinct from `Won`: the
/// policy gave up with the goal unreached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    #[default]
    InProgress,
    Won,
    Exhausted,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Won => "won",
            Self::Exhausted => "exhausted",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one tick did to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepAction {
    /// Accepted move into a cell the agent had never occupied.
    Advanced(Direction),
    /// Accepted move into a previously occupied cell.
    Backtracked(Direction),
    /// Turn in place.
    Turned(Direction),
    /// Rejected move; the state is unchanged.
    Bumped(Direction),
    /// The policy raised an error; no move this tick.
    Faulted,
    /// The policy reported exhaustion.
    NoMove,
    /// The session was already terminal when stepped.
    Finished,
}

impl StepAction {
    const fn encoding(self) -> (u8, u8) {
        match self {
            Self::Finished => (0, 0xFF),
            Self::Advanced(d) => (1, d.index() as u8),
            Self::Backtracked(d) => (2, d.index() as u8),
            Self::Turned(d) => (3, d.index() as u8),
            Self::Bumped(d) => (4, d.index() as u8),
            Self::Faulted => (5, 0xFF),
            Self::NoMove => (6, 0xFF),
        }
    }
}

/// Record of one driver tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: u64,
    pub status: RunStatus,
    pub action: StepAction,
    pub position: Position,
    pub facing: Direction,
    pub note: Option<String>,
}

/// Serializable account of a finished (or capped) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub steps: u64,
    pub advances: u64,
    pub backtracks: u64,
    pub turns: u64,
    pub rejections: u64,
    pub faults: u64,
    pub visited_cells: usize,
    pub path_digest: u64,
    pub final_position: Position,
    pub final_facing: Direction,
    pub step_cap_hit: bool,
}

/// Simulation driver binding a maze state to the single live policy.
///
/// The session owns all run bookkeeping: status, counters, the occupancy
/// trail used to tell fresh advances from backtracks, and a streaming path
/// digest over every action for determinism checks. Policy errors are
/// caught here; they cost the tick and nothing else.
pub struct ExplorationSession {
    state: MazeState,
    policy: Box<dyn ExplorerPolicy + Send>,
    sense: SenseMode,
    seed: u64,
    status: RunStatus,
    steps: u64,
    advances: u64,
    backtracks: u64,
    turns: u64,
    rejections: u64,
    faults: u64,
    step_cap_hit: bool,
    trail: HashSet<Position>,
    digest: XxHash64,
}

impl ExplorationSession {
    /// Construct a session over a freshly generated maze.
    ///
    /// The user seed feeds domain-separated streams: terrain for the grid,
    /// spawn for the start cell and initial facing, and a derived seed for
    /// the policy's private randomness.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] when the generation config is invalid.
    pub fn new(
        sense: SenseMode,
        strategy: ExplorerStrategy,
        seed: u64,
        cfg: &GridConfig,
    ) -> Result<Self, GridError> {
        let bundle = RngBundle::from_user_seed(seed);
        let grid = Grid::generate(cfg, &mut *bundle.terrain())?;
        let start = grid.pick_start(&mut *bundle.spawn());
        let slot = bundle.spawn().gen_range(0..PRIORITY.len());
        let facing = PRIORITY[slot];
        let policy = strategy.create_policy(bundle.policy_seed(), grid.width(), grid.height());
        let state = MazeState::from_grid(grid, AgentState::new(start, facing));
        Ok(Self::assemble(state, sense, policy, seed))
    }

    /// Build a session over an existing state (fixture mazes).
    #[must_use]
    pub fn from_state(
        state: MazeState,
        sense: SenseMode,
        strategy: ExplorerStrategy,
        seed: u64,
    ) -> Self {
        let bundle = RngBundle::from_user_seed(seed);
        let policy = strategy.create_policy(
            bundle.policy_seed(),
            state.grid.width(),
            state.grid.height(),
        );
        Self::assemble(state, sense, policy, seed)
    }

    /// Build a session around an arbitrary policy instance. Used to drive
    /// policies outside their strategy catalog, fault injectors included.
    #[must_use]
    pub fn with_policy(
        state: MazeState,
        sense: SenseMode,
        policy: Box<dyn ExplorerPolicy + Send>,
    ) -> Self {
        Self::assemble(state, sense, policy, 0)
    }

    fn assemble(
        state: MazeState,
        sense: SenseMode,
        policy: Box<dyn ExplorerPolicy + Send>,
        seed: u64,
    ) -> Self {
        // A start on the goal is a zero-move win; the policy is never asked.
        let status = if is_goal_reached(&state) {
            RunStatus::Won
        } else {
            RunStatus::InProgress
        };
        let mut digest = XxHash64::with_seed(0);
        digest.write_u64(seed);
        for row in state.grid.to_glyphs() {
            digest.write(row.as_bytes());
        }
        digest.write_i32(state.position().row);
        digest.write_i32(state.position().col);
        digest.write_u8(state.facing().index() as u8);
        digest.write(sense.as_str().as_bytes());
        let mut trail = HashSet::new();
        trail.insert(state.position());
        Self {
            state,
            policy,
            sense,
            seed,
            status,
            steps: 0,
            advances: 0,
            backtracks: 0,
            turns: 0,
            rejections: 0,
            faults: 0,
            step_cap_hit: false,
            trail,
            digest,
        }
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    #[must_use]
    pub const fn sense(&self) -> SenseMode {
        self.sense
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Name of the live policy.
    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Borrow the underlying simulation state.
    #[must_use]
    pub const fn state(&self) -> &MazeState {
        &self.state
    }

    /// Step budget matched to this maze: generous headroom over the
    /// depth-first worst case of one forward and one retreat per cell.
    #[must_use]
    pub fn default_step_cap(&self) -> u64 {
        let cells = u64::try_from(self.state.grid.cell_count()).unwrap_or(u64::MAX);
        u64::from(STEP_CAP_FACTOR).saturating_mul(cells)
    }

    /// Advance the simulation by one tick, returning what happened.
    ///
    /// Terminal sessions echo [`StepAction::Finished`] without side effects.
    /// A live tick queries the policy exactly once; a policy error is
    /// contained here as [`StepAction::Faulted`] ("no move this tick") and
    /// the run stays in progress.
    pub fn step(&mut self) -> StepOutcome {
        if self.status.is_terminal() {
            return StepOutcome {
                step: self.steps,
                status: self.status,
                action: StepAction::Finished,
                position: self.state.position(),
                facing: self.state.facing(),
                note: None,
            };
        }
        self.steps += 1;
        let observation = Observation::capture(&self.state, self.sense);
        let mut note = None;
        let action = match self.policy.next_move(&observation) {
            Err(fault) => {
                self.faults += 1;
                note = Some(fault.to_string());
                StepAction::Faulted
            }
            Ok(None) => {
                self.status = RunStatus::Exhausted;
                StepAction::NoMove
            }
            Ok(Some(Move::Face(direction))) => {
                self.state = apply_face(&self.state, direction);
                self.turns += 1;
                StepAction::Turned(direction)
            }
            Ok(Some(Move::Advance(direction))) => {
                let outcome = apply_move(&self.state, direction);
                if outcome.accepted {
                    let revisit = !self.trail.insert(outcome.state.position());
                    self.state = outcome.state;
                    let action = if revisit {
                        self.backtracks += 1;
                        StepAction::Backtracked(direction)
                    } else {
                        self.advances += 1;
                        StepAction::Advanced(direction)
                    };
                    if is_goal_reached(&self.state) {
                        self.status = RunStatus::Won;
                    }
                    action
                } else {
                    // Bump: the state is unchanged, the tick still counts.
                    self.rejections += 1;
                    StepAction::Bumped(direction)
                }
            }
        };
        self.record_action(action);
        StepOutcome {
            step: self.steps,
            status: self.status,
            action,
            position: self.state.position(),
            facing: self.state.facing(),
            note,
        }
    }

    /// Step until the run is terminal or `step_cap` ticks have been taken.
    /// Hitting the cap leaves the session in progress.
    pub fn run(&mut self, step_cap: u64) -> RunStatus {
        while !self.status.is_terminal() {
            if self.steps >= step_cap {
                self.step_cap_hit = true;
                break;
            }
            let _ = self.step();
        }
        self.status
    }

    /// Snapshot of the run counters and the path digest so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            status: self.status,
            steps: self.steps,
            advances: self.advances,
            backtracks: self.backtracks,
            turns: self.turns,
            rejections: self.rejections,
            faults: self.faults,
            visited_cells: self.trail.len(),
            path_digest: self.digest.finish(),
            final_position: self.state.position(),
            final_facing: self.state.facing(),
            step_cap_hit: self.step_cap_hit,
        }
    }

    /// ASCII view of the maze with the agent drawn as a facing arrow.
    #[must_use]
    pub fn snapshot(&self) -> String {
        let mut rows = self.state.grid.to_glyphs();
        let position = self.state.position();
        if let (Ok(row), Ok(col)) = (
            usize::try_from(position.row),
            usize::try_from(position.col),
        ) {
            if let Some(line) = rows.get_mut(row) {
                if col < line.len() {
                    line.replace_range(col..=col, &self.state.facing().arrow().to_string());
                }
            }
        }
        rows.join("\n")
    }

    /// Consume the session, returning the underlying simulation state.
    #[must_use]
    pub fn into_state(self) -> MazeState {
        self.state
    }

    fn record_action(&mut self, action: StepAction) {
        let (tag, direction) = action.encoding();
        self.digest.write_u8(tag);
        self.digest.write_u8(direction);
        self.digest.write_i32(self.state.position().row);
        self.digest.write_i32(self.state.position().col);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::{LeftHandScout, PolicyError};
    use crate::grid::Grid;

    fn fixture_state(rows: &[&str], row: i32, col: i32, facing: Direction) -> MazeState {
        let grid = Grid::from_glyphs(rows).expect("fixture");
        MazeState::from_grid(grid, AgentState::new(Position::new(row, col), facing))
    }

    /// Policy that always walks into the same wall.
    struct Headbutt(Direction);

    impl ExplorerPolicy for Headbutt {
        fn name(&self) -> &'static str {
            "Headbutt"
        }

        fn next_move(&mut self, _observation: &Observation) -> Result<Option<Move>, PolicyError> {
            Ok(Some(Move::Advance(self.0)))
        }
    }

    #[test]
    fn corridor_first_move_wins_and_further_steps_echo() {
        let state = fixture_state(&[".X"], 0, 0, Direction::Up);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::DepthFirst, 7);
        assert_eq!(session.status(), RunStatus::InProgress);

        let first = session.step();
        assert_eq!(first.action, StepAction::Advanced(Direction::Right));
        assert_eq!(first.status, RunStatus::Won);
        assert_eq!(first.position, Position::new(0, 1));

        // Terminal echo: no counters move, the policy is not consulted.
        let echo = session.step();
        assert_eq!(echo.action, StepAction::Finished);
        assert_eq!(echo.step, 1);
        let summary = session.summary();
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.advances, 1);
        assert_eq!(summary.status, RunStatus::Won);
    }

    #[test]
    fn starting_on_the_goal_is_a_zero_move_win() {
        let state = fixture_state(&["X."], 0, 0, Direction::Right);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::DepthFirst, 7);
        assert_eq!(session.status(), RunStatus::Won);
        assert_eq!(session.step().action, StepAction::Finished);
        let summary = session.summary();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.visited_cells, 1);
    }

    #[test]
    fn surrounded_start_exhausts_immediately() {
        let state = fixture_state(&["OOOX", "O.OO", "OOOO"], 1, 1, Direction::Up);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::DepthFirst, 7);
        let outcome = session.step();
        assert_eq!(outcome.action, StepAction::NoMove);
        assert_eq!(outcome.status, RunStatus::Exhausted);
        assert!(session.status().is_terminal());
        assert_eq!(session.summary().steps, 1);
    }

    #[test]
    fn walled_goal_ends_exhausted_not_won() {
        // The goal sits in a sealed chamber; the agent's component has 3 cells.
        let state = fixture_state(&["..OX", ".OOO", "OOOO"], 0, 0, Direction::Up);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::DepthFirst, 7);
        let status = session.run(session.default_step_cap());
        assert_eq!(status, RunStatus::Exhausted);
        let summary = session.summary();
        assert_eq!(summary.visited_cells, 3);
        assert!(!summary.step_cap_hit);
    }

    #[test]
    fn bumps_preserve_state_and_count_rejections() {
        let state = fixture_state(&[".X"], 0, 0, Direction::Up);
        let before = state.clone();
        let mut session =
            ExplorationSession::with_policy(state, SenseMode::Probe, Box::new(Headbutt(Direction::Up)));
        let outcome = session.step();
        assert_eq!(outcome.action, StepAction::Bumped(Direction::Up));
        assert_eq!(outcome.status, RunStatus::InProgress);
        assert_eq!(*session.state(), before);

        let status = session.run(5);
        assert_eq!(status, RunStatus::InProgress);
        let summary = session.summary();
        assert!(summary.step_cap_hit);
        assert_eq!(summary.steps, 5);
        assert_eq!(summary.rejections, 5);
        assert_eq!(summary.advances, 0);
        assert_eq!(*session.into_state().grid, *before.grid);
    }

    #[test]
    fn policy_faults_cost_the_tick_and_nothing_else() {
        let state = fixture_state(&["..X"], 0, 0, Direction::Right);
        let before = state.clone();
        // A vision-only policy driven in probe mode faults every tick.
        let mut session =
            ExplorationSession::with_policy(state, SenseMode::Probe, Box::new(LeftHandScout));
        let outcome = session.step();
        assert_eq!(outcome.action, StepAction::Faulted);
        assert_eq!(outcome.status, RunStatus::InProgress);
        assert!(outcome.note.is_some_and(|n| n.contains("vision")));
        assert_eq!(*session.state(), before);

        session.run(4);
        let summary = session.summary();
        assert_eq!(summary.faults, 4);
        assert_eq!(summary.status, RunStatus::InProgress);
        assert!(summary.step_cap_hit);
    }

    #[test]
    fn scout_turns_are_recorded_and_always_accepted() {
        let state = fixture_state(&["..X"], 0, 0, Direction::Left);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Vision, ExplorerStrategy::LeftHand, 7);
        let outcome = session.step();
        assert_eq!(outcome.action, StepAction::Turned(Direction::Down));
        assert_eq!(outcome.position, Position::new(0, 0));
        let summary = session.summary();
        assert_eq!(summary.turns, 1);
        assert_eq!(summary.rejections, 0);
    }

    #[test]
    fn scout_walks_a_clear_corridor_to_the_goal() {
        let state = fixture_state(&["..X"], 0, 0, Direction::Right);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Vision, ExplorerStrategy::LeftHand, 7);
        let status = session.run(session.default_step_cap());
        assert_eq!(status, RunStatus::Won);
        let summary = session.summary();
        assert_eq!(summary.advances, 2);
        assert_eq!(summary.final_position, Position::new(0, 2));
    }

    #[test]
    fn generated_runs_reach_a_terminal_status_within_the_cap() {
        for seed in [1_u64, 2, 3, 1337] {
            let mut session = ExplorationSession::new(
                SenseMode::Probe,
                ExplorerStrategy::DepthFirst,
                seed,
                &GridConfig::default(),
            )
            .expect("valid config");
            let cap = session.default_step_cap();
            let status = session.run(cap);
            assert!(status.is_terminal(), "seed {seed} still in progress");
            let summary = session.summary();
            let cells = 70;
            assert!(summary.advances <= cells);
            assert!(summary.backtracks <= summary.advances);
            assert!(summary.visited_cells <= cells as usize);
            assert!(!summary.step_cap_hit);
        }
    }

    #[test]
    fn snapshot_overlays_the_agent_arrow() {
        let state = fixture_state(&[".X", ".."], 1, 0, Direction::Right);
        let session =
            ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::DepthFirst, 7);
        assert_eq!(session.snapshot(), ".X\n>.");
    }

    #[test]
    fn summaries_serialize_for_reports() {
        let state = fixture_state(&[".X"], 0, 0, Direction::Up);
        let mut session =
            ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::DepthFirst, 7);
        session.run(4);
        let summary = session.summary();
        let json = serde_json::to_string(&summary).expect("serialize");
        let restored: RunSummary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(summary, restored);
        assert!(json.contains("\"status\":\"won\""));
    }
}
