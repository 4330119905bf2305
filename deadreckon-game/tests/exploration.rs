use deadreckon_game::{
    AgentState, Cell, Direction, ExplorationSession, ExplorerStrategy, Grid, MazeState, PRIORITY,
    Position, RunStatus, SenseMode, StepAction, apply_move,
};

fn session_on(
    rows: &[&str],
    row: i32,
    col: i32,
    strategy: ExplorerStrategy,
    sense: SenseMode,
) -> ExplorationSession {
    let grid = Grid::from_glyphs(rows).expect("fixture");
    let state = MazeState::from_grid(grid, AgentState::new(Position::new(row, col), Direction::Up));
    ExplorationSession::from_state(state, sense, strategy, 0xC0FFEE)
}

fn open_rows(width: usize, height: usize) -> Vec<String> {
    let mut rows = vec![".".repeat(width); height];
    // Goal in the far corner.
    rows[height - 1].replace_range(width - 1..width, "X");
    rows
}

#[test]
fn transition_acceptance_matches_grid_passability_everywhere() {
    let grid = Grid::from_glyphs(&["..O.X", ".O...", "....O"]).expect("fixture");
    let shared = MazeState::from_grid(grid, AgentState::default());
    for position in shared.grid.positions() {
        if !shared.grid.is_passable(position) {
            continue;
        }
        let state = MazeState::new(
            shared.grid.clone(),
            AgentState::new(position, Direction::Up),
        );
        for direction in PRIORITY {
            let candidate = position.stepped(direction);
            let outcome = apply_move(&state, direction);
            assert_eq!(
                outcome.accepted,
                shared.grid.is_passable(candidate),
                "at {position} moving {direction}"
            );
            if outcome.accepted {
                assert_eq!(outcome.state.position(), candidate);
                assert!(!outcome.state.grid.is_outside(candidate));
            } else {
                assert_eq!(outcome.state, state, "rejection must preserve the state");
            }
        }
    }
}

#[test]
fn open_field_depth_first_wins_within_linear_bounds() {
    let rows = open_rows(5, 4);
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let mut session = session_on(&rows, 0, 0, ExplorerStrategy::DepthFirst, SenseMode::Probe);
    let status = session.run(session.default_step_cap());
    assert_eq!(status, RunStatus::Won);

    let summary = session.summary();
    let cells = 20_u64;
    assert!(summary.advances <= cells, "forward moves bounded by area");
    assert!(summary.backtracks <= cells, "retreats bounded by area");
    assert!(summary.backtracks <= summary.advances);
    assert_eq!(summary.final_position, Position::new(3, 4));
    assert_eq!(summary.rejections, 0, "probe-guided moves never bump");
    assert_eq!(summary.faults, 0);
}

#[test]
fn sealed_goal_sweeps_the_component_exactly_once_then_exhausts() {
    // Ring of obstacles around the goal; the reachable component is the
    // outer band of 16 open cells.
    let mut session = session_on(
        &[".....", ".OOO.", ".OXO.", ".OOO.", "....."],
        0,
        0,
        ExplorerStrategy::DepthFirst,
        SenseMode::Probe,
    );
    let status = session.run(session.default_step_cap());
    assert_eq!(status, RunStatus::Exhausted);

    let summary = session.summary();
    assert_eq!(summary.visited_cells, 16, "every reachable cell exactly once");
    assert_eq!(summary.advances, 15, "one forward move per new cell");
    assert_eq!(summary.backtracks, 15, "full unwind back to the start");
    assert_eq!(summary.final_position, Position::new(0, 0));
    assert_eq!(summary.steps, summary.advances + summary.backtracks + 1);
    assert!(!summary.step_cap_hit);
}

#[test]
fn comb_maze_forces_deep_backtracking_before_the_win() {
    // Teeth dead-end upward off a bottom corridor; the goal caps the far end.
    let mut session = session_on(
        &[".O.O.O.", ".O.O.O.", ".O.O.O.", "......X"],
        0,
        0,
        ExplorerStrategy::DepthFirst,
        SenseMode::Probe,
    );
    let status = session.run(session.default_step_cap());
    assert_eq!(status, RunStatus::Won);

    let summary = session.summary();
    assert_eq!(summary.advances, 15);
    assert_eq!(summary.backtracks, 6, "three retreats out of each dead-end tooth");
    assert_eq!(summary.steps, 21);
    assert_eq!(summary.visited_cells, 16);
    assert_eq!(summary.final_position, Position::new(3, 6));
    assert_eq!(
        summary.steps,
        summary.advances + summary.backtracks + summary.turns + summary.rejections + summary.faults
    );
}

#[test]
fn random_walker_stays_on_passable_cells_and_keeps_honest_counters() {
    let grid = Grid::from_glyphs(&["...", ".O.", "..X"]).expect("fixture");
    let state = MazeState::from_grid(grid, AgentState::new(Position::new(0, 0), Direction::Up));
    let mut session =
        ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::RandomWalk, 99);

    for _ in 0..64 {
        if session.status().is_terminal() {
            break;
        }
        let before = session.state().position();
        let outcome = session.step();
        assert!(
            session.state().grid.is_passable(outcome.position),
            "the agent can only stand on passable cells"
        );
        if let StepAction::Bumped(_) = outcome.action {
            assert_eq!(outcome.position, before, "a bump may not move the agent");
        }
    }

    let summary = session.summary();
    assert_eq!(
        summary.steps,
        summary.advances + summary.backtracks + summary.turns + summary.rejections + summary.faults
    );
    assert_eq!(summary.turns, 0, "the walker only ever advances");
    assert_eq!(summary.faults, 0);
}

#[test]
fn same_seed_walkers_take_identical_paths() {
    let build = || {
        let grid = Grid::from_glyphs(&["...", ".O.", "..X"]).expect("fixture");
        let state =
            MazeState::from_grid(grid, AgentState::new(Position::new(0, 0), Direction::Up));
        ExplorationSession::from_state(state, SenseMode::Probe, ExplorerStrategy::RandomWalk, 4242)
    };
    let mut left = build();
    let mut right = build();
    for _ in 0..48 {
        assert_eq!(left.step(), right.step());
    }
    assert_eq!(left.summary(), right.summary());
}

#[test]
fn vision_scout_circles_a_pillar_without_faulting() {
    // Open ring around a central obstacle. The scout has no termination
    // guarantee here; the cap halts it and nothing ever faults.
    let mut session = session_on(
        &["...", ".O.", "..X"],
        0,
        0,
        ExplorerStrategy::LeftHand,
        SenseMode::Vision,
    );
    let status = session.run(64);
    let summary = session.summary();
    assert_eq!(summary.faults, 0);
    assert_eq!(summary.rejections, 0, "the scout only walks open sight lines");
    if status == RunStatus::InProgress {
        assert!(summary.step_cap_hit);
    } else {
        assert_eq!(status, RunStatus::Won);
    }
    assert_eq!(
        summary.steps,
        summary.advances + summary.backtracks + summary.turns + summary.rejections + summary.faults
    );
}
