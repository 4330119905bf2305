//! Pure transition function over [`MazeState`].

use crate::grid::Cell;
use crate::position::Direction;
use crate::state::{AgentState, MazeState};

/// Result of attempting one move: the (possibly unchanged) successor state
/// and whether the move was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub state: MazeState,
    pub accepted: bool,
}

/// Attempt to advance one cell in `direction`.
///
/// The candidate cell is `position.stepped(direction)`. A candidate outside
/// the grid or on an obstacle rejects the move: the returned state equals the
/// input state and `accepted` is `false`. A wall bump is a normal outcome,
/// not an error. On acceptance the agent occupies the candidate and faces
/// `direction`. The grid itself is never touched.
#[must_use]
pub fn apply_move(state: &MazeState, direction: Direction) -> MoveOutcome {
    let candidate = state.position().stepped(direction);
    if !state.grid.is_passable(candidate) {
        return MoveOutcome {
            state: state.clone(),
            accepted: false,
        };
    }
    MoveOutcome {
        state: MazeState::new(
            state.grid.clone(),
            AgentState::new(candidate, direction),
        ),
        accepted: true,
    }
}

/// Turn in place. Rotation has no movement candidate to reject, so it is
/// always accepted; only the facing changes.
#[must_use]
pub fn apply_face(state: &MazeState, direction: Direction) -> MazeState {
    MazeState::new(
        state.grid.clone(),
        AgentState::new(state.position(), direction),
    )
}

/// Whether the agent stands on the goal cell.
#[must_use]
pub fn is_goal_reached(state: &MazeState) -> bool {
    state.current_cell() == Cell::Goal
}
