//! Immutable maze grid: cell model, random generation, fixtures, queries.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ConfigError, GridConfig};
use crate::constants::START_RESAMPLE_ATTEMPTS;
use crate::numbers::{coord_to_index, dim_to_i32};
use crate::position::Position;

/// One cell of the maze. Grids are immutable after construction, so a cell
/// never changes for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Open,
    Obstacle,
    Goal,
}

impl Cell {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Obstacle => "obstacle",
            Self::Goal => "goal",
        }
    }

    /// Single-character form used by glyph fixtures and ASCII snapshots.
    #[must_use]
    pub const fn as_glyph(self) -> char {
        match self {
            Self::Open => '.',
            Self::Obstacle => 'O',
            Self::Goal => 'X',
        }
    }

    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Open),
            'O' => Some(Self::Obstacle),
            'X' => Some(Self::Goal),
            _ => None,
        }
    }

    /// Whether an agent may occupy this cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Open | Self::Goal)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by grid construction and cell addressing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("position {position} outside {width}x{height} grid")]
    OutOfBounds {
        position: Position,
        width: u32,
        height: u32,
    },
    #[error("glyph layout has no rows")]
    EmptyLayout,
    #[error("glyph row {row} holds {got} cells (expected {expected})")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("unknown cell glyph '{glyph}' at ({row}, {col})")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
    #[error("grid must contain exactly one goal (found {found})")]
    GoalCount { found: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Row-major rectangular maze. Built once by a constructor, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Generate a random maze from validated parameters.
    ///
    /// Obstacle positions are drawn independently and uniformly (row first,
    /// then column) and written unconditionally, so colliding draws collapse
    /// into one cell. The goal is drawn last and also writes unconditionally,
    /// which may reclaim an obstacle cell. The result therefore has exactly
    /// one goal and at most `cfg.obstacles` obstacles.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Config`] when `cfg` fails validation.
    pub fn generate(cfg: &GridConfig, rng: &mut impl Rng) -> Result<Self, GridError> {
        cfg.validate()?;
        let mut grid = Self::open(cfg.width, cfg.height);
        for _ in 0..cfg.obstacles {
            let index = grid.draw_index(rng);
            grid.cells[index] = Cell::Obstacle;
        }
        let goal = grid.draw_index(rng);
        grid.cells[goal] = Cell::Goal;
        Ok(grid)
    }

    /// All-open grid with no goal, for coverage and liveness fixtures.
    #[must_use]
    pub fn open(width: u32, height: u32) -> Self {
        let cells = vec![Cell::Open; (width as usize) * (height as usize)];
        Self {
            width,
            height,
            cells,
        }
    }

    /// Build a grid from glyph rows (`'.'` open, `'O'` obstacle, `'X'` goal).
    ///
    /// # Errors
    ///
    /// Rejects an empty layout, ragged rows, unknown glyphs, and layouts
    /// whose goal count differs from one.
    pub fn from_glyphs(rows: &[&str]) -> Result<Self, GridError> {
        let Some(first) = rows.first() else {
            return Err(GridError::EmptyLayout);
        };
        let expected = first.chars().count();
        if expected == 0 {
            return Err(GridError::EmptyLayout);
        }
        let mut cells = Vec::with_capacity(rows.len() * expected);
        let mut goals = 0;
        for (row, text) in rows.iter().enumerate() {
            let got = text.chars().count();
            if got != expected {
                return Err(GridError::RaggedRow { row, expected, got });
            }
            for (col, glyph) in text.chars().enumerate() {
                let Some(cell) = Cell::from_glyph(glyph) else {
                    return Err(GridError::UnknownGlyph { glyph, row, col });
                };
                if cell == Cell::Goal {
                    goals += 1;
                }
                cells.push(cell);
            }
        }
        if goals != 1 {
            return Err(GridError::GoalCount { found: goals });
        }
        Ok(Self {
            width: u32::try_from(expected).unwrap_or(u32::MAX),
            height: u32::try_from(rows.len()).unwrap_or(u32::MAX),
            cells,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `position` lies outside the valid cell rectangle.
    #[must_use]
    pub fn is_outside(&self, position: Position) -> bool {
        position.row < 0
            || position.col < 0
            || position.row >= dim_to_i32(self.height)
            || position.col >= dim_to_i32(self.width)
    }

    /// Cell lookup that treats out-of-range positions as absent.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<Cell> {
        if self.is_outside(position) {
            return None;
        }
        let index = self.index_of(position)?;
        self.cells.get(index).copied()
    }

    /// Cell lookup for callers that treat out-of-range as a hard error.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when `position` lies outside the
    /// grid.
    pub fn cell_at(&self, position: Position) -> Result<Cell, GridError> {
        self.cell(position).ok_or(GridError::OutOfBounds {
            position,
            width: self.width,
            height: self.height,
        })
    }

    #[must_use]
    pub fn is_obstacle(&self, position: Position) -> bool {
        self.cell(position) == Some(Cell::Obstacle)
    }

    /// Whether an agent may stand on `position`. Out-of-range counts as
    /// impassable, so this is the single check a movement candidate needs.
    #[must_use]
    pub fn is_passable(&self, position: Position) -> bool {
        self.cell(position).is_some_and(Cell::is_passable)
    }

    /// Location of the goal cell, if the grid carries one.
    #[must_use]
    pub fn goal_position(&self) -> Option<Position> {
        self.positions().find(|&p| self.cell(p) == Some(Cell::Goal))
    }

    /// Number of cells currently holding `cell`.
    #[must_use]
    pub fn count_cells(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Uniform draw of a start cell, resampled until it is passable, with a
    /// row-major scan fallback so the call terminates on dense grids. The
    /// goal is an allowed start (a zero-move win).
    #[must_use]
    pub fn pick_start(&self, rng: &mut impl Rng) -> Position {
        for _ in 0..START_RESAMPLE_ATTEMPTS {
            let candidate = self.draw_position(rng);
            if self.is_passable(candidate) {
                return candidate;
            }
        }
        self.positions()
            .find(|&p| self.is_passable(p))
            .unwrap_or(Position::new(0, 0))
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = dim_to_i32(self.width);
        let height = dim_to_i32(self.height);
        (0..height).flat_map(move |row| (0..width).map(move |col| Position::new(row, col)))
    }

    /// Glyph rows for fixtures, digests, and snapshot rendering.
    #[must_use]
    pub fn to_glyphs(&self) -> Vec<String> {
        let width = self.width as usize;
        self.cells
            .chunks(width.max(1))
            .map(|row| row.iter().map(|cell| cell.as_glyph()).collect())
            .collect()
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a grid.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns an error if the grid cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        let row = coord_to_index(position.row)?;
        let col = coord_to_index(position.col)?;
        Some(row * (self.width as usize) + col)
    }

    fn draw_position(&self, rng: &mut impl Rng) -> Position {
        let row = rng.gen_range(0..self.height);
        let col = rng.gen_range(0..self.width);
        Position::new(dim_to_i32(row), dim_to_i32(col))
    }

    fn draw_index(&self, rng: &mut impl Rng) -> usize {
        let position = self.draw_position(rng);
        // Drawn coordinates are always in range, but stay total regardless.
        self.index_of(position).unwrap_or(0)
    }
}
