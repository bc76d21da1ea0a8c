use std::str::FromStr;

use rand::Rng;
use tracing::{debug, instrument, trace};

use crate::{error::BoardError, models::BoardParams};

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// State of a single cell.
///
/// `bomb` is fixed at construction, `revealed` and `visited` only ever turn on,
/// `flagged` toggles while the cell is covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellState {
    pub bomb: bool,
    pub revealed: bool,
    pub flagged: bool,
    /// Set by flood-fill only.
    pub visited: bool,
}

/// Result of a [`Board::reveal`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The cell was already revealed or is flagged; nothing changed.
    NoOp,
    Continue,
    /// Every cell is now revealed or flagged.
    Win,
    /// A bomb was revealed and the whole board opened.
    Loss,
}

/// A minefield and the player's progress on it.
///
/// Cells are stored row-major: `cells[row * cols + col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    bomb_count: usize,
    last_detonated: Option<(usize, usize)>,
    cells: Vec<CellState>,
}

impl Board {
    /// Lay out a fresh board using the thread-local generator.
    pub fn new(params: &BoardParams) -> Result<Self, BoardError> {
        Self::with_rng(params, &mut rand::rng())
    }

    /// Lay out a fresh board with one independent Bernoulli trial per cell.
    ///
    /// The number of bombs is not controlled: a board may end up with none or
    /// with bombs on every cell.
    pub fn with_rng<R: Rng + ?Sized>(params: &BoardParams, rng: &mut R) -> Result<Self, BoardError> {
        params.validate()?;

        let bombs = (0..params.rows * params.cols)
            .map(|_| rng.random_bool(params.bomb_probability))
            .collect();

        Self::from_bombs(params.rows, params.cols, bombs)
    }

    /// Build a board from a fixed row-major bomb layout.
    pub fn from_bombs(rows: usize, cols: usize, bombs: Vec<bool>) -> Result<Self, BoardError> {
        BoardParams {
            rows,
            cols,
            bomb_probability: 0.0,
        }
        .validate()?;

        if bombs.len() != rows * cols {
            return Err(BoardError::LayoutMismatch {
                expected: rows * cols,
                actual: bombs.len(),
            });
        }

        let cells: Vec<CellState> = bombs
            .into_iter()
            .map(|bomb| CellState {
                bomb,
                ..Default::default()
            })
            .collect();
        let bomb_count = cells.iter().filter(|cell| cell.bomb).count();

        debug!(rows, cols, bomb_count, "laid out board");

        Ok(Self {
            rows,
            cols,
            bomb_count,
            last_detonated: None,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn bomb_count(&self) -> usize {
        self.bomb_count
    }

    pub fn flag_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.flagged).count()
    }

    /// The bomb whose reveal lost the game, if any.
    pub fn last_detonated(&self) -> Option<(usize, usize)> {
        self.last_detonated
    }

    pub fn is_lost(&self) -> bool {
        self.last_detonated.is_some()
    }

    pub fn is_won(&self) -> bool {
        !self.is_lost() && self.is_finished()
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<CellState, BoardError> {
        let index = self.check(row, col)?;
        Ok(self.cells[index])
    }

    /// All cells with their coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, CellState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (index / self.cols, index % self.cols, *cell))
    }

    /// Count the in-grid neighbours of `(row, col)` matching `predicate`.
    pub fn count_neighbors<F>(&self, row: usize, col: usize, predicate: F) -> Result<usize, BoardError>
    where
        F: Fn(&CellState) -> bool,
    {
        self.check(row, col)?;
        Ok(self.count_around(row, col, predicate))
    }

    pub fn adjacent_bombs(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        self.count_neighbors(row, col, |cell| cell.bomb)
    }

    /// Open a covered cell.
    ///
    /// Revealing a bomb opens the whole board. Revealing a cell with no
    /// adjacent bombs flood-fills the surrounding region.
    #[instrument(level = "trace", skip(self))]
    pub fn reveal(&mut self, row: usize, col: usize) -> Result<RevealOutcome, BoardError> {
        let index = self.check(row, col)?;
        let cell = &mut self.cells[index];

        if cell.revealed || cell.flagged {
            return Ok(RevealOutcome::NoOp);
        }

        cell.revealed = true;

        if cell.bomb {
            self.last_detonated = Some((row, col));
            self.reveal_all();
            debug!(row, col, "bomb detonated");
            return Ok(RevealOutcome::Loss);
        }

        if self.count_around(row, col, |cell| cell.bomb) == 0 {
            let opened = self.expand(row, col);
            trace!(row, col, opened, "flood-fill finished");
        }

        if self.is_finished() {
            debug!(row, col, "board finished");
            Ok(RevealOutcome::Win)
        } else {
            Ok(RevealOutcome::Continue)
        }
    }

    /// Flip the flag on a covered cell. Revealed cells are left alone.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Result<(), BoardError> {
        let index = self.check(row, col)?;
        let cell = &mut self.cells[index];

        if !cell.revealed {
            cell.flagged = !cell.flagged;
        }

        Ok(())
    }

    /// True when every cell is revealed or flagged. Flags are not checked
    /// against the bomb layout.
    pub fn is_finished(&self) -> bool {
        self.cells.iter().all(|cell| cell.revealed || cell.flagged)
    }

    /// Whether a revealed number cell still has fewer flagged neighbours than
    /// adjacent bombs.
    pub fn careful(&self, row: usize, col: usize) -> Result<bool, BoardError> {
        self.check(row, col)?;
        Ok(self.careful_at(row, col))
    }

    /// Unchecked accessor for coordinates already known to be on the board.
    pub(crate) fn cell_at(&self, row: usize, col: usize) -> CellState {
        self.cells[self.index(row, col)]
    }

    pub(crate) fn careful_at(&self, row: usize, col: usize) -> bool {
        let cell = self.cell_at(row, col);

        if !cell.revealed || cell.bomb {
            return false;
        }

        let bombs = self.count_around(row, col, |cell| cell.bomb);
        bombs > 0 && self.count_around(row, col, |cell| cell.flagged) < bombs
    }

    pub(crate) fn count_around<F>(&self, row: usize, col: usize, predicate: F) -> usize
    where
        F: Fn(&CellState) -> bool,
    {
        self.neighbors(row, col)
            .filter(|&(r, c)| predicate(&self.cells[self.index(r, c)]))
            .count()
    }

    fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            self.contains(r, c).then_some((r, c))
        })
    }

    /// Flood-fill from a zero-adjacency cell with an explicit worklist.
    ///
    /// Neighbours are pushed unfiltered; bounds and the visited mark are
    /// checked when a cell is popped. Returns the number of cells visited.
    fn expand(&mut self, row: usize, col: usize) -> usize {
        let mut visited = 0;
        let mut pending = vec![(row as isize, col as isize)];

        while let Some((r, c)) = pending.pop() {
            if r < 0 || c < 0 || !self.contains(r as usize, c as usize) {
                continue;
            }

            let (r, c) = (r as usize, c as usize);
            let index = self.index(r, c);
            let cell = &mut self.cells[index];

            if cell.visited {
                continue;
            }

            cell.visited = true;
            cell.revealed = true;
            cell.flagged = false;
            visited += 1;

            if self.count_around(r, c, |cell| cell.bomb) > 0 {
                continue;
            }

            pending.extend(
                NEIGHBOR_OFFSETS
                    .iter()
                    .map(|&(dr, dc)| (r as isize + dr, c as isize + dc)),
            );
        }

        visited
    }

    /// Opens every cell after a detonation. Flags on those cells are dropped
    /// so a cell is never both flagged and revealed.
    fn reveal_all(&mut self) {
        for cell in &mut self.cells {
            cell.revealed = true;
            cell.flagged = false;
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn check(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        if self.contains(row, col) {
            Ok(self.index(row, col))
        } else {
            Err(BoardError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }
}

/// Parse a layout such as `"*..\n...\n..."`, where `*` is a bomb and `.` a
/// safe cell. Blank lines and surrounding whitespace are ignored.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(layout: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let rows = lines.len();
        let cols = lines.first().map_or(0, |line| line.chars().count());
        let mut bombs = Vec::with_capacity(rows * cols);

        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(BoardError::RaggedLayout {
                    row,
                    expected: cols,
                    actual: width,
                });
            }
            for ch in line.chars() {
                match ch {
                    '*' => bombs.push(true),
                    '.' => bombs.push(false),
                    other => return Err(BoardError::InvalidLayout(other)),
                }
            }
        }

        Self::from_bombs(rows, cols, bombs)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn board(layout: &str) -> Board {
        layout.parse().unwrap()
    }

    #[test]
    fn test_parse_layout() {
        let board = board(
            "
            *..
            .*.
            ",
        );
        assert_eq!((board.rows(), board.cols()), (2, 3));
        assert_eq!(board.bomb_count(), 2);
        assert!(board.cell(1, 1).unwrap().bomb);
        assert!(!board.cell(0, 1).unwrap().bomb);
    }

    #[test]
    fn test_parse_rejects_bad_layouts() {
        assert_eq!(
            "*x.".parse::<Board>(),
            Err(BoardError::InvalidLayout('x'))
        );
        assert_eq!(
            "*..\n..\n...".parse::<Board>(),
            Err(BoardError::RaggedLayout {
                row: 1,
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            "...\n.\n.....".parse::<Board>(),
            Err(BoardError::RaggedLayout {
                row: 1,
                expected: 3,
                actual: 1
            })
        );
        assert!(matches!(
            "".parse::<Board>(),
            Err(BoardError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_from_bombs_length_mismatch() {
        assert_eq!(
            Board::from_bombs(2, 2, vec![false; 3]),
            Err(BoardError::LayoutMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_random_board_is_seeded_and_counted() {
        let params = BoardParams {
            rows: 16,
            cols: 30,
            bomb_probability: 0.2,
        };
        let first = Board::with_rng(&params, &mut StdRng::seed_from_u64(7)).unwrap();
        let second = Board::with_rng(&params, &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.bomb_count(),
            first.iter().filter(|(_, _, cell)| cell.bomb).count()
        );
        assert!(first.iter().all(|(_, _, cell)| !cell.revealed && !cell.flagged && !cell.visited));
    }

    #[test]
    fn test_probability_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty = Board::with_rng(
            &BoardParams {
                rows: 5,
                cols: 5,
                bomb_probability: 0.0,
            },
            &mut rng,
        )
        .unwrap();
        assert_eq!(empty.bomb_count(), 0);

        let full = Board::with_rng(
            &BoardParams {
                rows: 5,
                cols: 5,
                bomb_probability: 1.0,
            },
            &mut rng,
        )
        .unwrap();
        assert_eq!(full.bomb_count(), 25);
    }

    #[test]
    fn test_count_neighbors_clips_at_edges() {
        let board = board(
            "
            ***
            *.*
            ***
            ",
        );
        assert_eq!(board.adjacent_bombs(1, 1).unwrap(), 8);
        assert_eq!(board.adjacent_bombs(0, 0).unwrap(), 2);
        assert_eq!(board.adjacent_bombs(0, 1).unwrap(), 4);
        assert_eq!(board.count_neighbors(0, 0, |cell| !cell.bomb).unwrap(), 1);
        assert_eq!(
            board.count_neighbors(3, 0, |cell| cell.bomb),
            Err(BoardError::OutOfBounds {
                row: 3,
                col: 0,
                rows: 3,
                cols: 3
            })
        );
    }

    #[test]
    fn test_single_bomb_cell_loses() {
        let mut board = board("*");
        assert_eq!(board.reveal(0, 0).unwrap(), RevealOutcome::Loss);
        assert!(board.cell(0, 0).unwrap().revealed);
        assert_eq!(board.last_detonated(), Some((0, 0)));
        assert!(board.is_finished());
        assert!(board.is_lost());
        assert!(!board.is_won());
    }

    #[test]
    fn test_loss_reveals_every_cell_and_clears_flags() {
        let mut board = board(
            "
            *..
            ..*
            ",
        );
        board.toggle_flag(1, 2).unwrap();
        board.toggle_flag(0, 1).unwrap();

        assert_eq!(board.reveal(0, 0).unwrap(), RevealOutcome::Loss);
        assert_eq!(board.last_detonated(), Some((0, 0)));
        assert!(board.iter().all(|(_, _, cell)| cell.revealed && !cell.flagged));
        assert_eq!(board.reveal(0, 2).unwrap(), RevealOutcome::NoOp);
        assert_eq!(board.last_detonated(), Some((0, 0)));
    }

    #[test]
    fn test_flood_fill_stops_at_numbered_cells() {
        let mut board = board(
            "
            *..
            ...
            ...
            ",
        );

        assert_eq!(board.reveal(2, 2).unwrap(), RevealOutcome::Continue);
        for (row, col, cell) in board.iter() {
            assert_eq!(cell.revealed, !cell.bomb, "cell ({row}, {col})");
        }
        // (0,1), (1,0) and (1,1) border the bomb and are never expanded from,
        // so the bomb itself stays covered.
        assert!(!board.cell(0, 0).unwrap().visited);
        assert!(board.cell(1, 1).unwrap().visited);
        assert!(!board.is_finished());

        board.toggle_flag(0, 0).unwrap();
        assert!(board.is_finished());
        assert!(board.is_won());
    }

    #[test]
    fn test_numbered_cell_does_not_expand() {
        let mut board = board(
            "
            .*.
            ...
            ...
            ",
        );
        assert_eq!(board.reveal(1, 1).unwrap(), RevealOutcome::Continue);
        assert_eq!(board.iter().filter(|(_, _, cell)| cell.revealed).count(), 1);
        assert!(!board.cell(1, 1).unwrap().visited);
    }

    #[test]
    fn test_flood_fill_opens_wrongly_flagged_cells() {
        let mut board = board(
            "
            ....
            ....
            ...*
            ",
        );
        board.toggle_flag(0, 3).unwrap();
        board.toggle_flag(2, 3).unwrap();

        assert_eq!(board.reveal(0, 0).unwrap(), RevealOutcome::Win);
        let flagged = board.cell(0, 3).unwrap();
        assert!(flagged.revealed && !flagged.flagged);
        assert!(board.cell(2, 3).unwrap().flagged);
    }

    #[test]
    fn test_reveal_all_safe_cells_wins() {
        let mut board = board(
            "
            .*
            ",
        );
        assert_eq!(board.reveal(0, 0).unwrap(), RevealOutcome::Continue);
        board.toggle_flag(0, 1).unwrap();
        assert!(board.is_won());
    }

    #[test]
    fn test_flagged_cell_cannot_be_revealed() {
        let mut board = board("..\n.*");
        board.toggle_flag(1, 1).unwrap();
        let before = board.clone();

        assert_eq!(board.reveal(1, 1).unwrap(), RevealOutcome::NoOp);
        assert_eq!(board, before);
    }

    #[test]
    fn test_toggle_flag_twice_restores_cell() {
        let mut board = board("*.");
        board.toggle_flag(0, 0).unwrap();
        assert!(board.cell(0, 0).unwrap().flagged);
        assert_eq!(board.flag_count(), 1);

        board.toggle_flag(0, 0).unwrap();
        assert!(!board.cell(0, 0).unwrap().flagged);
        assert_eq!(board.flag_count(), 0);
    }

    #[test]
    fn test_toggle_flag_on_revealed_cell_is_ignored() {
        let mut board = board("*.");
        board.reveal(0, 1).unwrap();
        let before = board.clone();

        board.toggle_flag(0, 1).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_flags_may_exceed_bombs_and_finish_the_board() {
        let mut board = board("*..");
        for col in 0..3 {
            assert!(!board.is_finished());
            board.toggle_flag(0, col).unwrap();
        }
        assert_eq!(board.flag_count(), 3);
        assert!(board.is_finished());
        assert!(board.is_won());
    }

    #[test]
    fn test_out_of_bounds_actions_fail_fast() {
        let mut board = board("..\n..");
        let before = board.clone();

        assert!(matches!(
            board.reveal(2, 0),
            Err(BoardError::OutOfBounds { row: 2, col: 0, .. })
        ));
        assert!(matches!(
            board.toggle_flag(0, 5),
            Err(BoardError::OutOfBounds { row: 0, col: 5, .. })
        ));
        assert!(board.careful(9, 9).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_careful_tracks_flagged_neighbours() {
        let mut board = board(
            "
            **.
            ...
            ",
        );
        board.reveal(1, 1).unwrap();
        assert!(board.careful(1, 1).unwrap());

        board.toggle_flag(0, 0).unwrap();
        assert!(board.careful(1, 1).unwrap());

        board.toggle_flag(0, 1).unwrap();
        assert!(!board.careful(1, 1).unwrap());

        // Covered cells and bombs never warn.
        assert!(!board.careful(1, 2).unwrap());
        assert!(!board.careful(0, 0).unwrap());
    }

    #[test]
    fn test_careful_false_without_adjacent_bombs() {
        let mut board = board(
            "
            ...
            ...
            ..*
            ",
        );
        board.reveal(0, 0).unwrap();
        assert_eq!(board.adjacent_bombs(0, 0).unwrap(), 0);
        assert!(!board.careful(0, 0).unwrap());
        assert!(board.careful(1, 1).unwrap());
    }

    #[test]
    fn test_large_open_board_does_not_overflow_the_stack() {
        let mut board = Board::from_bombs(300, 300, vec![false; 90_000]).unwrap();
        assert_eq!(board.reveal(150, 150).unwrap(), RevealOutcome::Win);
        assert!(board.iter().all(|(_, _, cell)| cell.revealed && cell.visited));
    }
}
