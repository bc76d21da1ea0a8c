use thiserror::Error;

/// Failures raised by [`Board`](crate::Board) operations and board construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    /// A caller addressed a cell outside the grid. The board never clamps.
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} board")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("board dimensions must be positive and addressable, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("board of {cells} cells exceeds the limit of {max}")]
    TooLarge { cells: usize, max: usize },
    #[error("bomb probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("bomb layout has {actual} cells, expected {expected}")]
    LayoutMismatch { expected: usize, actual: usize },
    #[error("layout row {row} has {actual} cells, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unexpected character {0:?} in board layout")]
    InvalidLayout(char),
}
