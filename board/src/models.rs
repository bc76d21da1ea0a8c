use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// What a renderer needs to draw one cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum CellView {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "flagged")]
    Flagged,
    /// `careful` is set while fewer neighbours are flagged than there are adjacent bombs.
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8, careful: bool },
    #[serde(rename = "bomb")]
    Bomb { detonated: bool },
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl From<(usize, usize)> for Pos {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Dimensions and per-cell bomb probability of a new board.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BoardParams {
    pub rows: usize,
    pub cols: usize,
    pub bomb_probability: f64,
}

impl Default for BoardParams {
    fn default() -> Self {
        Self {
            rows: 9,
            cols: 9,
            bomb_probability: 0.1,
        }
    }
}

impl BoardParams {
    /// Total number of cells, or `None` when `rows * cols` overflows.
    pub fn cell_count(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        match self.cell_count() {
            Some(count) if count > 0 && count <= isize::MAX as usize => {}
            _ => {
                return Err(BoardError::InvalidDimensions {
                    rows: self.rows,
                    cols: self.cols,
                });
            }
        }

        if !(0.0..=1.0).contains(&self.bomb_probability) {
            return Err(BoardError::InvalidProbability(self.bomb_probability));
        }

        Ok(())
    }

    /// [`validate`](Self::validate), additionally capping the number of cells.
    pub fn validate_with_limit(&self, max_cells: usize) -> Result<(), BoardError> {
        self.validate()?;

        let cells = self.rows * self.cols;
        if cells > max_cells {
            return Err(BoardError::TooLarge {
                cells,
                max: max_cells,
            });
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateResponse {
    pub id: String,
}
