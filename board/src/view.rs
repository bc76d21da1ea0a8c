use crate::{
    board::Board,
    error::BoardError,
    models::{CellView, Pos},
    protocol::CellUpdate,
};

impl Board {
    /// Renderer view of a single cell.
    pub fn view(&self, row: usize, col: usize) -> Result<CellView, BoardError> {
        self.cell(row, col)?;
        Ok(self.view_at(row, col))
    }

    /// The whole board as rows of cell views.
    pub fn view_rows(&self) -> Vec<Vec<CellView>> {
        (0..self.rows())
            .map(|row| (0..self.cols()).map(|col| self.view_at(row, col)).collect())
            .collect()
    }

    fn view_at(&self, row: usize, col: usize) -> CellView {
        let cell = self.cell_at(row, col);

        if cell.flagged {
            CellView::Flagged
        } else if !cell.revealed {
            CellView::Hidden
        } else if cell.bomb {
            CellView::Bomb {
                detonated: self.last_detonated() == Some((row, col)),
            }
        } else {
            CellView::Revealed {
                adjacent: self.count_around(row, col, |cell| cell.bomb) as u8,
                careful: self.careful_at(row, col),
            }
        }
    }
}

/// Cells whose view differs between two snapshots of the same board.
///
/// Snapshots of different shapes are compared over their common area.
pub fn diff(before: &[Vec<CellView>], after: &[Vec<CellView>]) -> Vec<CellUpdate> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .flat_map(|(row, (old, new))| {
            old.iter()
                .zip(new)
                .enumerate()
                .filter(|(_, (old, new))| old != new)
                .map(move |(col, (_, new))| CellUpdate {
                    pos: Pos { row, col },
                    value: *new,
                })
        })
        .collect()
}
