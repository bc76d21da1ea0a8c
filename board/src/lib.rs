//! Minesweeper board engine.
//!
//! A [`Board`] owns a grid of [`CellState`]s laid out once at construction and
//! changed only through [`Board::reveal`] and [`Board::toggle_flag`]. Revealing a
//! cell without adjacent bombs flood-fills its region; revealing a bomb opens the
//! whole board. The board is finished once every cell is revealed or flagged.
//!
//! ```
//! use minesweeper_board::{Board, RevealOutcome};
//!
//! let mut board: Board = "
//!     *..
//!     ...
//!     ...
//! "
//! .parse()?;
//!
//! assert_eq!(board.reveal(2, 2)?, RevealOutcome::Continue);
//! board.toggle_flag(0, 0)?;
//! assert!(board.is_won());
//! # Ok::<(), minesweeper_board::BoardError>(())
//! ```
//!
//! [`models`] and [`protocol`] describe what a front end sees: per-cell
//! [`CellView`]s and the JSON messages exchanged with a host.

mod board;
mod error;
pub mod models;
pub mod protocol;
mod view;

pub use board::{Board, CellState, RevealOutcome};
pub use error::BoardError;
pub use models::{BoardParams, CellView, Pos};
pub use view::diff;
