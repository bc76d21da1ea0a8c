use serde::{Deserialize, Serialize};

use crate::models::{BoardParams, CellView, Pos};

/// Input events as delivered by a front end.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "reveal")]
    Reveal { pos: Pos },
    #[serde(rename = "flag")]
    Flag { pos: Pos },
    #[serde(rename = "restart")]
    Restart { params: BoardParams },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub pos: Pos,
    pub value: CellView,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        rows: usize,
        cols: usize,
        bombs: usize,
        field: Vec<Vec<CellView>>,
    },
    #[serde(rename = "update")]
    Update {
        updates: Vec<CellUpdate>,
        won: bool,
        lost: bool,
    },
}
