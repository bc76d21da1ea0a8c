use std::{fmt::Display, sync::Arc, time::Instant};

use dashmap::DashMap;
use rocket::futures::{Sink, SinkExt, stream::SplitSink};
use rocket_ws::{
    Message,
    frame::{CloseCode, CloseFrame},
    stream::DuplexStream,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use minesweeper_board::{
    Board, BoardError, BoardParams, Pos, diff,
    protocol::{ClientMessage, ServerMessage},
};

pub type Games = Arc<DashMap<String, Arc<Mutex<Game>>>>;

/// Write half of a player's WebSocket.
pub type Player = SplitSink<DuplexStream, Message>;

/// One board and the single player connected to it.
///
/// `apply` is the input adapter: it resolves client messages into board calls
/// and answers with the cells the renderer has to redraw.
pub struct Game<S = Player> {
    board: Board,
    max_cells: usize,
    stream: Option<S>,
    created: Instant,
    last_activity: Instant,
}

async fn send<S>(stream: &mut S, message: &ServerMessage)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match serde_json::to_string(message) {
        Ok(text) => {
            if let Err(e) = stream.send(Message::Text(text)).await {
                warn!("Failed to send message to player: {}", e);
            }
        }
        Err(e) => error!("Failed to serialize server message: {}", e),
    }
}

impl<S> Game<S> {
    pub fn new(params: BoardParams, max_cells: usize) -> Result<Self, BoardError> {
        params.validate_with_limit(max_cells)?;
        let board = Board::new(&params)?;

        info!(
            "Created {}x{} board with {} bombs",
            board.rows(),
            board.cols(),
            board.bomb_count()
        );

        Ok(Self::with_board(board, max_cells))
    }

    pub fn with_board(board: Board, max_cells: usize) -> Self {
        let now = Instant::now();
        Self {
            board,
            max_cells,
            stream: None,
            created: now,
            last_activity: now,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn init_message(&self) -> ServerMessage {
        ServerMessage::Init {
            rows: self.board.rows(),
            cols: self.board.cols(),
            bombs: self.board.bomb_count(),
            field: self.board.view_rows(),
        }
    }

    /// Won, lost, or every cell otherwise settled.
    pub fn is_over(&self) -> bool {
        self.board.is_lost() || self.board.is_finished()
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn detach(&mut self) {
        self.stream = None;
        self.last_activity = Instant::now();
    }

    pub fn should_cleanup(&self, inactive_timeout_secs: u64, active_timeout_secs: u64) -> bool {
        let now = Instant::now();

        if now.duration_since(self.created).as_secs() > active_timeout_secs {
            return true;
        }

        !self.is_connected() && now.duration_since(self.last_activity).as_secs() > inactive_timeout_secs
    }

    /// Apply one client message to the board.
    ///
    /// Out-of-range coordinates and actions after the game is over are
    /// dropped. Returns `None` when nothing visible changed.
    pub fn apply(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        self.last_activity = Instant::now();

        match message {
            ClientMessage::Reveal { pos } => self.act(pos, |board| {
                let outcome = board.reveal(pos.row, pos.col)?;
                debug!(?outcome, "Revealed cell ({}, {})", pos.row, pos.col);
                Ok(())
            }),
            ClientMessage::Flag { pos } => self.act(pos, |board| board.toggle_flag(pos.row, pos.col)),
            ClientMessage::Restart { params } => self.restart(params),
        }
    }

    #[instrument(level = "trace", skip(self, pos, action), fields(row = pos.row, col = pos.col))]
    fn act<F>(&mut self, pos: Pos, action: F) -> Option<ServerMessage>
    where
        F: FnOnce(&mut Board) -> Result<(), BoardError>,
    {
        if !self.board.contains(pos.row, pos.col) {
            debug!("Dropping input outside the board: ({}, {})", pos.row, pos.col);
            return None;
        }

        if self.is_over() {
            debug!("Ignoring input on finished game at ({}, {})", pos.row, pos.col);
            return None;
        }

        let before = self.board.view_rows();
        if let Err(e) = action(&mut self.board) {
            error!("Board rejected input at ({}, {}): {}", pos.row, pos.col, e);
            return None;
        }

        let updates = diff(&before, &self.board.view_rows());
        if updates.is_empty() {
            return None;
        }

        let won = self.board.is_won();
        let lost = self.board.is_lost();
        if won {
            info!("Game won");
        } else if lost {
            info!("Game lost at {:?}", self.board.last_detonated());
        }

        Some(ServerMessage::Update { updates, won, lost })
    }

    fn restart(&mut self, params: BoardParams) -> Option<ServerMessage> {
        if let Err(e) = params.validate_with_limit(self.max_cells) {
            warn!("Ignoring restart with invalid parameters: {}", e);
            return None;
        }

        match Board::new(&params) {
            Ok(board) => {
                info!(
                    "Restarted with {}x{} board and {} bombs",
                    board.rows(),
                    board.cols(),
                    board.bomb_count()
                );
                self.board = board;
                Some(self.init_message())
            }
            Err(e) => {
                warn!("Failed to lay out new board: {}", e);
                None
            }
        }
    }
}

impl<S> Game<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    /// Attach the player's stream and send the current board.
    ///
    /// A game holds one player. A second stream is sent a policy close frame
    /// and dropped, and `false` is returned.
    pub async fn attach(&mut self, mut stream: S) -> bool {
        if self.is_connected() {
            let frame = CloseFrame {
                code: CloseCode::Policy,
                reason: "game already has a player".into(),
            };
            if let Err(e) = stream.send(Message::Close(Some(frame))).await {
                warn!("Failed to close refused connection: {}", e);
            }
            return false;
        }

        send(&mut stream, &self.init_message()).await;
        self.stream = Some(stream);
        self.last_activity = Instant::now();
        true
    }

    /// Apply one client message and push the reply, if any, to the player.
    pub async fn handle(&mut self, message: ClientMessage) {
        if let Some(reply) = self.apply(message)
            && let Some(stream) = self.stream.as_mut()
        {
            send(stream, &reply).await;
        }
    }
}
