use std::sync::Arc;

use dashmap::Entry;
use nanoid::nanoid;
use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use minesweeper_board::{BoardParams, models::CreateResponse, protocol::ClientMessage};

use crate::{
    config::Settings,
    logic::{Game, Games},
};

#[instrument(level = "trace", skip(games, game))]
fn add_game(games: &Games, game: Game) -> String {
    let mut id_length = 5;
    let max_attempts_per_length = 10;

    loop {
        for _ in 0..max_attempts_per_length {
            let id = nanoid!(id_length);
            match games.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Game ID collision, trying another: {}", id);
                    continue;
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(Mutex::new(game)));
                    info!("Registered game with ID: {}", id);
                    return id;
                }
            }
        }

        warn!(
            "Exhausted ID attempts at length {}, increasing to {}",
            id_length,
            id_length + 1
        );
        id_length += 1;
    }
}

#[post("/create", data = "<params>")]
#[instrument(level = "trace", skip(params, games, settings), fields(rows = params.rows, cols = params.cols, bomb_probability = params.bomb_probability))]
pub fn create_game(
    params: Json<BoardParams>,
    games: &State<Games>,
    settings: &State<Settings>,
) -> Result<Json<CreateResponse>, Status> {
    let game = Game::new(params.0, settings.max_board_cells).map_err(|e| {
        warn!("Rejected board parameters: {}", e);
        Status::UnprocessableEntity
    })?;

    let id = add_game(games, game);
    Ok(Json(CreateResponse { id }))
}

#[get("/ws?<id>")]
#[instrument(level = "trace", skip(ws, games), fields(game_id = %id))]
pub fn websocket_handler(
    ws: WebSocket,
    games: &State<Games>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let game = match games.get(&id) {
        None => {
            warn!("WebSocket connection attempt for non-existent game: {}", id);
            return Err(Status::NotFound);
        }
        Some(value) => value.value().clone(),
    };

    if let Ok(guard) = game.try_lock()
        && guard.is_connected()
    {
        warn!("Game {} already has a player connected", id);
        return Err(Status::Conflict);
    }

    Ok(ws.channel(move |stream| {
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let attached = {
                let mut game = game.lock().await;
                game.attach(write).await
            };

            if !attached {
                warn!("Closed second connection to game {}", id);
                return Ok(());
            }

            info!("Player connected to game {}", id);

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("Received message from game {}: {:?}", id, message);
                            let mut game = game.lock().await;
                            game.handle(message).await;
                        }
                        Err(e) => {
                            warn!("Invalid message format in game {}: {} - Error: {}", id, text, e);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!("WebSocket connection closed for game {}", id);
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket error in game {}: {}", id, e);
                        break;
                    }
                    Ok(_) => debug!("Ignoring non-text message in game {}", id),
                }
            }

            {
                let mut game = game.lock().await;
                game.detach();
            }

            info!("Player disconnected from game {}", id);
            Ok(())
        })
    }))
}
