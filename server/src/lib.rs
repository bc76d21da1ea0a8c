//! Single-player minesweeper server.
//!
//! `POST /create` lays out a board and returns its id; `GET /ws?<id>` opens the
//! WebSocket over which the player sends `reveal`/`flag`/`restart` actions and
//! receives the cells to redraw. Each game accepts one connection at a time.

use std::sync::Arc;

use dashmap::DashMap;
use rocket::{
    Build, Rocket,
    fairing::{Fairing, Info, Kind},
    routes,
};
use tracing::{info, warn};

pub mod cleanup;
pub mod config;
pub mod cors;
pub mod logic;
pub mod routes;

use crate::{
    cleanup::start_cleanup_task,
    config::Settings,
    cors::create_cors,
    logic::Games,
    routes::{create_game, websocket_handler},
};

struct CleanupFairing;

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match (rocket.state::<Games>(), rocket.state::<Settings>()) {
            (Some(games), Some(settings)) => {
                let games = games.clone();
                let settings = settings.clone();
                tokio::spawn(async move {
                    start_cleanup_task(games, settings).await;
                });
            }
            _ => warn!("Failed to get games state for cleanup task"),
        }
        Ok(rocket)
    }
}

/// Assemble the server: game storage, CORS, the cleanup task and routes.
pub fn build(settings: Settings) -> Result<Rocket<Build>, rocket_cors::Error> {
    let games: Games = Arc::new(DashMap::new());
    let cors = create_cors(&settings.cors_allowed_origins)?;

    info!(
        "Allowing origins {:?}, boards up to {} cells",
        settings.cors_allowed_origins, settings.max_board_cells
    );

    Ok(rocket::build()
        .attach(cors)
        .attach(CleanupFairing)
        .manage(games)
        .manage(settings)
        .mount("/", routes![create_game, websocket_handler]))
}
