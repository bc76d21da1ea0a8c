use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::{config::Settings, logic::Games};

pub async fn start_cleanup_task(games: Games, settings: Settings) {
    let mut interval = time::interval(Duration::from_secs(settings.cleanup_interval_secs.max(1)));

    info!(
        "Started game cleanup task: checking every {}s, inactive timeout: {}s, active timeout: {}s",
        settings.cleanup_interval_secs,
        settings.inactive_game_timeout_secs,
        settings.active_game_timeout_secs
    );

    loop {
        interval.tick().await;
        cleanup_games(
            &games,
            settings.inactive_game_timeout_secs,
            settings.active_game_timeout_secs,
        );
    }
}

/// Drop games that timed out. Returns how many were removed.
pub fn cleanup_games(games: &Games, inactive_timeout_secs: u64, active_timeout_secs: u64) -> usize {
    let mut games_to_remove = Vec::new();

    for entry in games.iter() {
        // Games locked right now are in use; look again next round.
        if let Ok(game) = entry.value().try_lock()
            && game.should_cleanup(inactive_timeout_secs, active_timeout_secs)
        {
            games_to_remove.push(entry.key().clone());
        }
    }

    let removed_count = games_to_remove.len();
    for game_id in games_to_remove {
        games.remove(&game_id);
        debug!("Cleaned up game: {}", game_id);
    }

    if removed_count > 0 {
        info!("Cleaned up {} inactive games", removed_count);
    }

    removed_count
}
