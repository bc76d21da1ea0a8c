use minesweeper_server::{build, config::Settings};
use tracing::info;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    info!("Starting minesweeper server");

    let settings = Settings::from_env();
    let rocket = build(settings)?;

    info!("Endpoints: POST /create, GET /ws");
    rocket.launch().await?;

    Ok(())
}
