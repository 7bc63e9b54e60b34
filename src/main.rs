use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quire::config::{Cli, Command, Config};
use quire::db;
use quire::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    std::fs::create_dir_all(config.media_path())?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    if let Some(command) = cli.command {
        return run_command(&pool, command);
    }

    let state = AppState::new(pool, config.clone());
    let app = quire::routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn run_command(pool: &quire::state::DbPool, command: Command) -> anyhow::Result<()> {
    match command {
        Command::CreateGroup {
            slug,
            title,
            description,
        } => {
            let conn = pool.get()?;
            let (group, created) = db::groups::create_group(&conn, &slug, &title, &description)?;
            if created {
                tracing::info!("Created group {} ({})", group.slug, group.title);
            } else {
                tracing::info!("Group {} already exists", group.slug);
            }
        }
    }
    Ok(())
}
