mod calendar;
mod config;
mod engine;
mod error;
mod gate;
mod generator;
mod overrides;
mod registry;
mod schedule;
mod storybook;
mod trainings;
mod validate;
mod view;

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use axum::{
    Router,
    response::Redirect,
    routing::{get, get_service},
};
use clap::Parser;
use dotenvy::EnvLoader;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::registry::AppState;

#[derive(Parser, Debug)]
#[command(name = "trainings")]
#[command(about = "Serve the recurring training editor")]
struct Args {
    /// Config file (overrides TRAININGS_CONFIG from .env)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides `bind` from the config file)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trainings=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let dotenv = EnvLoader::new().load().unwrap_or_default();

    let config_path = args
        .config
        .or_else(|| dotenv.get("TRAININGS_CONFIG").map(PathBuf::from))
        .or_else(|| std::env::var("TRAININGS_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("trainings.toml"));
    let config = AppConfig::load(&config_path)?;
    config::init_timezone(&config.timezone);

    let bind = args.bind.unwrap_or_else(|| config.bind.clone());
    tracing::info!(
        config = %config_path.display(),
        editor = ?config.editor,
        "configuration loaded"
    );

    fs::create_dir_all("static")?;
    let static_dir = ServeDir::new("static");

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/trainings") }))
        .nest("/storybook", storybook::router())
        .nest("/trainings", trainings::router())
        .with_state(AppState::new(config.editor))
        .nest_service("/static", get_service(static_dir))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
