mod cli;
mod config;
mod errors;
mod llm_client;
mod matching;
mod normalizer;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Match { resume, jd, output } => {
            let llm = build_llm(&config)?;
            let rendered =
                cli::run_match(&resume, &jd, output.as_deref(), &llm, config.repair_retry).await?;
            println!("{rendered}");
            Ok(())
        }
        Command::Validate { file } => {
            println!("{}", cli::run_validate(&file)?);
            Ok(())
        }
    }
}

fn build_llm(config: &Config) -> Result<LlmClient> {
    let llm = LlmClient::new(config.require_api_key()?, config)?;
    info!("LLM client initialized (model: {})", llm.model());
    Ok(llm)
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting jdmatch API v{}", env!("CARGO_PKG_VERSION"));

    let llm = build_llm(&config)?;

    let state = AppState {
        llm: Arc::new(llm),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
