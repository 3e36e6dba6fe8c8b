//! Precis API server binary.
//!
//! Binds the listener before spawning the worker pool so the notification
//! callback URL can default to the actual bound address.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use precis_core::auth::otp::LogMailer;
use precis_core::config::AppConfig;
use precis_core::dispatch::{self, HttpNotifier};
use precis_core::summarise::OpenAiClient;

/// CLI arguments for the Precis server.
#[derive(Parser, Debug)]
#[command(name = "precis_server", about = "Precis summarization API server")]
struct Args {
    /// Port to listen on (0 = ephemeral). Overrides `BIND_ADDR` when set.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/precis"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,precis_api=debug,precis_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, "starting precis_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    precis_api::migrate(&pool).await?;

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.bind_addr = format!("127.0.0.1:{port}");
    }
    config.database_url = args.database_url;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    if std::env::var("NOTIFY_URL").is_err() {
        config.notify_url = format!("http://{local_addr}/notify/task");
    }

    // Worker pool: consumes the queue, reports back over /notify/task.
    let (dispatcher, rx) = dispatch::queue();
    let llm = Arc::new(OpenAiClient::new(
        config.openai_api_url.clone(),
        config.openai_model.clone(),
    ));
    let notifier = Arc::new(HttpNotifier::new(
        config.notify_url.clone(),
        config.notify_key.clone(),
    ));
    let workers = dispatch::spawn_workers(config.worker_count, rx, llm, notifier, config.page_size);
    info!(count = workers.len(), "summarisation workers started");

    let state = precis_api::AppState {
        pool,
        config,
        dispatcher,
        mailer: Arc::new(LogMailer),
    };

    let app = precis_api::router(state);

    info!(addr = %local_addr, "REST API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
