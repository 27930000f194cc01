use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use app::config::Config;
use app::storage::Storage;

mod app;

// Start the app.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::parse();

    // Initialize the connection pool and make sure the schema and statuses exist
    let storage = Storage::open(&config.database, &config.storage())?;
    storage.create_tables_if_not_exist()?;
    storage.seed_statuses()?;
    tracing::info!(
        statuses = storage.get_all_statuses()?.len(),
        "storage ready"
    );

    let router = app::web::create_router(storage);
    app::web::serve(&config.socket_addr(), router).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("todo_web=debug,tower_http=info,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}
