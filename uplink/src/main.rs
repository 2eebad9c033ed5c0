use std::sync::Arc;

use serenity::client::Client;
use serenity::model::gateway::GatewayIntents;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uplink_platforms::Prober;

use uplink::announcer::DiscordAnnouncer;
use uplink::bot::Handler;
use uplink::config::AppConfig;
use uplink::database;
use uplink::database::repositories::SqlxStreamRepository;
use uplink::logging;
use uplink::watcher::StreamWatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref())?;
    info!("uplink starting");

    // Initialize database
    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let repository = Arc::new(SqlxStreamRepository::new(pool));
    let prober = Arc::new(Prober::new(config.prober_config())?);
    let refresh = Arc::new(Notify::new());

    let handler = Handler::new(repository.clone(), refresh.clone());
    let mut client = Client::builder(&config.discord_token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await?;

    // The watcher shares the gateway client's HTTP stack for delivery.
    let announcer = Arc::new(DiscordAnnouncer::new(client.http.clone()));
    let watcher = Arc::new(StreamWatcher::new(repository, prober, announcer));

    let cancellation_token = CancellationToken::new();
    let watcher_task = {
        let watcher = Arc::clone(&watcher);
        let refresh = Arc::clone(&refresh);
        let cancellation_token = cancellation_token.clone();
        let interval = config.poll_interval;
        tokio::spawn(async move { watcher.run(interval, refresh, cancellation_token).await })
    };

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received");
        shard_manager.shutdown_all().await;
    });

    let gateway_result = client.start().await;
    if let Err(e) = &gateway_result {
        error!("Discord client stopped: {}", e);
    }

    // Let an in-flight reconcile pass finish before exiting.
    cancellation_token.cancel();
    if let Err(e) = watcher_task.await {
        warn!("Watcher task did not stop cleanly: {}", e);
    }

    info!("uplink stopped");
    gateway_result.map_err(Into::into)
}
