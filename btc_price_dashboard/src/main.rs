use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use btc_price_dashboard::routers::create_routes;
use btc_price_dashboard::{
    load_config, AppConfig, AppState, DashboardRunner, MockGenerator, PollSource, PriceFeed,
    ProxyService, PushSource, SnapshotHolder, UpdateMode, UpdateSource, UpstreamClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let _log_guard = init_tracing(&config);

    let upstream = UpstreamClient::new(config.backend_url.clone(), config.upstream_timeout())?;
    let proxy = ProxyService::new(upstream, MockGenerator::from_config(&config));

    let feed: Arc<dyn PriceFeed> = match &config.feed_url {
        Some(url) => {
            tracing::info!("Dashboard reads prices over HTTP from {}", url);
            Arc::new(UpstreamClient::new(url.clone(), config.upstream_timeout())?)
        }
        None => Arc::new(proxy.clone()),
    };

    let source: Box<dyn UpdateSource> = match config.update_mode {
        UpdateMode::Poll => Box::new(PollSource::new(feed.clone(), config.poll_interval())),
        UpdateMode::Push => {
            let url = config
                .push_channel_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("push_channel_url is required in push mode"))?;
            Box::new(PushSource::new(url))
        }
    };

    let dashboard = SnapshotHolder::new();
    let runner = DashboardRunner::new(feed, source, dashboard.clone()).spawn();

    let state = AppState {
        proxy,
        dashboard,
        config: Arc::new(config.clone()),
    };

    let app = create_routes(state);
    let addr: std::net::SocketAddr = config.bind_addr.parse()?;
    tracing::info!("Server listening on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let controller = runner.shutdown().await?;
    tracing::info!("Stopped with {} prices in the buffer", controller.len());
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("btc_price_dashboard=info,warn"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "btc_price_dashboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true))
        .with(file_layer)
        .init();

    guard
}
