use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notification_bell::app::bell::BellWidget;
use notification_bell::app::cache::{LoadOutcome, NotificationCache};
use notification_bell::app::counter::UnreadCounter;
use notification_bell::config::AppConfig;
use notification_bell::infra::api::NotificationApi;
use notification_bell::infra::client::HttpNotificationApi;

const WATCH_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let api: Arc<dyn NotificationApi> = Arc::new(HttpNotificationApi::new(
        &config.api_base_url,
        config.api_token.clone(),
        config.request_timeout(),
    )?);

    match config.app_mode.as_str() {
        "watch" => {
            tracing::info!(base_url = %config.api_base_url, "watching unread notifications");
            let widget = BellWidget::mount(api, config.bell);
            let mut sampler = tokio::time::interval(WATCH_SAMPLE_INTERVAL);
            let mut last_seen = None;

            let shutdown = shutdown_signal();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = sampler.tick() => {
                        let unread = widget.unread_count();
                        if last_seen != Some(unread) {
                            tracing::info!(unread, badge = ?widget.badge(), "unread count changed");
                            last_seen = Some(unread);
                        }
                    }
                }
            }

            widget.unmount().await;
        }
        "feed" => {
            let counter = UnreadCounter::new(api.clone());
            let cache = NotificationCache::new(api);
            if let LoadOutcome::Failed = cache.load_first_page(config.bell.page_size).await {
                return Err(anyhow!("failed to load notifications"));
            }
            let unread = counter.refresh().await;
            for item in cache.snapshot().await {
                tracing::info!(
                    id = %item.id,
                    category = %item.category,
                    read = item.is_read,
                    link = ?item.link,
                    "{}",
                    item.title
                );
            }
            tracing::info!(unread = ?unread, "feed loaded");
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
