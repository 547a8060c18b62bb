use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday_feed::api::LiveScoreClient;
use matchday_feed::config::Config;
use matchday_feed::notify::{LogPlatform, NotificationService};
use matchday_feed::queue::{EventQueue, QueueEvent};
use matchday_feed::share::{self, EventFeed};
use matchday_feed::workers::{LiveMatchTracker, QueueProcessorWorker};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchday_feed=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matchday-feed");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded (backend: {})", config.livescore_api_url);

    // Core services
    let queue = Arc::new(EventQueue::new(config.queue()));
    let notifier = Arc::new(NotificationService::new(
        Arc::new(LogPlatform::new()),
        config.notifications(),
    ));
    notifier.init().await;

    let feed = Arc::new(EventFeed::new(config.event_feed_capacity));

    // Delivered digests go to the log and the share feed
    let digest_feed = Arc::clone(&feed);
    let stats_queue = Arc::clone(&queue);
    queue.add_listener(move |event| {
        if let QueueEvent::Processed(group) = event {
            info!("Live event ({} item(s)):\n{}", group.len(), group.message());
            digest_feed.push(group.message());
        }

        let stats = stats_queue.get_stats();
        info!(
            "Queue: {} pending · goals {} · red {} · yellow {}",
            stats.total, stats.by_type.goal, stats.by_type.red_card, stats.by_type.yellow_card
        );
    });

    let client = LiveScoreClient::new(&config.livescore_api_url);
    let tracker = Arc::new(LiveMatchTracker::new(
        Arc::new(client),
        Arc::clone(&queue),
        Arc::clone(&notifier),
        config.tracker(),
    ));
    tracker.set_on_match_update(|matches| {
        info!("Matches updated: {} live", matches.len());
    });

    info!("Services created, starting...");

    let queue_worker = QueueProcessorWorker::new(Arc::clone(&queue));
    let processor_handle = tokio::spawn(async move {
        queue_worker.run().await;
    });

    let tracker_handle = tracker
        .start_tracking()
        .context("Live tracking failed to start")?;

    info!("Live tracking and queue processing started");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = processor_handle => {
            error!("Queue processor exited unexpectedly: {:?}", result);
        }
        result = tracker_handle => {
            error!("Live tracker exited unexpectedly: {:?}", result);
        }
    }

    tracker.stop_tracking();

    let today = Local::now().date_naive();
    if let Some(digest) = share::live_events_digest(&feed.messages(), today) {
        info!("Share recent events: {}", share::share_url(&digest));
    }

    info!("Shutting down matchday-feed");
    Ok(())
}
