use std::sync::Arc;
use task_notifier::config::Config;
use task_notifier::db::{create_pool, run_migrations};
use task_notifier::notification::{Dispatcher, DueTaskQuery, NotificationScheduler};
use task_notifier::push::{FcmPushSender, VapidWebPushSender};
use task_notifier::task::PgTaskRepository;
use task_notifier::user::PgUserRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,task_notifier=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Stores
    let task_repository = Arc::new(PgTaskRepository::new(db.clone()));
    let user_repository = Arc::new(PgUserRepository::new(db.clone()));

    // Delivery channels; missing credentials degrade to logging no-ops
    let web_push = Arc::new(VapidWebPushSender::new(config.web_push.clone()));
    let native_push = Arc::new(FcmPushSender::from_config(config.fcm.clone()).await);

    // Notification core
    let query = DueTaskQuery::new(
        task_repository.clone(),
        user_repository.clone(),
        config.reminder_window,
    );
    let dispatcher = Dispatcher::new(task_repository, user_repository, web_push, native_push);
    let mut scheduler = NotificationScheduler::new(query, dispatcher, config.scheduler_interval);

    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    scheduler.stop().await?;

    Ok(())
}
