use crate::error::Result;
use crate::notification::dispatch::Dispatcher;
use crate::notification::payload::NotificationEvent;
use crate::notification::query::{DueTask, DueTaskQuery};
use chrono::Utc;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

/// Fixed-interval driver for the due-task scan and dispatch. Owns its timer
/// handle: `start()` arms it, `stop()` disarms it. Every tick is
/// self-contained; nothing that happens inside one can keep the next from
/// firing, and an atomic in-progress flag keeps a slow tick from overlapping
/// the next.
pub struct NotificationScheduler {
    ctx: Arc<TickContext>,
    interval: Duration,
    runner: Option<JobScheduler>,
}

impl NotificationScheduler {
    pub fn new(query: DueTaskQuery, dispatcher: Dispatcher, interval: Duration) -> Self {
        Self {
            ctx: Arc::new(TickContext {
                query,
                dispatcher,
                tick_in_progress: AtomicBool::new(false),
            }),
            interval,
            runner: None,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.runner.is_some() {
            return Ok(());
        }

        let scheduler = JobScheduler::new().await?;
        let ctx = self.ctx.clone();
        let job = Job::new_repeated_async(self.interval, move |_id, _scheduler| {
            let ctx = ctx.clone();
            Box::pin(async move {
                ctx.run_guarded().await;
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!(
            interval_secs = self.interval.as_secs(),
            "notification scheduler started"
        );
        self.runner = Some(scheduler);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut scheduler) = self.runner.take() {
            scheduler.shutdown().await?;
            info!("notification scheduler stopped");
        }
        Ok(())
    }

    /// One guarded tick, exactly as the timer fires it. Public so tests can
    /// trigger ticks directly instead of waiting on the wall clock.
    pub async fn run_tick(&self) {
        self.ctx.run_guarded().await;
    }
}

struct TickContext {
    query: DueTaskQuery,
    dispatcher: Dispatcher,
    tick_in_progress: AtomicBool,
}

impl TickContext {
    async fn run_guarded(&self) {
        if self
            .tick_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("previous tick still running; skipping this tick");
            return;
        }
        let _guard = TickGuard(&self.tick_in_progress);

        self.tick().await;
    }

    async fn tick(&self) {
        let now = Utc::now();
        debug!(%now, "scheduler tick");

        // The two phases are isolated: a failing query in one does not stop
        // the other, and neither escapes the tick.
        match self.query.upcoming(now).await {
            Ok(due) => self.dispatch_batch(due, NotificationEvent::Reminder).await,
            Err(e) => error!("upcoming-task query failed: {e}"),
        }

        match self.query.overdue(now).await {
            Ok(due) => self.dispatch_batch(due, NotificationEvent::Overdue).await,
            Err(e) => error!("overdue-task query failed: {e}"),
        }
    }

    // Independent tasks dispatch concurrently, each one error-isolated.
    async fn dispatch_batch(&self, due: Vec<DueTask>, event: NotificationEvent) {
        if due.is_empty() {
            return;
        }
        info!(count = due.len(), %event, "dispatching notifications");

        let results = join_all(due.iter().map(|due_task| async move {
            (due_task, self.dispatcher.dispatch(due_task, event).await)
        }))
        .await;

        for (due_task, result) in results {
            if let Err(e) = result {
                error!(task_id = %due_task.task.id, %event, "dispatch failed: {e}");
            }
        }
    }
}

// Clears the in-progress flag even if a tick future is dropped mid-flight.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
