//! Scheduled-job runner.
//!
//! Each registered job wraps a handler with a timer loop driven by a cron
//! schedule. Jobs share the context and channel-directory machinery with
//! message-triggered handlers: the bound [`Context`] is created at load time
//! and reused across ticks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::foundation::context::Context;
use crate::foundation::error::HandlerResult;
use crate::framework::registry::{CommandHandler, HandlerRegistry};

/// Parses a cron expression into a [`Schedule`].
///
/// The cron crate expects 6-7 fields (sec min hour dom month dow [year]).
/// Users typically write 5 fields (min hour dom month dow), so a failed
/// parse is retried with "0" prepended for seconds and "*" appended for
/// the year.
pub(crate) fn parse_schedule(expr: &str) -> Result<Schedule, cron::error::Error> {
    expr.parse().or_else(|_| {
        let padded = format!("0 {expr} *");
        padded.parse()
    })
}

/// A named, timer-driven handler with its bound context.
pub struct ScheduledJob {
    name: String,
    schedule: Schedule,
    handler: CommandHandler,
    context: Arc<Context>,
}

impl ScheduledJob {
    pub(crate) fn new(
        name: String,
        schedule: Schedule,
        handler: CommandHandler,
        context: Arc<Context>,
    ) -> Self {
        Self {
            name,
            schedule,
            handler,
            context,
        }
    }

    /// Returns the job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the next fire time strictly after `after`, if the schedule
    /// has one.
    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Invokes the handler once with the bound context.
    pub async fn run_once(&self) -> HandlerResult {
        (self.handler)(Arc::clone(&self.context)).await
    }
}

impl std::fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .finish()
    }
}

/// Drives every registered job on its own timer loop.
///
/// # Start-once contract
///
/// [`start_all`](Self::start_all) is not idempotent: calling it twice spawns
/// a second loop per job and double-fires every tick. Callers start the
/// runner exactly once.
pub struct JobRunner {
    jobs: Vec<Arc<ScheduledJob>>,
    cancel: CancellationToken,
}

impl JobRunner {
    /// Creates a runner over the given jobs.
    pub fn new(jobs: Vec<Arc<ScheduledJob>>) -> Self {
        Self {
            jobs,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a runner over every job in the registry.
    pub fn from_registry(registry: &HandlerRegistry) -> Self {
        Self::new(registry.jobs().cloned().collect())
    }

    /// Returns the number of jobs under this runner.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Starts one timer loop per job and returns the spawned handles.
    ///
    /// Each loop sleeps until the schedule's next fire time, invokes the
    /// handler with its bound context, and repeats. Handler failures are
    /// logged and the schedule stays alive. A schedule with no future fire
    /// times ends its loop.
    pub fn start_all(&self) -> Vec<JoinHandle<()>> {
        self.jobs
            .iter()
            .map(|job| {
                let job = Arc::clone(job);
                let cancel = self.cancel.clone();
                info!(job = %job.name(), "starting scheduled job");
                tokio::spawn(async move {
                    loop {
                        let now = Utc::now();
                        let Some(next) = job.next_fire(now) else {
                            info!(job = %job.name(), "schedule exhausted, stopping");
                            break;
                        };
                        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);

                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        debug!(job = %job.name(), "scheduled job tick");
                        if let Err(e) = job.run_once().await {
                            error!(job = %job.name(), error = %e, "scheduled job failed");
                        }
                    }
                })
            })
            .collect()
    }

    /// Cancels all running job loops.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("jobs", &self.jobs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::directory::ChannelDirectory;
    use crate::framework::registry::handler;
    use crate::integration::client::tests::RecordingClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn job_context() -> Arc<Context> {
        Arc::new(Context::for_job(
            RecordingClient::arc(),
            Arc::new(ChannelDirectory::new()),
        ))
    }

    #[test]
    fn five_field_expressions_are_padded() {
        let schedule = parse_schedule("0 9 * * *").unwrap();
        let next = schedule
            .after(&DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z").unwrap().to_utc())
            .next()
            .unwrap();
        assert_eq!(next.format("%H:%M:%S").to_string(), "09:00:00");
    }

    #[test]
    fn invalid_expression_is_rejected() {
        assert!(parse_schedule("definitely not cron").is_err());
    }

    #[tokio::test]
    async fn ticks_invoke_the_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let job = Arc::new(ScheduledJob::new(
            "every-second".into(),
            parse_schedule("* * * * * *").unwrap(),
            handler(move |_ctx| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
            job_context(),
        ));

        let runner = JobRunner::new(vec![job]);
        let handles = runner.start_all();
        tokio::time::sleep(Duration::from_millis(2200)).await;
        runner.shutdown();
        for h in handles {
            let _ = h.await;
        }
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn shutdown_stops_loops_before_first_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let job = Arc::new(ScheduledJob::new(
            "hourly".into(),
            parse_schedule("0 0 * * * *").unwrap(),
            handler(move |_ctx| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
            job_context(),
        ));

        let runner = JobRunner::new(vec![job]);
        let handles = runner.start_all();
        runner.shutdown();
        for h in handles {
            let _ = h.await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_handler_keeps_schedule_alive() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let job = Arc::new(ScheduledJob::new(
            "flaky".into(),
            parse_schedule("* * * * * *").unwrap(),
            handler(move |_ctx| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(crate::foundation::error::HandlerError::msg("tick failed"))
                }
            }),
            job_context(),
        ));

        let runner = JobRunner::new(vec![job]);
        let _handles = runner.start_all();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        runner.shutdown();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
