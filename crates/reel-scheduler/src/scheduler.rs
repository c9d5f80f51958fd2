//! Recurring job scheduler.
//!
//! A single periodic tick evaluates due jobs and asks the orchestrator to
//! start a project per job. Ticks never overlap themselves: a tick still
//! running when the next is due simply delays it. A failure in one job
//! never touches the others, and the job's schedule always advances so a
//! failing job is not retried every tick forever.

use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use reel_models::{ProjectId, ScheduledJob};
use reel_pipeline::{NewProject, Orchestrator};
use reel_store::Store;

use crate::cron::CronExpression;
use crate::error::SchedulerResult;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between evaluation ticks
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            tick_interval: Duration::from_secs(
                std::env::var("SCHEDULER_TICK_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

/// What happened to one due job during a tick.
#[derive(Debug)]
enum JobOutcome {
    /// A project was created and its pipeline started
    Started(ProjectId),
    /// The previous run is still in flight; this occurrence was skipped
    OverlapSkipped,
}

/// Summary of one evaluation tick.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Jobs that were due
    pub due: usize,
    /// Projects created and started
    pub started: usize,
    /// Occurrences skipped because the previous run had not finished
    pub overlap_skipped: usize,
    /// Jobs whose occurrence failed (caught and logged)
    pub errors: usize,
}

/// The recurring job scheduler service.
pub struct Scheduler {
    store: Store,
    orchestrator: Orchestrator,
    config: SchedulerConfig,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl Scheduler {
    /// Create a new scheduler over a store and an orchestrator.
    pub fn new(store: Store, orchestrator: Orchestrator, config: SchedulerConfig) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        Self {
            store,
            orchestrator,
            config,
            shutdown,
        }
    }

    /// Run the tick loop until shutdown.
    ///
    /// Spawn this as a background task. `MissedTickBehavior::Delay` makes a
    /// long tick push the next one back instead of running concurrently
    /// with itself.
    pub async fn run(&self) {
        info!(
            "Starting scheduler (tick interval: {:?})",
            self.config.tick_interval
        );

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping scheduler");
                        return;
                    }
                }
                _ = ticker.tick() => {
                    match self.tick_once(Utc::now()).await {
                        Ok(summary) if summary.due > 0 => {
                            info!(
                                due = summary.due,
                                started = summary.started,
                                skipped = summary.overlap_skipped,
                                errors = summary.errors,
                                "Scheduler tick complete"
                            );
                        }
                        Ok(_) => {}
                        // Loading due jobs failed; nothing was mutated,
                        // the next tick retries from scratch.
                        Err(e) => error!("Scheduler tick error: {}", e),
                    }
                }
            }
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run a single evaluation tick at `now`.
    ///
    /// Public so tests (and manual operations) can drive the scheduler
    /// without a timer.
    pub async fn tick_once(&self, now: DateTime<Utc>) -> SchedulerResult<TickSummary> {
        let due_jobs = self.store.jobs().list_due(now).await?;
        let mut summary = TickSummary {
            due: due_jobs.len(),
            ..TickSummary::default()
        };
        counter!("reel_scheduler_ticks_total").increment(1);

        for job in due_jobs {
            let outcome = self.run_job(&job, now).await;

            // The schedule advances no matter what happened, so one bad
            // occurrence cannot pin the job to the same due time.
            let next_run = self.next_run(&job, now);
            let updated = match &outcome {
                Ok(JobOutcome::Started(_)) => job.clone().record_run(now, next_run),
                _ => job.clone().reschedule(next_run),
            };
            if let Err(e) = self.store.jobs().update(&updated).await {
                error!(job_id = %job.id, "Failed to persist job schedule: {}", e);
            }

            match outcome {
                Ok(JobOutcome::Started(project_id)) => {
                    info!(job_id = %job.id, project_id = %project_id, "Scheduled project started");
                    summary.started += 1;
                }
                Ok(JobOutcome::OverlapSkipped) => {
                    // Not an error: logged no-op, the occurrence is dropped
                    info!(
                        job_id = %job.id,
                        name = %job.name,
                        "Previous run still in flight, skipping this occurrence"
                    );
                    counter!("reel_scheduler_overlap_skipped_total").increment(1);
                    summary.overlap_skipped += 1;
                }
                Err(e) => {
                    // Isolated: other jobs in this tick are unaffected
                    error!(job_id = %job.id, name = %job.name, "Job occurrence failed: {}", e);
                    summary.errors += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Execute one due job: overlap guard, then create and start a project
    /// seeded from the job's parameters.
    async fn run_job(&self, job: &ScheduledJob, now: DateTime<Utc>) -> SchedulerResult<JobOutcome> {
        if self
            .store
            .projects()
            .find_active_for_job(&job.id)
            .await?
            .is_some()
        {
            return Ok(JobOutcome::OverlapSkipped);
        }

        let project = self
            .orchestrator
            .create_project(NewProject {
                title: format!("{} {}", job.name, now.format("%Y-%m-%d %H:%M")),
                script_prompt: format!(
                    "Create a short-form video about {}",
                    job.topic_category
                ),
                category: Some(job.topic_category.clone()),
                auto_upload: job.auto_upload,
                video_format: job.video_format,
                job_id: Some(job.id.clone()),
            })
            .await?;

        self.orchestrator.start(project.id.clone());
        Ok(JobOutcome::Started(project.id))
    }

    /// Next due time for a job, relative to `now`.
    ///
    /// A stored expression that no longer parses (or never matches) leaves
    /// `next_run_at` empty: the job stops firing but stays enabled, and is
    /// never auto-disabled.
    fn next_run(&self, job: &ScheduledJob, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match CronExpression::parse(&job.cron_expression) {
            Ok(cron) => {
                let next = cron.next_after(now);
                if next.is_none() {
                    warn!(job_id = %job.id, "Cron expression never matches, job will not fire");
                }
                next
            }
            Err(e) => {
                warn!(job_id = %job.id, "Stored cron expression is invalid: {}", e);
                None
            }
        }
    }
}
