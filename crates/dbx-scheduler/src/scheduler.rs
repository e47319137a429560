//! The process-wide scheduler handle.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use dbx_backup::{BackupKind, Params};
use dbx_config::SchedulerConfig;

use crate::dispatcher::{DispatchReport, JobDispatcher};
use crate::engine::{JobCallback, ScheduleEngine};
use crate::error::SchedulerError;
use crate::job::{Job, JobId};
use crate::schedule::CronSchedule;
use crate::store::JobStore;

struct State {
    store: JobStore,
    engine: ScheduleEngine,
}

/// Owns the job store and the schedule engine.
///
/// Initialization happens once, either through an explicit [`init`] call or
/// implicitly on first use; both paths load the schedule file, register
/// every stored job and start the engine.
///
/// [`init`]: Scheduler::init
pub struct Scheduler {
    config: SchedulerConfig,
    dispatcher: Arc<JobDispatcher>,
    state: OnceCell<State>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, dispatcher: Arc<JobDispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            state: OnceCell::new(),
        }
    }

    /// Load persisted jobs and start firing. Safe to call more than once.
    pub async fn init(&self) -> Result<(), SchedulerError> {
        self.state().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    async fn state(&self) -> Result<&State, SchedulerError> {
        self.state.get_or_try_init(|| self.bootstrap()).await
    }

    async fn bootstrap(&self) -> Result<State, SchedulerError> {
        let store =
            JobStore::load(&self.config.schedules_file, self.config.on_corrupt_state).await?;
        let engine = ScheduleEngine::new(self.config.overlap);

        let mut jobs = store.list().await;
        if let Some(max) = jobs.iter().map(|j| j.id).max() {
            engine.reserve_ids(max);
        }

        let mut seen = HashSet::new();
        let mut reassigned = false;
        for job in &mut jobs {
            let callback = job_callback(self.dispatcher.clone(), job);
            let kept = if seen.contains(&job.id) {
                Ok(None)
            } else {
                engine.register_with_id(job.id, &job.schedule, callback.clone())
            };
            let registered = match kept {
                Ok(Some(id)) => Ok(id),
                Ok(None) => engine.register(&job.schedule, callback),
                Err(e) => Err(e),
            };
            match registered {
                Ok(id) => {
                    if id != job.id {
                        warn!("Duplicate job id {} in schedule file, reassigned to {}", job.id, id);
                        job.id = id;
                        reassigned = true;
                    }
                    seen.insert(id);
                }
                Err(e) => {
                    warn!("Job {} not scheduled: {}", job.id, e);
                    seen.insert(job.id);
                }
            }
        }
        if reassigned {
            store.replace_all(jobs).await?;
        }

        engine.start();
        info!(
            "Scheduler initialized with {} jobs from {}",
            engine.len(),
            store.path().display()
        );
        Ok(State { store, engine })
    }

    /// Register and persist a recurring backup.
    ///
    /// An invalid cron expression is rejected before anything changes. If
    /// the schedule file cannot be written the job stays registered in
    /// memory and the write error is returned.
    pub async fn register_job(
        &self,
        kind: BackupKind,
        schedule: &str,
        params: Params,
    ) -> Result<JobId, SchedulerError> {
        CronSchedule::parse(schedule)?;
        let state = self.state().await?;

        let mut job = Job::new(0, kind, schedule.trim(), params);
        // The engine hands out the id, so register first with a callback
        // that already knows the job's kind and parameters.
        let id = state
            .engine
            .register(&job.schedule, job_callback(self.dispatcher.clone(), &job))?;
        job.id = id;

        info!("Registered {} backup job {} ({})", kind, id, job.schedule);
        state.store.add(job).await?;
        Ok(id)
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, SchedulerError> {
        Ok(self.state().await?.store.list().await)
    }

    /// Unschedule and forget a job.
    ///
    /// The file is rewritten first. If that fails the job stays listed and
    /// keeps firing.
    pub async fn remove(&self, id: JobId) -> Result<Job, SchedulerError> {
        let state = self.state().await?;
        let job = state.store.remove(id).await?;
        state.engine.remove(id);
        info!("Removed job {}", id);
        Ok(job)
    }

    /// Run one firing of a job now and wait for it.
    pub async fn trigger(&self, id: JobId) -> Result<DispatchReport, SchedulerError> {
        let state = self.state().await?;
        let job = state
            .store
            .get(id)
            .await
            .ok_or(SchedulerError::JobNotFound(id))?;
        info!("Triggering job {} ({} backup)", id, job.kind);
        Ok(self.dispatcher.dispatch(job.kind, &job.params).await)
    }

    /// Next scheduled fire time of a job, if it is scheduled.
    pub async fn next_fire(&self, id: JobId) -> Option<DateTime<Local>> {
        self.state.get()?.engine.next_fire(id)
    }

    /// Stop the engine. Firings in progress finish on their own.
    pub fn shutdown(&self) {
        if let Some(state) = self.state.get() {
            state.engine.shutdown();
        }
    }
}

fn job_callback(dispatcher: Arc<JobDispatcher>, job: &Job) -> JobCallback {
    let kind = job.kind;
    let params = Arc::new(job.params.clone());
    Arc::new(move || {
        let dispatcher = dispatcher.clone();
        let params = params.clone();
        Box::pin(async move {
            info!("Running scheduled {} backup", kind);
            dispatcher.dispatch(kind, &params).await;
        })
    })
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
