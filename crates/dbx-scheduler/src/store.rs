//! Job list persistence.
//!
//! The whole list is rewritten on every change: serialized to a temporary
//! sibling of the schedule file and renamed over it while the write lock is
//! held, so concurrent additions never interleave and readers of the file
//! never see a half-written list.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use dbx_config::CorruptStatePolicy;

use crate::error::SchedulerError;
use crate::job::{Job, JobId};

/// In-memory job list backed by a JSON file.
pub struct JobStore {
    path: PathBuf,
    jobs: RwLock<Vec<Job>>,
}

impl JobStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            jobs: RwLock::new(Vec::new()),
        }
    }

    /// Read the job list from `path`.
    ///
    /// A missing file yields an empty store. A file that does not parse as a
    /// list of jobs, including one with a single bad record such as an
    /// unknown `db_type`, is handled as a whole according to `policy`.
    pub async fn load(
        path: impl Into<PathBuf>,
        policy: CorruptStatePolicy,
    ) -> Result<Self, SchedulerError> {
        let path = path.into();
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No schedule file at {}, starting empty", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => return Err(SchedulerError::Read { path, source: e }),
        };

        let jobs: Vec<Job> = match serde_json::from_slice(&content) {
            Ok(jobs) => jobs,
            Err(e) => match policy {
                CorruptStatePolicy::Discard => {
                    warn!(
                        "Schedule file {} is corrupt ({}), starting with no jobs",
                        path.display(),
                        e
                    );
                    return Ok(Self::new(path));
                }
                CorruptStatePolicy::Fail => {
                    return Err(SchedulerError::CorruptState {
                        path,
                        message: e.to_string(),
                    });
                }
            },
        };
        debug!("Loaded {} jobs from {}", jobs.len(), path.display());

        Ok(Self {
            path,
            jobs: RwLock::new(jobs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `job` and rewrite the file.
    ///
    /// The job stays in memory even when the write fails.
    pub async fn add(&self, job: Job) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.write().await;
        jobs.push(job);
        self.persist(&jobs).await
    }

    /// Jobs in insertion order.
    pub async fn list(&self) -> Vec<Job> {
        self.jobs.read().await.clone()
    }

    pub async fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.read().await.iter().find(|j| j.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Remove a job and rewrite the file.
    ///
    /// Nothing changes in memory when the write fails.
    pub async fn remove(&self, id: JobId) -> Result<Job, SchedulerError> {
        let mut jobs = self.jobs.write().await;
        let index = jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or(SchedulerError::JobNotFound(id))?;
        let mut remaining = jobs.clone();
        let job = remaining.remove(index);
        self.persist(&remaining).await?;
        *jobs = remaining;
        Ok(job)
    }

    /// Swap in a new list and rewrite the file.
    pub(crate) async fn replace_all(&self, replacement: Vec<Job>) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.write().await;
        *jobs = replacement;
        self.persist(&jobs).await
    }

    async fn persist(&self, jobs: &[Job]) -> Result<(), SchedulerError> {
        let data = serde_json::to_vec_pretty(jobs)?;
        let persist_err = |source| SchedulerError::Persist {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(persist_err)?;
        }

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, &data).await.map_err(persist_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(persist_err(e));
        }

        debug!("Persisted {} jobs to {}", jobs.len(), self.path.display());
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "schedules.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
