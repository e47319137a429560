//! # dbx Scheduler
//!
//! Recurring backups: a persisted job list, a cron engine that fires each
//! job on its own task, and the dispatcher that runs the backup and the
//! optional cloud upload.
//!
//! ```text
//! Scheduler::register_job ─> ScheduleEngine (id, timer) ─> JobStore (schedules.json)
//!                                   │ fire
//!                                   v
//!                             JobDispatcher ─> BackupRunner ─> ArtifactUploader
//! ```

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod job;
pub mod schedule;
pub mod scheduler;
pub mod store;

pub use dispatcher::{DispatchReport, JobDispatcher, UploadStatus};
pub use engine::{EntryId, JobCallback, ScheduleEngine};
pub use error::SchedulerError;
pub use job::{Job, JobId};
pub use schedule::CronSchedule;
pub use scheduler::Scheduler;
pub use store::JobStore;
