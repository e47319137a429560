//! Cron-driven schedule engine.
//!
//! Every registered entry gets its own timer task once the engine is
//! started. A timer sleeps until the entry's next fire time and then spawns
//! the callback on a fresh task, so a slow firing never delays the timer or
//! any other entry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use dbx_config::OverlapPolicy;

use crate::error::SchedulerError;
use crate::schedule::CronSchedule;

/// Identifier of a registered entry.
pub type EntryId = u64;

/// Work run at each firing.
pub type JobCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct Entry {
    id: EntryId,
    schedule: CronSchedule,
    callback: JobCallback,
    in_flight: Arc<AtomicUsize>,
    timer: Mutex<Option<AbortHandle>>,
}

impl Entry {
    fn stop_timer(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }
    }
}

/// Decrements the in-flight count when a firing ends, even by panic.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Schedules callbacks on cron expressions.
pub struct ScheduleEngine {
    entries: Mutex<BTreeMap<EntryId, Arc<Entry>>>,
    next_id: AtomicU64,
    overlap: OverlapPolicy,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl ScheduleEngine {
    pub fn new(overlap: OverlapPolicy) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            entries: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            overlap,
            started: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Parse `expr` and schedule `callback` under a fresh id.
    ///
    /// Before [`start`](Self::start) the entry is only queued.
    pub fn register(&self, expr: &str, callback: JobCallback) -> Result<EntryId, SchedulerError> {
        let schedule = CronSchedule::parse(expr)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.insert(id, schedule, callback);
        Ok(id)
    }

    /// Schedule `callback` under a known id, e.g. one read back from disk.
    ///
    /// Later [`register`](Self::register) calls never hand out `id` or any
    /// smaller id. Returns `Ok(None)` when `id` is already taken.
    pub fn register_with_id(
        &self,
        id: EntryId,
        expr: &str,
        callback: JobCallback,
    ) -> Result<Option<EntryId>, SchedulerError> {
        let schedule = CronSchedule::parse(expr)?;
        self.reserve_ids(id);
        if self.entries.lock().contains_key(&id) {
            return Ok(None);
        }
        self.insert(id, schedule, callback);
        Ok(Some(id))
    }

    /// Make sure ids up to and including `max` are never handed out.
    pub fn reserve_ids(&self, max: EntryId) {
        self.next_id.fetch_max(max.saturating_add(1), Ordering::SeqCst);
    }

    fn insert(&self, id: EntryId, schedule: CronSchedule, callback: JobCallback) {
        let entry = Arc::new(Entry {
            id,
            schedule,
            callback,
            in_flight: Arc::new(AtomicUsize::new(0)),
            timer: Mutex::new(None),
        });
        debug!("Registered entry {} ({})", id, entry.schedule.expr());
        self.entries.lock().insert(id, entry.clone());
        if self.is_running() {
            self.spawn_timer(entry);
        }
    }

    /// Begin firing. Calling it again is a no-op.
    pub fn start(&self) {
        if *self.shutdown_tx.borrow() || self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries: Vec<Arc<Entry>> = self.entries.lock().values().cloned().collect();
        info!("Schedule engine started with {} entries", entries.len());
        for entry in entries {
            self.spawn_timer(entry);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !*self.shutdown_tx.borrow()
    }

    /// Stop all timers. Firings already in progress run to completion.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        for entry in self.entries.lock().values() {
            entry.stop_timer();
        }
        info!("Schedule engine stopped");
    }

    /// Unschedule an entry. Returns whether it existed.
    pub fn remove(&self, id: EntryId) -> bool {
        match self.entries.lock().remove(&id) {
            Some(entry) => {
                entry.stop_timer();
                debug!("Removed entry {}", id);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next fire time of an entry.
    pub fn next_fire(&self, id: EntryId) -> Option<DateTime<Local>> {
        self.entries.lock().get(&id)?.schedule.next_fire()
    }

    /// Fire an entry right away, outside its schedule.
    ///
    /// Returns `Ok(false)` when the overlap policy dropped the firing.
    pub fn fire_now(&self, id: EntryId) -> Result<bool, SchedulerError> {
        let entry = self
            .entries
            .lock()
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::JobNotFound(id))?;
        Ok(fire(&entry, self.overlap))
    }

    fn spawn_timer(&self, entry: Arc<Entry>) {
        let mut shutdown = self.shutdown_tx.subscribe();
        let overlap = self.overlap;
        let timer_entry = entry.clone();

        let handle = tokio::spawn(async move {
            let entry = timer_entry;
            let mut last_fire: Option<DateTime<Local>> = None;
            loop {
                // Never look up a fire time before the one just handled, even
                // if the wall clock stepped backwards.
                let now = Local::now();
                let from = match last_fire {
                    Some(last) if last > now => last,
                    _ => now,
                };
                let Some(next) = entry.schedule.next_after(&from) else {
                    debug!("Entry {} has no future fire times", entry.id);
                    return;
                };
                let wait = (next - Local::now()).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        fire(&entry, overlap);
                        last_fire = Some(next);
                    }
                    _ = shutdown.wait_for(|stopped| *stopped) => return,
                }
            }
        });

        if let Some(old) = entry.timer.lock().replace(handle.abort_handle()) {
            old.abort();
        }
    }
}

/// Spawn one firing of `entry`. Returns false if the overlap policy skipped it.
fn fire(entry: &Arc<Entry>, overlap: OverlapPolicy) -> bool {
    match overlap {
        OverlapPolicy::Allow => {
            entry.in_flight.fetch_add(1, Ordering::SeqCst);
        }
        OverlapPolicy::Skip => {
            if entry
                .in_flight
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                warn!("Entry {} is still running, skipping this firing", entry.id);
                return false;
            }
        }
    }

    let guard = InFlight(entry.in_flight.clone());
    let work = (entry.callback)();
    debug!("Firing entry {}", entry.id);
    tokio::spawn(async move {
        let _guard = guard;
        work.await;
    });
    true
}

impl Drop for ScheduleEngine {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().values() {
            entry.stop_timer();
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
