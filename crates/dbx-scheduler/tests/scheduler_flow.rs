//! End-to-end scheduler behavior against a real schedule file.

use std::path::Path;
use std::sync::Arc;

use dbx_backup::{keys, BackupKind, BackupOptions, Params, VendorBackupRunner};
use dbx_cloud::CliUploader;
use dbx_config::{CloudConfig, CorruptStatePolicy, SchedulerConfig};
use dbx_scheduler::{Job, JobDispatcher, JobStore, Scheduler, SchedulerError, UploadStatus};
use tempfile::TempDir;

fn scheduler(schedules: &Path, out_dir: &Path, policy: CorruptStatePolicy) -> Scheduler {
    let config = SchedulerConfig {
        schedules_file: schedules.to_path_buf(),
        on_corrupt_state: policy,
        ..SchedulerConfig::default()
    };
    let dispatcher = JobDispatcher::new(
        Arc::new(VendorBackupRunner::new(BackupOptions::default())),
        Arc::new(CliUploader::default()),
        CloudConfig::default(),
        out_dir,
    );
    Scheduler::new(config, Arc::new(dispatcher))
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn sqlite_db(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"SQLite format 3\0 test pages").unwrap();
    path
}

#[tokio::test]
async fn test_jobs_of_every_kind_survive_reload() {
    let dir = TempDir::new().unwrap();
    let schedules = dir.path().join("config/schedules.json");
    let out = dir.path().join("backups");

    let first = scheduler(&schedules, &out, CorruptStatePolicy::Fail);
    let jobs = [
        (BackupKind::MySql, "0 2 * * *", params(&[("dbname", "shop"), ("user", "root")])),
        (BackupKind::Postgres, "30 1 * * 1-5", params(&[("dbname", "crm"), ("port", "5433")])),
        (BackupKind::MongoDb, "@weekly", params(&[("dbname", "events")])),
        (BackupKind::Sqlite, "@daily", params(&[("path", "app.db")])),
    ];
    for (kind, schedule, params) in jobs.clone() {
        first.register_job(kind, schedule, params).await.unwrap();
    }
    let before = first.list_jobs().await.unwrap();
    first.shutdown();

    let second = scheduler(&schedules, &out, CorruptStatePolicy::Fail);
    let after = second.list_jobs().await.unwrap();
    assert_eq!(before, after);
    assert_eq!(after.len(), 4);
    for (job, (kind, schedule, params)) in after.iter().zip(jobs) {
        assert_eq!(job.kind, kind);
        assert_eq!(job.schedule, schedule);
        assert_eq!(job.params, params);
        assert!(second.next_fire(job.id).await.is_some());
    }
    second.shutdown();
}

#[tokio::test]
async fn test_invalid_cron_leaves_jobs_unchanged() {
    let dir = TempDir::new().unwrap();
    let schedules = dir.path().join("schedules.json");
    let sched = scheduler(&schedules, dir.path(), CorruptStatePolicy::Fail);
    sched
        .register_job(BackupKind::Sqlite, "@hourly", params(&[("path", "a.db")]))
        .await
        .unwrap();
    let on_disk = std::fs::read_to_string(&schedules).unwrap();

    for bad in ["", "61 * * * *", "* * *", "@every 1h"] {
        let err = sched
            .register_job(BackupKind::Sqlite, bad, params(&[("path", "b.db")]))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSchedule { .. }), "{bad}");
    }
    assert_eq!(sched.list_jobs().await.unwrap().len(), 1);
    assert_eq!(std::fs::read_to_string(&schedules).unwrap(), on_disk);
    sched.shutdown();
}

#[tokio::test]
async fn test_corrupt_schedule_file_policies() {
    let dir = TempDir::new().unwrap();
    let schedules = dir.path().join("schedules.json");
    std::fs::write(&schedules, "not json at all").unwrap();

    let strict = scheduler(&schedules, dir.path(), CorruptStatePolicy::Fail);
    assert!(matches!(
        strict.init().await,
        Err(SchedulerError::CorruptState { .. })
    ));

    let lenient = scheduler(&schedules, dir.path(), CorruptStatePolicy::Discard);
    assert!(lenient.list_jobs().await.unwrap().is_empty());
    let id = lenient
        .register_job(BackupKind::Sqlite, "@daily", params(&[("path", "a.db")]))
        .await
        .unwrap();
    lenient.shutdown();

    let store = JobStore::load(&schedules, CorruptStatePolicy::Fail).await.unwrap();
    let ids: Vec<_> = store.list().await.iter().map(|j: &Job| j.id).collect();
    assert_eq!(ids, vec![id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_are_all_persisted() {
    let dir = TempDir::new().unwrap();
    let schedules = dir.path().join("schedules.json");
    let sched = Arc::new(scheduler(&schedules, dir.path(), CorruptStatePolicy::Fail));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let sched = sched.clone();
            tokio::spawn(async move {
                sched
                    .register_job(
                        BackupKind::MySql,
                        "0 3 * * *",
                        params(&[("dbname", format!("db{i}").as_str())]),
                    )
                    .await
            })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 16);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&schedules).unwrap()).unwrap();
    assert_eq!(raw.as_array().unwrap().len(), 16);
    sched.shutdown();
}

#[tokio::test]
async fn test_triggered_sqlite_job_writes_artifact() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(dir.path(), "inventory.db");
    let out = dir.path().join("backups");
    let sched = scheduler(&dir.path().join("schedules.json"), &out, CorruptStatePolicy::Fail);

    let id = sched
        .register_job(
            BackupKind::Sqlite,
            "@daily",
            params(&[(keys::PATH, db.to_str().unwrap())]),
        )
        .await
        .unwrap();
    let report = sched.trigger(id).await.unwrap();
    assert!(report.backup_succeeded(), "{:?}", report.backup.error);
    assert_eq!(report.upload, UploadStatus::NotRequested);

    let artifact = report.artifact.unwrap();
    assert!(artifact.starts_with(&out));
    let name = artifact.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("inventory_"), "{name}");
    assert!(std::fs::metadata(&artifact).unwrap().len() > 0);
    sched.shutdown();
}

#[tokio::test]
async fn test_missing_bucket_fails_upload_but_not_backup() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(dir.path(), "ledger.db");
    let out = dir.path().join("backups");
    let sched = scheduler(&dir.path().join("schedules.json"), &out, CorruptStatePolicy::Fail);

    let id = sched
        .register_job(
            BackupKind::Sqlite,
            "@daily",
            params(&[
                (keys::PATH, db.to_str().unwrap()),
                (keys::UPLOAD_CLOUD, "true"),
                (keys::CLOUD_PROVIDER, "s3"),
            ]),
        )
        .await
        .unwrap();
    let report = sched.trigger(id).await.unwrap();

    assert!(report.backup_succeeded());
    assert!(report.artifact.is_some());
    match report.upload {
        UploadStatus::Failed { error } => assert!(error.contains("S3 bucket name required")),
        other => panic!("unexpected upload status: {other:?}"),
    }
    sched.shutdown();
}

#[tokio::test]
async fn test_explicit_and_implicit_init_agree() {
    let dir = TempDir::new().unwrap();
    let schedules = dir.path().join("schedules.json");
    let seed = scheduler(&schedules, dir.path(), CorruptStatePolicy::Fail);
    for name in ["a.db", "b.db"] {
        seed.register_job(BackupKind::Sqlite, "*/5 * * * *", params(&[("path", name)]))
            .await
            .unwrap();
    }
    seed.shutdown();

    let explicit = scheduler(&schedules, dir.path(), CorruptStatePolicy::Fail);
    explicit.init().await.unwrap();
    explicit.init().await.unwrap();
    let implicit = scheduler(&schedules, dir.path(), CorruptStatePolicy::Fail);

    let a = explicit.list_jobs().await.unwrap();
    let b = implicit.list_jobs().await.unwrap();
    assert_eq!(a, b);
    for job in &a {
        assert!(explicit.next_fire(job.id).await.is_some());
        assert!(implicit.next_fire(job.id).await.is_some());
    }
    explicit.shutdown();
    implicit.shutdown();
}
