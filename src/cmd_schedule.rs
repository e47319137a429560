//! Schedule subcommand handlers for dbx.

use tracing::info;

use dbx_backup::{keys, BackupKind, Params};
use dbx_scheduler::Scheduler;

use crate::cli::{backup_params, ScheduleAction};
use crate::cmd_db::print_dispatch;

/// Handle schedule subcommands.
pub(crate) async fn handle_schedule_command(
    scheduler: &Scheduler,
    action: ScheduleAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = match action {
        ScheduleAction::Add { kind, cron, conn, mode, out, upload } => {
            let params = backup_params(&conn, mode, out.as_ref(), &upload);
            schedule_add(scheduler, kind, &cron, params).await
        }
        ScheduleAction::List { format } => schedule_list(scheduler, &format).await,
        ScheduleAction::Remove { id } => {
            let job = scheduler.remove(id).await?;
            println!("Removed job {} ({} backup, {})", job.id, job.kind, job.schedule);
            Ok(())
        }
        ScheduleAction::Run => schedule_run(scheduler).await,
        ScheduleAction::Trigger { id } => {
            let report = scheduler.trigger(id).await?;
            print_dispatch(&report);
            Ok(())
        }
    };
    scheduler.shutdown();
    result
}

async fn schedule_add(
    scheduler: &Scheduler,
    kind: BackupKind,
    cron: &str,
    params: Params,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = scheduler.register_job(kind, cron, params).await?;
    println!("Scheduled {} backup as job {} ({})", kind, id, cron.trim());
    if let Some(next) = scheduler.next_fire(id).await {
        println!("Next run: {}", next.format("%Y-%m-%d %H:%M:%S %Z"));
    }
    Ok(())
}

async fn schedule_list(
    scheduler: &Scheduler,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let jobs = scheduler.list_jobs().await?;
    if jobs.is_empty() {
        println!("No scheduled jobs.");
        return Ok(());
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&jobs)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<6} {:<10} {:<20} {:<22} {}", "ID", "KIND", "SCHEDULE", "NEXT RUN", "TARGET");
            println!("{}", "-".repeat(80));
            for job in jobs {
                let next = scheduler
                    .next_fire(job.id)
                    .await
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let target = job
                    .params
                    .get(keys::DBNAME)
                    .or_else(|| job.params.get(keys::PATH))
                    .map(String::as_str)
                    .unwrap_or("-");
                println!(
                    "{:<6} {:<10} {:<20} {:<22} {}",
                    job.id,
                    job.kind.as_str(),
                    job.schedule,
                    next,
                    target
                );
            }
        }
    }
    Ok(())
}

/// Run every stored job on its schedule until Ctrl-C.
async fn schedule_run(scheduler: &Scheduler) -> Result<(), Box<dyn std::error::Error>> {
    scheduler.init().await?;
    let jobs = scheduler.list_jobs().await?;
    info!("Scheduler running with {} jobs, press Ctrl-C to stop", jobs.len());
    println!("Scheduler running with {} jobs. Press Ctrl-C to stop.", jobs.len());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}
