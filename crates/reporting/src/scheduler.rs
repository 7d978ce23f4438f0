//! Background job that emails last month's reports.
//!
//! Fires at 02:00 UTC on the first day of every month (`0 2 1 * *`).

use chrono::{DateTime, Utc};
use store::Store;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::report::ReportMonth;
use crate::service::ReportService;

const RUN_HOUR: i64 = 2;

pub struct MonthlyReportScheduler<S: Store> {
    reports: ReportService<S>,
}

impl<S: Store> MonthlyReportScheduler<S> {
    pub fn new(reports: ReportService<S>) -> Self {
        Self { reports }
    }

    /// First scheduled run strictly after `now`.
    pub fn next_run(now: DateTime<Utc>) -> DateTime<Utc> {
        let month = ReportMonth::containing(now);
        let this_month = month.start() + chrono::Duration::hours(RUN_HOUR);
        if this_month > now {
            this_month
        } else {
            month.succ().start() + chrono::Duration::hours(RUN_HOUR)
        }
    }

    /// Runs the job until `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = Self::next_run(now);
                let wait = (next - now).to_std().unwrap_or_default();
                tracing::info!(next_run = %next, "monthly report job scheduled");

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let month = ReportMonth::previous(Utc::now());
                match self.reports.send_bulk_monthly_reports(month).await {
                    Ok(summary) => tracing::info!(%month, ?summary, "monthly report job completed"),
                    Err(e) => tracing::error!(%month, error = %e, "monthly report job failed"),
                }
            }
            tracing::info!("monthly report job stopped");
        })
    }
}
