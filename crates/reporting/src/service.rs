//! Report generation and bulk delivery.

use std::sync::Arc;

use common::CustomerId;
use domain::{CustomerService, OrderService};
use futures_util::StreamExt;
use serde::Serialize;
use store::Store;

use crate::error::Result;
use crate::mail::Mailer;
use crate::report::{MonthlyReport, ReportMonth};

/// Customers processed at once during a bulk run.
pub const BULK_CONCURRENCY: usize = 10;

/// Outcome of a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReportSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ReportService<S: Store> {
    customers: CustomerService<S>,
    orders: OrderService<S>,
    mailer: Arc<dyn Mailer>,
}

impl<S: Store> ReportService<S> {
    pub fn new(store: S, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            customers: CustomerService::new(store.clone()),
            orders: OrderService::new(store),
            mailer,
        }
    }

    /// Emails one customer their transaction report for `month`.
    ///
    /// Returns `Ok(false)` when the customer does not exist or placed no
    /// orders that month.
    #[tracing::instrument(skip(self), fields(month = %month))]
    pub async fn send_monthly_report(
        &self,
        customer_id: CustomerId,
        month: ReportMonth,
    ) -> Result<bool> {
        let Some(customer) = self.customers.get_customer(customer_id).await? else {
            tracing::warn!(%customer_id, "customer not found, skipping report");
            return Ok(false);
        };

        let (from, to) = month.range();
        let orders = self
            .orders
            .customer_orders_between(customer_id, from, to)
            .await?;
        if orders.is_empty() {
            tracing::info!(%customer_id, "no orders in month, skipping report");
            return Ok(false);
        }

        let report = MonthlyReport {
            customer: &customer,
            month,
            orders: &orders,
        };
        self.mailer.send(&report.to_email()).await?;

        metrics::counter!("reports_sent_total").increment(1);
        tracing::info!(%customer_id, orders = orders.len(), "monthly report sent");
        Ok(true)
    }

    /// Sends `month`'s report to every customer.
    ///
    /// A failure for one customer is logged and counted; it does not stop
    /// the run.
    #[tracing::instrument(skip(self), fields(month = %month))]
    pub async fn send_bulk_monthly_reports(&self, month: ReportMonth) -> Result<BulkReportSummary> {
        let customers = self.customers.list_customers().await?;
        tracing::info!(customers = customers.len(), "starting bulk monthly reports");

        let outcomes: Vec<_> = futures_util::stream::iter(customers)
            .map(|customer| {
                let this = self.clone();
                async move {
                    let outcome = this.send_monthly_report(customer.id, month).await;
                    (customer.id, outcome)
                }
            })
            .buffer_unordered(BULK_CONCURRENCY)
            .collect()
            .await;

        let mut summary = BulkReportSummary::default();
        for (customer_id, outcome) in outcomes {
            match outcome {
                Ok(true) => summary.sent += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    tracing::error!(%customer_id, error = %e, "monthly report failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "bulk monthly reports finished"
        );
        Ok(summary)
    }
}
