//! Payments recorded against orders.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderStatus, PaymentId, PaymentStatus};
use serde::{Deserialize, Serialize};
use store::{OrderRepository, PaymentRecord, PaymentRepository, Store, Transaction};

use crate::error::{DomainError, Result};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPayment {
    pub order_id: OrderId,
    pub payment_method: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub payment_method: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PaymentRecord> for PaymentView {
    fn from(p: PaymentRecord) -> Self {
        Self {
            id: p.id,
            order_id: p.order_id,
            payment_method: p.payment_method,
            amount_cents: p.amount.cents(),
            status: p.status,
            transaction_id: p.transaction_id,
            gateway_response: p.gateway_response,
            processed_at: p.processed_at,
            payment_date: p.payment_date,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Service for recording and settling payments.
#[derive(Clone)]
pub struct PaymentService<S: Store> {
    store: S,
}

impl<S: Store> PaymentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a pending payment for an order. An order has at most one payment.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn process_payment(&self, cmd: RecordPayment) -> Result<PaymentView> {
        let payment_method = validation::payment_method(&cmd.payment_method)?;
        let amount = Money::from_cents(cmd.amount_cents);
        if !amount.is_positive() {
            return Err(DomainError::rule("Payment amount must be greater than zero"));
        }
        let transaction_id = validation::optional(
            "Transaction id",
            cmd.transaction_id.as_deref(),
            validation::MAX_TRANSACTION_ID_LENGTH,
        )?;

        let mut tx = self.store.begin().await?;
        let order = tx
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", cmd.order_id))?;
        if matches!(order.status, OrderStatus::Cancelled | OrderStatus::Refunded) {
            return Err(DomainError::rule(format!(
                "Cannot record a payment for a {} order",
                order.status
            )));
        }
        if tx.payment_for_order(order.id).await?.is_some() {
            return Err(DomainError::rule(format!(
                "Order {} already has a payment",
                order.order_number
            )));
        }
        if let Some(ref txn) = transaction_id
            && tx.find_payment_by_transaction_id(txn).await?.is_some()
        {
            return Err(DomainError::rule(format!(
                "Transaction {txn} has already been recorded"
            )));
        }

        let now = Utc::now();
        let record = PaymentRecord {
            id: PaymentId::new(),
            order_id: order.id,
            payment_method,
            amount,
            status: PaymentStatus::Pending,
            transaction_id,
            gateway_response: None,
            processed_at: None,
            payment_date: now,
            created_at: now,
            updated_at: None,
        };
        tx.insert_payment(&record).await?;
        tx.commit().await?;

        tracing::info!(payment_id = %record.id, %amount, "payment recorded");
        Ok(record.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_payment(&self, id: PaymentId) -> Result<Option<PaymentView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.get_payment(id).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn payment_for_order(&self, order_id: OrderId) -> Result<Option<PaymentView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.payment_for_order(order_id).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn payments_by_status(&self, status: PaymentStatus) -> Result<Vec<PaymentView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx
            .payments_by_status(status)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Pending payments recorded more than `age` ago, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn stale_pending_payments(&self, age: chrono::Duration) -> Result<Vec<PaymentView>> {
        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .ok_or_else(|| DomainError::validation("Payment age is out of range"))?;
        let mut tx = self.store.begin().await?;
        Ok(tx
            .pending_payments_before(cutoff)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Changes the status of a payment.
    ///
    /// Completing a payment moves a pending order to `Processing`. Refunds go
    /// through [`PaymentService::refund_payment`].
    #[tracing::instrument(skip(self, gateway_response))]
    pub async fn update_payment_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        gateway_response: Option<String>,
    ) -> Result<PaymentView> {
        if status == PaymentStatus::Refunded {
            return Err(DomainError::rule(
                "Refunds must be issued through the refund operation",
            ));
        }

        let mut tx = self.store.begin().await?;
        let mut payment = tx
            .get_payment(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", id))?;
        if matches!(
            payment.status,
            PaymentStatus::Refunded | PaymentStatus::Cancelled
        ) {
            return Err(DomainError::rule(format!(
                "Payment is already {}",
                payment.status
            )));
        }

        let now = Utc::now();
        let previous = payment.status;
        payment.status = status;
        if gateway_response.is_some() {
            payment.gateway_response = gateway_response;
        }
        if matches!(status, PaymentStatus::Completed | PaymentStatus::Failed) {
            payment.processed_at = Some(now);
        }
        payment.updated_at = Some(now);
        tx.update_payment(&payment).await?;

        if status == PaymentStatus::Completed
            && let Some(mut order) = tx.get_order(payment.order_id).await?
            && order.status == OrderStatus::Pending
        {
            order.status = OrderStatus::Processing;
            order.updated_at = Some(now);
            tx.update_order_header(&order).await?;
            tracing::info!(order_id = %order.id, "order moved to processing after payment");
        }
        tx.commit().await?;

        tracing::info!(payment_id = %id, %previous, %status, "payment status changed");
        Ok(payment.into())
    }

    /// Refunds a completed payment and marks its order as refunded.
    #[tracing::instrument(skip(self))]
    pub async fn refund_payment(&self, id: PaymentId) -> Result<PaymentView> {
        let mut tx = self.store.begin().await?;
        let mut payment = tx
            .get_payment(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", id))?;
        if payment.status != PaymentStatus::Completed {
            return Err(DomainError::rule("Only completed payments can be refunded"));
        }
        let mut order = tx
            .get_order(payment.order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", payment.order_id))?;
        if !order.status.can_refund() {
            return Err(DomainError::rule(format!(
                "Cannot refund an order that is {}",
                order.status
            )));
        }

        let now = Utc::now();
        payment.status = PaymentStatus::Refunded;
        payment.updated_at = Some(now);
        tx.update_payment(&payment).await?;

        order.status = OrderStatus::Refunded;
        order.updated_at = Some(now);
        tx.update_order_header(&order).await?;
        tx.commit().await?;

        metrics::counter!("payments_refunded_total").increment(1);
        tracing::info!(payment_id = %id, order_id = %order.id, "payment refunded");
        Ok(payment.into())
    }

    /// True when the order's payment is completed and covers the order total.
    #[tracing::instrument(skip(self))]
    pub async fn is_payment_complete(&self, order_id: OrderId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;
        Ok(tx
            .payment_for_order(order_id)
            .await?
            .is_some_and(|p| p.status == PaymentStatus::Completed && p.amount >= order.total_amount))
    }

    /// Amount settled for an order by completed payments.
    #[tracing::instrument(skip(self))]
    pub async fn total_paid(&self, order_id: OrderId) -> Result<Money> {
        let mut tx = self.store.begin().await?;
        Ok(tx
            .payment_for_order(order_id)
            .await?
            .filter(|p| p.status == PaymentStatus::Completed)
            .map_or(Money::zero(), |p| p.amount))
    }
}
