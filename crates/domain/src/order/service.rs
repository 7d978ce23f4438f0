//! Order service.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, OrderStatus};
use store::{
    AddressRepository, CartRepository, CustomerRepository, OrderItemRecord, OrderRecord,
    OrderRepository, ProductRepository, Store, Transaction,
};

use super::{CreateOrder, OrderView, generate_order_number};
use crate::error::{DomainError, Result};
use crate::validation;

fn views(records: Vec<OrderRecord>) -> Vec<OrderView> {
    records.into_iter().map(Into::into).collect()
}

/// Service for placing and managing orders.
///
/// Placement and cancellation run inside a single store transaction, so stock
/// levels, the order and the cart change together or not at all.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order from the contents of a cart.
    ///
    /// Each line snapshots the current product price and decrements stock. The
    /// cart is emptied once the order is stored.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id, cart_id = %cmd.cart_id))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderView> {
        let notes = validation::optional(
            "Notes",
            cmd.notes.as_deref(),
            validation::MAX_ORDER_NOTES_LENGTH,
        )?;

        let mut tx = self.store.begin().await?;

        if tx.get_customer(cmd.customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", cmd.customer_id));
        }
        let payment_method = validation::payment_method(&cmd.payment_method)?;
        for (label, address_id) in [
            ("Shipping address", cmd.shipping_address_id),
            ("Billing address", cmd.billing_address_id),
        ] {
            let address = tx
                .get_address(address_id)
                .await?
                .ok_or_else(|| DomainError::not_found(label, address_id))?;
            if address.customer_id != cmd.customer_id {
                return Err(DomainError::rule(format!(
                    "{label} does not belong to the customer"
                )));
            }
        }

        let mut cart = match tx.get_cart(cmd.cart_id).await? {
            Some(cart) if cart.customer_id == cmd.customer_id && !cart.items.is_empty() => cart,
            _ => return Err(DomainError::rule("Cart is empty or not found")),
        };

        let order_number = loop {
            let candidate = generate_order_number(Utc::now());
            if !tx.order_number_exists(&candidate).await? {
                break candidate;
            }
        };

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = tx
                .get_product(line.product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Product", line.product_id))?;
            let insufficient = || DomainError::InsufficientStock {
                product: product.name.clone(),
                requested: line.quantity,
                available: product.stock_quantity,
            };
            if product.stock_quantity < line.quantity {
                return Err(insufficient());
            }
            if tx
                .adjust_stock(product.id, -i64::from(line.quantity))
                .await?
                .is_none()
            {
                return Err(insufficient());
            }

            items.push(OrderItemRecord {
                id: OrderItemId::new(),
                product_id: product.id,
                product_name: product.name.clone(),
                sku: product.sku.clone(),
                quantity: line.quantity,
                unit_price: product.price,
                total_price: product.price.multiply(line.quantity),
            });
        }

        let now = Utc::now();
        let order = OrderRecord {
            id: OrderId::new(),
            order_number,
            customer_id: cmd.customer_id,
            order_date: now,
            status: OrderStatus::Pending,
            total_amount: items.iter().map(|i| i.total_price).sum(),
            notes,
            payment_method,
            shipping_address_id: cmd.shipping_address_id,
            billing_address_id: cmd.billing_address_id,
            shipped_date: None,
            delivered_date: None,
            items,
            created_at: now,
            updated_at: None,
        };
        tx.insert_order(&order).await?;

        cart.items.clear();
        cart.updated_at = Some(now);
        tx.save_cart(&cart).await?;

        tx.commit().await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order placed"
        );
        Ok(order.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Option<OrderView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.get_order(id).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<Option<OrderView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx
            .find_order_by_number(order_number.trim())
            .await?
            .map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.list_orders().await?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn customer_orders(&self, customer_id: CustomerId) -> Result<Vec<OrderView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.orders_for_customer(customer_id).await?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<OrderView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.orders_by_status(status).await?))
    }

    /// Orders a customer placed in `[from, to)`, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn customer_orders_between(
        &self,
        customer_id: CustomerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(
            tx.orders_for_customer_between(customer_id, from, to)
                .await?,
        ))
    }

    /// Moves an order along its lifecycle.
    ///
    /// Shipping and delivery stamp their dates. Moving to `Cancelled` restores
    /// stock exactly like [`OrderService::cancel_order`].
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderView> {
        if status == OrderStatus::Cancelled {
            let mut tx = self.store.begin().await?;
            let order = tx
                .get_order(id)
                .await?
                .ok_or_else(|| DomainError::not_found("Order", id))?;
            let order = cancel_in(&mut tx, order).await?;
            tx.commit().await?;
            metrics::counter!("orders_cancelled_total").increment(1);
            return Ok(order.into());
        }

        let mut tx = self.store.begin().await?;
        let mut order = tx
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", id))?;
        if !order.status.can_transition_to(status) {
            return Err(DomainError::rule(format!(
                "Cannot change order status from {} to {}",
                order.status, status
            )));
        }

        let now = Utc::now();
        let previous = order.status;
        order.status = status;
        match status {
            OrderStatus::Shipped => order.shipped_date = Some(now),
            OrderStatus::Delivered => order.delivered_date = Some(now),
            _ => {}
        }
        order.updated_at = Some(now);
        tx.update_order_header(&order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, %previous, %status, "order status changed");
        Ok(order.into())
    }

    /// Cancels an order and restores stock. Returns `false` if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let Some(order) = tx.get_order(id).await? else {
            return Ok(false);
        };
        cancel_in(&mut tx, order).await?;
        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(true)
    }
}

/// Cancels `order` inside an open transaction.
async fn cancel_in<T: Transaction>(tx: &mut T, mut order: OrderRecord) -> Result<OrderRecord> {
    match order.status {
        OrderStatus::Shipped | OrderStatus::Delivered => {
            return Err(DomainError::rule("Cannot cancel shipped or delivered orders"));
        }
        OrderStatus::Cancelled | OrderStatus::Refunded => {
            return Err(DomainError::rule(format!(
                "Order {} is already {}",
                order.order_number, order.status
            )));
        }
        OrderStatus::Pending | OrderStatus::Processing => {}
    }

    for item in &order.items {
        if tx
            .adjust_stock(item.product_id, i64::from(item.quantity))
            .await?
            .is_none()
        {
            tracing::warn!(product_id = %item.product_id, "product missing while restoring stock");
        }
    }

    order.status = OrderStatus::Cancelled;
    order.updated_at = Some(Utc::now());
    tx.update_order_header(&order).await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, "order cancelled");
    Ok(order)
}
