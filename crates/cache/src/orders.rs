//! Order service wrapper that keeps product and cart entries fresh.

use std::sync::Arc;

use common::{OrderId, OrderStatus};
use domain::{CreateOrder, OrderService, OrderView, Result};
use store::Store;

use crate::carts::cart_keys;
use crate::products::product_keys;
use crate::service::{CacheService, invalidate};

/// Orders are never cached. Placing or cancelling an order changes stock and
/// carts, so the affected entries are dropped afterwards.
#[derive(Clone)]
pub struct CachedOrderService<S: Store> {
    inner: OrderService<S>,
    cache: Arc<dyn CacheService>,
}

impl<S: Store> CachedOrderService<S> {
    pub fn new(inner: OrderService<S>, cache: Arc<dyn CacheService>) -> Self {
        Self { inner, cache }
    }

    /// The undecorated service, for reads.
    pub fn inner(&self) -> &OrderService<S> {
        &self.inner
    }

    async fn forget_products(&self, order: &OrderView) {
        let mut keys: Vec<String> = order
            .items
            .iter()
            .flat_map(|item| product_keys(item.product_id))
            .collect();
        keys.sort();
        keys.dedup();
        // SKU entries carry stock too.
        keys.push("product:sku:*".to_string());
        invalidate(self.cache.as_ref(), &keys).await;
    }

    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderView> {
        let cart_id = cmd.cart_id;
        let customer_id = cmd.customer_id;
        let order = self.inner.create_order(cmd).await?;
        self.forget_products(&order).await;
        invalidate(self.cache.as_ref(), &cart_keys(cart_id, customer_id)).await;
        Ok(order)
    }

    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderView> {
        let order = self.inner.update_order_status(id, status).await?;
        if order.status == OrderStatus::Cancelled {
            self.forget_products(&order).await;
        }
        Ok(order)
    }

    pub async fn cancel_order(&self, id: OrderId) -> Result<bool> {
        let cancelled = self.inner.cancel_order(id).await?;
        if cancelled && let Some(order) = self.inner.get_order(id).await? {
            self.forget_products(&order).await;
        }
        Ok(cancelled)
    }
}
