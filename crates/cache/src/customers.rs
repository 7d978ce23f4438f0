//! Customer service wrapper that drops a deleted customer's cart entries.

use std::sync::Arc;

use common::CustomerId;
use domain::{CustomerService, Result};
use store::Store;

use crate::carts::CART_PATTERN;
use crate::service::{CacheService, invalidate};

/// Customers are never cached. Deleting one removes their carts in the
/// store, so cached carts are dropped with it.
#[derive(Clone)]
pub struct CachedCustomerService<S: Store> {
    inner: CustomerService<S>,
    cache: Arc<dyn CacheService>,
}

impl<S: Store> CachedCustomerService<S> {
    pub fn new(inner: CustomerService<S>, cache: Arc<dyn CacheService>) -> Self {
        Self { inner, cache }
    }

    /// The undecorated service, for everything but deletion.
    pub fn inner(&self) -> &CustomerService<S> {
        &self.inner
    }

    pub async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        let deleted = self.inner.delete_customer(id).await?;
        if deleted {
            // The cart id is gone with the row, so drop every cart entry.
            invalidate(self.cache.as_ref(), &[CART_PATTERN.to_string()]).await;
        }
        Ok(deleted)
    }
}
