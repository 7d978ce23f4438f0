//! Cache-aside wrapper around [`ShoppingCartService`].

use std::sync::Arc;
use std::time::Duration;

use common::{CartId, CartItemId, CustomerId};
use domain::{AddCartItem, CartView, Result, ShoppingCartService};
use store::Store;

use crate::service::{CacheService, invalidate, lookup, populate};

const CART_TTL: Duration = Duration::from_secs(15 * 60);

pub(crate) const CART_PATTERN: &str = "cart:*";

fn cart_key(id: CartId) -> String {
    format!("cart:{id}")
}

fn customer_cart_key(id: CustomerId) -> String {
    format!("cart:customer:{id}")
}

/// Keys under which a cart may be cached.
pub(crate) fn cart_keys(cart_id: CartId, customer_id: CustomerId) -> Vec<String> {
    vec![cart_key(cart_id), customer_cart_key(customer_id)]
}

#[derive(Clone)]
pub struct CachedShoppingCartService<S: Store> {
    inner: ShoppingCartService<S>,
    cache: Arc<dyn CacheService>,
}

impl<S: Store> CachedShoppingCartService<S> {
    pub fn new(inner: ShoppingCartService<S>, cache: Arc<dyn CacheService>) -> Self {
        Self { inner, cache }
    }

    async fn forget(&self, cart: &CartView) {
        invalidate(self.cache.as_ref(), &cart_keys(cart.id, cart.customer_id)).await;
    }

    pub async fn get_or_create_cart(&self, customer_id: CustomerId) -> Result<CartView> {
        let key = customer_cart_key(customer_id);
        if let Some(cart) = lookup(self.cache.as_ref(), "cart", &key).await {
            return Ok(cart);
        }
        let cart = self.inner.get_or_create_cart(customer_id).await?;
        populate(self.cache.as_ref(), &key, &cart, CART_TTL).await;
        Ok(cart)
    }

    pub async fn get_cart(&self, cart_id: CartId) -> Result<Option<CartView>> {
        let key = cart_key(cart_id);
        if let Some(cart) = lookup(self.cache.as_ref(), "cart", &key).await {
            return Ok(Some(cart));
        }
        let cart = self.inner.get_cart(cart_id).await?;
        if let Some(ref c) = cart {
            populate(self.cache.as_ref(), &key, c, CART_TTL).await;
        }
        Ok(cart)
    }

    pub async fn add_item(&self, customer_id: CustomerId, cmd: AddCartItem) -> Result<CartView> {
        let cart = self.inner.add_item(customer_id, cmd).await?;
        self.forget(&cart).await;
        Ok(cart)
    }

    pub async fn update_item_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<CartView> {
        let cart = self
            .inner
            .update_item_quantity(cart_id, item_id, quantity)
            .await?;
        self.forget(&cart).await;
        Ok(cart)
    }

    pub async fn remove_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<CartView> {
        let cart = self.inner.remove_item(cart_id, item_id).await?;
        self.forget(&cart).await;
        Ok(cart)
    }

    pub async fn clear_cart(&self, cart_id: CartId) -> Result<bool> {
        let before = self.inner.get_cart(cart_id).await?;
        let cleared = self.inner.clear_cart(cart_id).await?;
        if let Some(ref cart) = before {
            self.forget(cart).await;
        }
        Ok(cleared)
    }

    pub async fn remove_expired_carts(&self) -> Result<u64> {
        let removed = self.inner.remove_expired_carts().await?;
        if removed > 0 {
            invalidate(self.cache.as_ref(), &[CART_PATTERN.to_string()]).await;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryCache;
    use domain::{CreateCustomer, CreateProduct, CustomerService, ProductService};
    use store::InMemoryStore;

    #[tokio::test]
    async fn test_mutation_invalidates_customer_cart() {
        let store = InMemoryStore::new();
        let cache = Arc::new(InMemoryCache::new(1_000));
        let carts =
            CachedShoppingCartService::new(ShoppingCartService::new(store.clone()), cache.clone());

        let customer = CustomerService::new(store.clone())
            .create_customer(CreateCustomer {
                email: "cached@example.com".to_string(),
                first_name: "Cache".to_string(),
                last_name: "Aside".to_string(),
                phone: None,
                date_of_birth: None,
            })
            .await
            .unwrap();
        let product = ProductService::new(store)
            .create_product(CreateProduct {
                name: "Scarf".to_string(),
                description: None,
                price_cents: 1500,
                sku: "SCARF-1".to_string(),
                stock_quantity: 4,
                category_id: None,
                image_url: None,
                weight_grams: None,
                dimensions: None,
            })
            .await
            .unwrap();

        let empty = carts.get_or_create_cart(customer.id).await.unwrap();
        assert!(empty.items.is_empty());
        assert!(cache.exists(&customer_cart_key(customer.id)).await.unwrap());

        carts
            .add_item(
                customer.id,
                AddCartItem {
                    product_id: product.id,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        assert!(!cache.exists(&customer_cart_key(customer.id)).await.unwrap());

        let cart = carts.get_or_create_cart(customer.id).await.unwrap();
        assert_eq!(cart.items.len(), 1);
    }
}
