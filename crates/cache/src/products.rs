//! Cache-aside wrapper around [`ProductService`].

use std::sync::Arc;
use std::time::Duration;

use common::{CategoryId, ProductId};
use domain::{CreateProduct, ProductService, ProductView, Result, UpdateProduct};
use store::Store;

use crate::service::{CacheService, invalidate, lookup, populate};

const ITEM_TTL: Duration = Duration::from_secs(10 * 60);
const LIST_TTL: Duration = Duration::from_secs(5 * 60);

pub(crate) const ALL_KEY: &str = "products:all";
pub(crate) const ACTIVE_KEY: &str = "products:active";
pub(crate) const CATEGORY_PATTERN: &str = "products:category:*";

pub(crate) fn product_key(id: ProductId) -> String {
    format!("product:{id}")
}

fn sku_key(sku: &str) -> String {
    format!("product:sku:{}", sku.trim().to_uppercase())
}

fn category_key(id: CategoryId) -> String {
    format!("products:category:{id}")
}

/// Keys holding a product or any listing it can appear in.
pub(crate) fn product_keys(id: ProductId) -> Vec<String> {
    vec![
        product_key(id),
        ALL_KEY.to_string(),
        ACTIVE_KEY.to_string(),
        CATEGORY_PATTERN.to_string(),
    ]
}

/// Serves catalog reads from the cache and invalidates on writes.
/// Searches always go to the store.
#[derive(Clone)]
pub struct CachedProductService<S: Store> {
    inner: ProductService<S>,
    cache: Arc<dyn CacheService>,
}

impl<S: Store> CachedProductService<S> {
    pub fn new(inner: ProductService<S>, cache: Arc<dyn CacheService>) -> Self {
        Self { inner, cache }
    }

    async fn forget(&self, product: &ProductView) {
        let mut keys = product_keys(product.id);
        keys.push(sku_key(&product.sku));
        invalidate(self.cache.as_ref(), &keys).await;
    }

    pub async fn create_product(&self, cmd: CreateProduct) -> Result<ProductView> {
        let product = self.inner.create_product(cmd).await?;
        self.forget(&product).await;
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<ProductView>> {
        let key = product_key(id);
        if let Some(product) = lookup(self.cache.as_ref(), "product", &key).await {
            return Ok(Some(product));
        }
        let product = self.inner.get_product(id).await?;
        if let Some(ref p) = product {
            populate(self.cache.as_ref(), &key, p, ITEM_TTL).await;
        }
        Ok(product)
    }

    pub async fn get_product_by_sku(&self, sku: &str) -> Result<Option<ProductView>> {
        let key = sku_key(sku);
        if let Some(product) = lookup(self.cache.as_ref(), "product", &key).await {
            return Ok(Some(product));
        }
        let product = self.inner.get_product_by_sku(sku).await?;
        if let Some(ref p) = product {
            populate(self.cache.as_ref(), &key, p, ITEM_TTL).await;
        }
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<ProductView>> {
        if let Some(products) = lookup(self.cache.as_ref(), "products", ALL_KEY).await {
            return Ok(products);
        }
        let products = self.inner.list_products().await?;
        populate(self.cache.as_ref(), ALL_KEY, &products, LIST_TTL).await;
        Ok(products)
    }

    pub async fn active_products(&self) -> Result<Vec<ProductView>> {
        if let Some(products) = lookup(self.cache.as_ref(), "products", ACTIVE_KEY).await {
            return Ok(products);
        }
        let products = self.inner.active_products().await?;
        populate(self.cache.as_ref(), ACTIVE_KEY, &products, LIST_TTL).await;
        Ok(products)
    }

    pub async fn products_by_category(&self, category_id: CategoryId) -> Result<Vec<ProductView>> {
        let key = category_key(category_id);
        if let Some(products) = lookup(self.cache.as_ref(), "products", &key).await {
            return Ok(products);
        }
        let products = self.inner.products_by_category(category_id).await?;
        populate(self.cache.as_ref(), &key, &products, LIST_TTL).await;
        Ok(products)
    }

    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductView>> {
        self.inner.search_products(term).await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        cmd: UpdateProduct,
    ) -> Result<Option<ProductView>> {
        // The SKU may change, so drop the old SKU entry too.
        let before = self.inner.get_product(id).await?;
        let updated = self.inner.update_product(id, cmd).await?;
        if let Some(ref old) = before {
            self.forget(old).await;
        }
        if let Some(ref new) = updated {
            self.forget(new).await;
        }
        Ok(updated)
    }

    pub async fn update_stock(&self, id: ProductId, quantity: u32) -> Result<Option<ProductView>> {
        let updated = self.inner.update_stock(id, quantity).await?;
        if let Some(ref product) = updated {
            self.forget(product).await;
        }
        Ok(updated)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let before = self.inner.get_product(id).await?;
        let deleted = self.inner.delete_product(id).await?;
        match before {
            Some(ref product) if deleted => self.forget(product).await,
            _ => {}
        }
        Ok(deleted)
    }
}
