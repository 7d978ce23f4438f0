//! Product catalog.

use chrono::{DateTime, Utc};
use common::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};
use store::{CategoryRepository, ProductRecord, ProductRepository, Store, Transaction};

use crate::error::{DomainError, Result};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: String,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub weight_grams: Option<u32>,
    #[serde(default)]
    pub dimensions: Option<String>,
}

/// Partial update of a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub sku: Option<String>,
    pub stock_quantity: Option<u32>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub weight_grams: Option<u32>,
    pub dimensions: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: String,
    pub stock_quantity: u32,
    pub in_stock: bool,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub weight_grams: Option<u32>,
    pub dimensions: Option<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ProductRecord> for ProductView {
    fn from(p: ProductRecord) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price_cents: p.price.cents(),
            sku: p.sku,
            stock_quantity: p.stock_quantity,
            in_stock: p.stock_quantity > 0,
            image_url: p.image_url,
            is_active: p.is_active,
            weight_grams: p.weight_grams,
            dimensions: p.dimensions,
            category_id: p.category_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn views(records: Vec<ProductRecord>) -> Vec<ProductView> {
    records.into_iter().map(Into::into).collect()
}

/// Service for managing the product catalog.
#[derive(Clone)]
pub struct ProductService<S: Store> {
    store: S,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, cmd), fields(sku = %cmd.sku))]
    pub async fn create_product(&self, cmd: CreateProduct) -> Result<ProductView> {
        let name = validation::required("Name", &cmd.name, validation::MAX_PRODUCT_NAME_LENGTH)?;
        let description = validation::optional(
            "Description",
            cmd.description.as_deref(),
            validation::MAX_PRODUCT_DESCRIPTION_LENGTH,
        )?;
        let sku = validation::sku(&cmd.sku)?;
        let price = validation::price(cmd.price_cents)?;

        let mut tx = self.store.begin().await?;
        if tx.product_sku_exists(&sku, None).await? {
            return Err(DomainError::rule(format!(
                "Product with SKU {sku} already exists"
            )));
        }
        if let Some(category_id) = cmd.category_id
            && tx.get_category(category_id).await?.is_none()
        {
            return Err(DomainError::not_found("Category", category_id));
        }

        let record = ProductRecord {
            id: ProductId::new(),
            name,
            description,
            price,
            sku,
            stock_quantity: cmd.stock_quantity,
            image_url: cmd.image_url,
            is_active: true,
            weight_grams: cmd.weight_grams,
            dimensions: cmd.dimensions,
            category_id: cmd.category_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        tx.insert_product(&record).await?;
        tx.commit().await?;

        tracing::info!(product_id = %record.id, "product created");
        Ok(record.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<ProductView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.get_product(id).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product_by_sku(&self, sku: &str) -> Result<Option<ProductView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_product_by_sku(sku.trim()).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn products_by_category(&self, category_id: CategoryId) -> Result<Vec<ProductView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.products_by_category(category_id).await?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.list_products().await?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn active_products(&self) -> Result<Vec<ProductView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.active_products().await?))
    }

    /// Searches name, description and SKU. A blank term matches nothing.
    #[tracing::instrument(skip(self))]
    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductView>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.store.begin().await?;
        Ok(views(tx.search_products(term).await?))
    }

    /// Applies a partial update. Returns `None` if the product does not exist.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update_product(
        &self,
        id: ProductId,
        cmd: UpdateProduct,
    ) -> Result<Option<ProductView>> {
        let mut tx = self.store.begin().await?;
        let Some(mut record) = tx.get_product(id).await? else {
            return Ok(None);
        };

        if let Some(ref name) = cmd.name {
            record.name =
                validation::required("Name", name, validation::MAX_PRODUCT_NAME_LENGTH)?;
        }
        if cmd.description.is_some() {
            record.description = validation::optional(
                "Description",
                cmd.description.as_deref(),
                validation::MAX_PRODUCT_DESCRIPTION_LENGTH,
            )?;
        }
        if let Some(cents) = cmd.price_cents {
            record.price = validation::price(cents)?;
        }
        if let Some(ref raw) = cmd.sku {
            let sku = validation::sku(raw)?;
            if tx.product_sku_exists(&sku, Some(id)).await? {
                return Err(DomainError::rule(format!("SKU {sku} is already in use")));
            }
            record.sku = sku;
        }
        if let Some(stock) = cmd.stock_quantity {
            record.stock_quantity = stock;
        }
        if let Some(category_id) = cmd.category_id {
            if tx.get_category(category_id).await?.is_none() {
                return Err(DomainError::not_found("Category", category_id));
            }
            record.category_id = Some(category_id);
        }
        if cmd.image_url.is_some() {
            record.image_url = cmd.image_url;
        }
        if cmd.weight_grams.is_some() {
            record.weight_grams = cmd.weight_grams;
        }
        if cmd.dimensions.is_some() {
            record.dimensions = cmd.dimensions;
        }
        if let Some(is_active) = cmd.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Some(Utc::now());

        tx.update_product(&record).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "product updated");
        Ok(Some(record.into()))
    }

    /// Sets the absolute stock level. Returns `None` if the product does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_stock(&self, id: ProductId, quantity: u32) -> Result<Option<ProductView>> {
        let mut tx = self.store.begin().await?;
        let Some(mut record) = tx.get_product(id).await? else {
            return Ok(None);
        };
        let previous = record.stock_quantity;
        record.stock_quantity = quantity;
        record.updated_at = Some(Utc::now());
        tx.update_product(&record).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, previous, quantity, "stock updated");
        Ok(Some(record.into()))
    }

    /// Deletes a product. Returns `false` if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let deleted = tx.delete_product(id).await?;
        tx.commit().await?;
        if deleted {
            tracing::info!(product_id = %id, "product deleted");
        }
        Ok(deleted)
    }
}
