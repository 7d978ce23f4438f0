//! Product categories.

use chrono::{DateTime, Utc};
use common::CategoryId;
use serde::{Deserialize, Serialize};
use store::{CategoryRecord, CategoryRepository, Store, Transaction};

use crate::error::{DomainError, Result};
use crate::validation;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub parent_category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update of a category. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub parent_category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CategoryRecord> for CategoryView {
    fn from(c: CategoryRecord) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            image_url: c.image_url,
            is_active: c.is_active,
            parent_category_id: c.parent_category_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

fn views(records: Vec<CategoryRecord>) -> Vec<CategoryView> {
    records.into_iter().map(Into::into).collect()
}

/// Service for managing the category tree.
#[derive(Clone)]
pub struct CategoryService<S: Store> {
    store: S,
}

impl<S: Store> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.name))]
    pub async fn create_category(&self, cmd: CreateCategory) -> Result<CategoryView> {
        let name = validation::required("Name", &cmd.name, validation::MAX_CATEGORY_NAME_LENGTH)?;
        let description = validation::optional(
            "Description",
            cmd.description.as_deref(),
            validation::MAX_CATEGORY_DESCRIPTION_LENGTH,
        )?;

        let mut tx = self.store.begin().await?;
        if tx.category_name_exists(&name, None).await? {
            return Err(DomainError::rule(format!(
                "Category with name {name} already exists"
            )));
        }
        if let Some(parent) = cmd.parent_category_id
            && tx.get_category(parent).await?.is_none()
        {
            return Err(DomainError::not_found("Parent category", parent));
        }

        let record = CategoryRecord {
            id: CategoryId::new(),
            name,
            description,
            image_url: cmd.image_url,
            is_active: cmd.is_active,
            parent_category_id: cmd.parent_category_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        tx.insert_category(&record).await?;
        tx.commit().await?;

        tracing::info!(category_id = %record.id, "category created");
        Ok(record.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<CategoryView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.get_category(id).await?.map(Into::into))
    }

    /// Looks a category up by name, ignoring case.
    #[tracing::instrument(skip(self))]
    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<CategoryView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_category_by_name(name.trim()).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.list_categories().await?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn root_categories(&self) -> Result<Vec<CategoryView>> {
        let mut tx = self.store.begin().await?;
        Ok(views(tx.root_categories().await?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn subcategories(&self, parent: CategoryId) -> Result<Vec<CategoryView>> {
        let mut tx = self.store.begin().await?;
        if tx.get_category(parent).await?.is_none() {
            return Err(DomainError::not_found("Category", parent));
        }
        Ok(views(tx.subcategories(parent).await?))
    }

    #[tracing::instrument(skip(self, cmd))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        cmd: UpdateCategory,
    ) -> Result<CategoryView> {
        let mut tx = self.store.begin().await?;
        let mut record = tx
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))?;

        if let Some(ref raw) = cmd.name {
            let name = validation::required("Name", raw, validation::MAX_CATEGORY_NAME_LENGTH)?;
            if tx.category_name_exists(&name, Some(id)).await? {
                return Err(DomainError::rule(format!(
                    "Category with name {name} already exists"
                )));
            }
            record.name = name;
        }
        if cmd.description.is_some() {
            record.description = validation::optional(
                "Description",
                cmd.description.as_deref(),
                validation::MAX_CATEGORY_DESCRIPTION_LENGTH,
            )?;
        }
        if cmd.image_url.is_some() {
            record.image_url = cmd.image_url;
        }
        if let Some(is_active) = cmd.is_active {
            record.is_active = is_active;
        }
        if let Some(parent) = cmd.parent_category_id {
            if parent == id {
                return Err(DomainError::rule("Category cannot be its own parent"));
            }
            if tx.get_category(parent).await?.is_none() {
                return Err(DomainError::not_found("Parent category", parent));
            }
            record.parent_category_id = Some(parent);
        }
        record.updated_at = Some(Utc::now());

        tx.update_category(&record).await?;
        tx.commit().await?;

        tracing::info!(category_id = %id, "category updated");
        Ok(record.into())
    }

    /// Deletes an empty leaf category. Returns `false` if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        if tx.get_category(id).await?.is_none() {
            return Ok(false);
        }
        if tx.category_has_products(id).await? {
            return Err(DomainError::rule(
                "Cannot delete category with existing products",
            ));
        }
        if tx.category_has_subcategories(id).await? {
            return Err(DomainError::rule("Cannot delete category with subcategories"));
        }
        let deleted = tx.delete_category(id).await?;
        tx.commit().await?;

        tracing::info!(category_id = %id, "category deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    fn cmd(name: &str, parent: Option<CategoryId>) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            description: None,
            image_url: None,
            parent_category_id: parent,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_ignores_case() {
        let service = CategoryService::new(InMemoryStore::new());
        service.create_category(cmd("Books", None)).await.unwrap();

        let result = service.create_category(cmd("books", None)).await;
        assert!(matches!(result, Err(DomainError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_name_ignores_case() {
        let service = CategoryService::new(InMemoryStore::new());
        let created = service
            .create_category(cmd("Electronics", None))
            .await
            .unwrap();

        let found = service.get_category_by_name(" ELECTRONICS ").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(created.id));
        assert!(service.get_category_by_name("Garden").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roots_and_subcategories() {
        let service = CategoryService::new(InMemoryStore::new());
        let books = service.create_category(cmd("Books", None)).await.unwrap();
        service
            .create_category(cmd("Poetry", Some(books.id)))
            .await
            .unwrap();
        service
            .create_category(cmd("Fiction", Some(books.id)))
            .await
            .unwrap();
        service.create_category(cmd("Audio", None)).await.unwrap();

        let roots: Vec<_> = service
            .root_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(roots, vec!["Audio", "Books"]);

        let children: Vec<_> = service
            .subcategories(books.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(children, vec!["Fiction", "Poetry"]);
    }

    #[tokio::test]
    async fn test_category_cannot_be_its_own_parent() {
        let service = CategoryService::new(InMemoryStore::new());
        let books = service.create_category(cmd("Books", None)).await.unwrap();

        let result = service
            .update_category(
                books.id,
                UpdateCategory {
                    parent_category_id: Some(books.id),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let service = CategoryService::new(InMemoryStore::new());
        let result = service
            .create_category(cmd("Orphans", Some(CategoryId::new())))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
