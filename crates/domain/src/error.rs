//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested entity does not exist.
    #[error("{entity} with key '{key}' was not found.")]
    NotFound { entity: &'static str, key: String },

    /// The operation is not allowed in the current state.
    #[error("{0}")]
    BusinessRule(String),

    /// A product does not have enough stock for the requested quantity.
    #[error("Insufficient stock for '{product}'. Requested: {requested}, Available: {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    /// A unique field collided with an existing row.
    #[error("{entity} with the same {field} already exists.")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },

    /// The input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn rule(message: impl Into<String>) -> Self {
        DomainError::BusinessRule(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { constraint } => {
                let (entity, field) = match constraint.as_str() {
                    "customers_email_key" => ("Customer", "email"),
                    "categories_name_key" => ("Category", "name"),
                    "products_sku_key" => ("Product", "SKU"),
                    "orders_order_number_key" => ("Order", "order number"),
                    "payments_order_id_key" => ("Payment", "order"),
                    _ => ("Record", "key"),
                };
                DomainError::Duplicate { entity, field }
            }
            StoreError::ForeignKeyViolation { constraint } => DomainError::BusinessRule(format!(
                "Operation conflicts with related records ({constraint})"
            )),
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, key: id },
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
