//! Shopping carts.

use chrono::{DateTime, Duration, Utc};
use common::{CartId, CartItemId, CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{
    CartItemRecord, CartRecord, CartRepository, CustomerRepository, ProductRepository, Store,
    Transaction,
};

use crate::error::{DomainError, Result};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub id: CartId,
    pub customer_id: CustomerId,
    pub items: Vec<CartItemView>,
    pub total_amount_cents: i64,
    pub total_items: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Builds the cart view, resolving product names and SKUs.
async fn cart_view<T: Transaction>(tx: &mut T, cart: CartRecord) -> Result<CartView> {
    let mut items = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let (product_name, sku) = match tx.get_product(item.product_id).await? {
            Some(p) => (p.name, p.sku),
            None => (String::new(), String::new()),
        };
        items.push(CartItemView {
            id: item.id,
            product_id: item.product_id,
            product_name,
            sku,
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            subtotal_cents: item.unit_price.multiply(item.quantity).cents(),
        });
    }
    let total: Money = cart
        .items
        .iter()
        .map(|i| i.unit_price.multiply(i.quantity))
        .sum();

    Ok(CartView {
        id: cart.id,
        customer_id: cart.customer_id,
        total_items: cart.items.iter().map(|i| i.quantity).sum(),
        total_amount_cents: total.cents(),
        items,
        expires_at: cart.expires_at,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    })
}

/// Marks the cart as touched now.
fn touch(cart: &mut CartRecord, now: DateTime<Utc>) {
    cart.updated_at = Some(now);
    cart.expires_at = Some(now + Duration::days(validation::CART_EXPIRATION_DAYS));
}

/// Service for managing shopping carts.
#[derive(Clone)]
pub struct ShoppingCartService<S: Store> {
    store: S,
}

impl<S: Store> ShoppingCartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the customer's latest cart, creating an empty one if needed.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create_cart(&self, customer_id: CustomerId) -> Result<CartView> {
        let mut tx = self.store.begin().await?;
        if tx.get_customer(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", customer_id));
        }
        let cart = match tx.latest_cart_for_customer(customer_id).await? {
            Some(cart) => cart,
            None => {
                let now = Utc::now();
                let mut cart = CartRecord::new(customer_id, now);
                touch(&mut cart, now);
                tx.insert_cart(&cart).await?;
                tracing::info!(%customer_id, cart_id = %cart.id, "shopping cart created");
                cart
            }
        };
        let view = cart_view(&mut tx, cart).await?;
        tx.commit().await?;
        Ok(view)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: CartId) -> Result<Option<CartView>> {
        let mut tx = self.store.begin().await?;
        match tx.get_cart(cart_id).await? {
            Some(cart) => Ok(Some(cart_view(&mut tx, cart).await?)),
            None => Ok(None),
        }
    }

    /// Adds a product to the customer's cart. Adding a product that is
    /// already in the cart increases the quantity of the existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, customer_id: CustomerId, cmd: AddCartItem) -> Result<CartView> {
        let quantity = validation::quantity(cmd.quantity)?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        if tx.get_customer(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", customer_id));
        }
        let product = tx
            .get_product(cmd.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", cmd.product_id))?;
        if !product.is_active {
            return Err(DomainError::rule("Product is not available"));
        }

        let (mut cart, is_new) = match tx.latest_cart_for_customer(customer_id).await? {
            Some(cart) => (cart, false),
            None => (CartRecord::new(customer_id, now), true),
        };

        let existing = cart
            .items
            .iter()
            .position(|i| i.product_id == cmd.product_id);
        let combined = existing.map_or(0, |idx| cart.items[idx].quantity) + quantity;
        if combined > validation::MAX_QUANTITY {
            return Err(DomainError::validation(format!(
                "Quantity must be between {} and {}",
                validation::MIN_QUANTITY,
                validation::MAX_QUANTITY
            )));
        }
        if product.stock_quantity < combined {
            return Err(DomainError::InsufficientStock {
                product: product.name,
                requested: combined,
                available: product.stock_quantity,
            });
        }

        match existing {
            Some(idx) => cart.items[idx].quantity = combined,
            None => cart.items.push(CartItemRecord {
                id: CartItemId::new(),
                product_id: product.id,
                quantity,
                unit_price: product.price,
                added_at: now,
            }),
        }
        touch(&mut cart, now);

        if is_new {
            tx.insert_cart(&cart).await?;
        } else {
            tx.save_cart(&cart).await?;
        }
        let view = cart_view(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::info!(cart_id = %view.id, product_id = %cmd.product_id, quantity, "item added to cart");
        Ok(view)
    }

    /// Sets the quantity of a cart line. Zero or less removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<CartView> {
        let mut tx = self.store.begin().await?;
        let mut cart = tx
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart", cart_id))?;
        let idx = cart
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| DomainError::not_found("Cart item", item_id))?;

        if quantity <= 0 {
            cart.items.remove(idx);
        } else {
            let quantity = u32::try_from(quantity)
                .map_err(|_| DomainError::validation("Quantity is out of range"))
                .and_then(validation::quantity)?;
            let product_id = cart.items[idx].product_id;
            let product = tx
                .get_product(product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Product", product_id))?;
            if product.stock_quantity < quantity {
                return Err(DomainError::InsufficientStock {
                    product: product.name,
                    requested: quantity,
                    available: product.stock_quantity,
                });
            }
            cart.items[idx].quantity = quantity;
        }
        touch(&mut cart, Utc::now());

        tx.save_cart(&cart).await?;
        let view = cart_view(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::info!(%cart_id, %item_id, quantity, "cart item updated");
        Ok(view)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<CartView> {
        let mut tx = self.store.begin().await?;
        let mut cart = tx
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart", cart_id))?;
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        if cart.items.len() == before {
            return Err(DomainError::not_found("Cart item", item_id));
        }
        touch(&mut cart, Utc::now());

        tx.save_cart(&cart).await?;
        let view = cart_view(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::info!(%cart_id, %item_id, "item removed from cart");
        Ok(view)
    }

    /// Empties a cart. Returns `false` if the cart does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, cart_id: CartId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let Some(mut cart) = tx.get_cart(cart_id).await? else {
            return Ok(false);
        };
        cart.items.clear();
        touch(&mut cart, Utc::now());
        tx.save_cart(&cart).await?;
        tx.commit().await?;

        tracing::info!(%cart_id, "cart cleared");
        Ok(true)
    }

    /// Deletes carts that have not been touched for the expiration period.
    #[tracing::instrument(skip(self))]
    pub async fn remove_expired_carts(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(validation::CART_EXPIRATION_DAYS);
        let mut tx = self.store.begin().await?;
        let removed = tx.delete_carts_inactive_since(cutoff).await?;
        tx.commit().await?;

        tracing::info!(removed, "expired carts removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::{CreateCustomer, CustomerService};
    use crate::product::{CreateProduct, ProductService};
    use store::InMemoryStore;

    struct Fixture {
        carts: ShoppingCartService<InMemoryStore>,
        customer_id: CustomerId,
        product_id: ProductId,
    }

    async fn fixture(stock: u32) -> Fixture {
        let store = InMemoryStore::new();
        let customer = CustomerService::new(store.clone())
            .create_customer(CreateCustomer {
                email: "cart@example.com".to_string(),
                first_name: "Carl".to_string(),
                last_name: "Cart".to_string(),
                phone: None,
                date_of_birth: None,
            })
            .await
            .unwrap();
        let product = ProductService::new(store.clone())
            .create_product(CreateProduct {
                name: "Coffee beans".to_string(),
                description: None,
                price_cents: 1250,
                sku: "COF-1".to_string(),
                stock_quantity: stock,
                category_id: None,
                image_url: None,
                weight_grams: Some(1000),
                dimensions: None,
            })
            .await
            .unwrap();
        Fixture {
            carts: ShoppingCartService::new(store),
            customer_id: customer.id,
            product_id: product.id,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let f = fixture(5).await;
        let first = f.carts.get_or_create_cart(f.customer_id).await.unwrap();
        let second = f.carts.get_or_create_cart(f.customer_id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.items.is_empty());
    }

    #[tokio::test]
    async fn test_add_item_snapshots_price_and_totals() {
        let f = fixture(5).await;
        let cart = f
            .carts
            .add_item(
                f.customer_id,
                AddCartItem {
                    product_id: f.product_id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_name, "Coffee beans");
        assert_eq!(cart.items[0].unit_price_cents, 1250);
        assert_eq!(cart.total_amount_cents, 2500);
        assert_eq!(cart.total_items, 2);
        assert!(cart.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_combined_quantity_checked_against_stock() {
        let f = fixture(3).await;
        let add = |quantity| AddCartItem {
            product_id: f.product_id,
            quantity,
        };
        f.carts.add_item(f.customer_id, add(2)).await.unwrap();

        let result = f.carts.add_item(f.customer_id, add(2)).await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let f = fixture(5).await;
        let cart = f
            .carts
            .add_item(
                f.customer_id,
                AddCartItem {
                    product_id: f.product_id,
                    quantity: 1,
                },
            )
            .await
            .unwrap();

        let updated = f
            .carts
            .update_item_quantity(cart.id, cart.items[0].id, 0)
            .await
            .unwrap();
        assert!(updated.items.is_empty());
        assert_eq!(updated.total_amount_cents, 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_item_is_not_found() {
        let f = fixture(5).await;
        let cart = f.carts.get_or_create_cart(f.customer_id).await.unwrap();
        let result = f.carts.remove_item(cart.id, CartItemId::new()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_clear_missing_cart_returns_false() {
        let f = fixture(5).await;
        assert!(!f.carts.clear_cart(CartId::new()).await.unwrap());
    }
}
