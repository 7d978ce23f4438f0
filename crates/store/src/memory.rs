use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AddressId, CartId, CategoryId, CustomerId, OrderId, OrderStatus, PaymentId, PaymentStatus,
    ProductId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    AddressRecord, AddressRepository, CartRecord, CartRepository, CategoryRecord,
    CategoryRepository, CustomerRecord, CustomerRepository, OrderRecord, OrderRepository,
    PaymentRecord, PaymentRepository, ProductRecord, ProductRepository, Result, Store, StoreError,
    Transaction,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: HashMap<CustomerId, CustomerRecord>,
    addresses: HashMap<AddressId, AddressRecord>,
    categories: HashMap<CategoryId, CategoryRecord>,
    products: HashMap<ProductId, ProductRecord>,
    carts: HashMap<CartId, CartRecord>,
    orders: HashMap<OrderId, OrderRecord>,
    payments: HashMap<PaymentId, PaymentRecord>,
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn contains_text(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn newest_first(mut orders: Vec<OrderRecord>) -> Vec<OrderRecord> {
    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
    orders
}

fn by_name<T>(mut rows: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    rows.sort_by_key(|row| name(row).to_lowercase());
    rows
}

/// In-memory store implementation for tests and local development.
///
/// A transaction holds the store lock for its whole lifetime, so transactions
/// are fully serialized. Writes go to a private copy of the tables that
/// replaces the shared tables on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        Ok(InMemoryTransaction {
            committed: self.tables.clone().lock_owned().await,
            working: None,
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A unit of work over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    committed: OwnedMutexGuard<Tables>,
    working: Option<Tables>,
}

impl InMemoryTransaction {
    fn tables(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&*self.committed)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let committed = &self.committed;
        self.working
            .get_or_insert_with(|| Tables::clone(committed))
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> Result<()> {
        let InMemoryTransaction {
            mut committed,
            working,
        } = self;
        if let Some(working) = working {
            *committed = working;
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for InMemoryTransaction {
    async fn insert_customer(&mut self, customer: &CustomerRecord) -> Result<()> {
        if self.customer_email_exists(&customer.email, None).await? {
            return Err(StoreError::unique("customers_email_key"));
        }
        self.tables_mut()
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<CustomerRecord>> {
        Ok(self.tables().customers.get(&id).cloned())
    }

    async fn find_customer_by_email(&mut self, email: &str) -> Result<Option<CustomerRecord>> {
        Ok(self
            .tables()
            .customers
            .values()
            .find(|c| same_text(&c.email, email))
            .cloned())
    }

    async fn customer_email_exists(
        &mut self,
        email: &str,
        exclude: Option<CustomerId>,
    ) -> Result<bool> {
        Ok(self
            .tables()
            .customers
            .values()
            .any(|c| same_text(&c.email, email) && Some(c.id) != exclude))
    }

    async fn update_customer(&mut self, customer: &CustomerRecord) -> Result<()> {
        if self
            .customer_email_exists(&customer.email, Some(customer.id))
            .await?
        {
            return Err(StoreError::unique("customers_email_key"));
        }
        match self.tables_mut().customers.get_mut(&customer.id) {
            Some(row) => {
                *row = customer.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Customer", customer.id)),
        }
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool> {
        if !self.tables().customers.contains_key(&id) {
            return Ok(false);
        }
        if self.customer_has_orders(id).await? {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "orders_customer_id_fkey".to_string(),
            });
        }
        let tables = self.tables_mut();
        tables.customers.remove(&id);
        tables.addresses.retain(|_, a| a.customer_id != id);
        tables.carts.retain(|_, c| c.customer_id != id);
        Ok(true)
    }

    async fn list_customers(&mut self) -> Result<Vec<CustomerRecord>> {
        let mut customers: Vec<_> = self.tables().customers.values().cloned().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(customers)
    }

    async fn customer_has_orders(&mut self, id: CustomerId) -> Result<bool> {
        Ok(self.tables().orders.values().any(|o| o.customer_id == id))
    }
}

#[async_trait]
impl AddressRepository for InMemoryTransaction {
    async fn insert_address(&mut self, address: &AddressRecord) -> Result<()> {
        self.tables_mut()
            .addresses
            .insert(address.id, address.clone());
        Ok(())
    }

    async fn get_address(&mut self, id: AddressId) -> Result<Option<AddressRecord>> {
        Ok(self.tables().addresses.get(&id).cloned())
    }

    async fn list_addresses(&mut self, customer_id: CustomerId) -> Result<Vec<AddressRecord>> {
        let mut addresses: Vec<_> = self
            .tables()
            .addresses
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(addresses)
    }

    async fn clear_default_addresses(&mut self, customer_id: CustomerId) -> Result<()> {
        for address in self.tables_mut().addresses.values_mut() {
            if address.customer_id == customer_id {
                address.is_default = false;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryTransaction {
    async fn insert_category(&mut self, category: &CategoryRecord) -> Result<()> {
        if self.category_name_exists(&category.name, None).await? {
            return Err(StoreError::unique("categories_name_key"));
        }
        self.tables_mut()
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        Ok(self.tables().categories.get(&id).cloned())
    }

    async fn find_category_by_name(&mut self, name: &str) -> Result<Option<CategoryRecord>> {
        Ok(self
            .tables()
            .categories
            .values()
            .find(|c| same_text(&c.name, name))
            .cloned())
    }

    async fn category_name_exists(
        &mut self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool> {
        Ok(self
            .tables()
            .categories
            .values()
            .any(|c| same_text(&c.name, name) && Some(c.id) != exclude))
    }

    async fn list_categories(&mut self) -> Result<Vec<CategoryRecord>> {
        let rows = self.tables().categories.values().cloned().collect();
        Ok(by_name(rows, |c: &CategoryRecord| &c.name))
    }

    async fn root_categories(&mut self) -> Result<Vec<CategoryRecord>> {
        let rows = self
            .tables()
            .categories
            .values()
            .filter(|c| c.parent_category_id.is_none())
            .cloned()
            .collect();
        Ok(by_name(rows, |c: &CategoryRecord| &c.name))
    }

    async fn subcategories(&mut self, parent: CategoryId) -> Result<Vec<CategoryRecord>> {
        let rows = self
            .tables()
            .categories
            .values()
            .filter(|c| c.parent_category_id == Some(parent))
            .cloned()
            .collect();
        Ok(by_name(rows, |c: &CategoryRecord| &c.name))
    }

    async fn update_category(&mut self, category: &CategoryRecord) -> Result<()> {
        if self
            .category_name_exists(&category.name, Some(category.id))
            .await?
        {
            return Err(StoreError::unique("categories_name_key"));
        }
        match self.tables_mut().categories.get_mut(&category.id) {
            Some(row) => {
                *row = category.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Category", category.id)),
        }
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
        if !self.tables().categories.contains_key(&id) {
            return Ok(false);
        }
        if self.category_has_products(id).await? {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "products_category_id_fkey".to_string(),
            });
        }
        if self.category_has_subcategories(id).await? {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "categories_parent_category_id_fkey".to_string(),
            });
        }
        self.tables_mut().categories.remove(&id);
        Ok(true)
    }

    async fn category_has_products(&mut self, id: CategoryId) -> Result<bool> {
        Ok(self
            .tables()
            .products
            .values()
            .any(|p| p.category_id == Some(id)))
    }

    async fn category_has_subcategories(&mut self, id: CategoryId) -> Result<bool> {
        Ok(self
            .tables()
            .categories
            .values()
            .any(|c| c.parent_category_id == Some(id)))
    }
}

#[async_trait]
impl ProductRepository for InMemoryTransaction {
    async fn insert_product(&mut self, product: &ProductRecord) -> Result<()> {
        if self.product_sku_exists(&product.sku, None).await? {
            return Err(StoreError::unique("products_sku_key"));
        }
        self.tables_mut()
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn find_product_by_sku(&mut self, sku: &str) -> Result<Option<ProductRecord>> {
        Ok(self
            .tables()
            .products
            .values()
            .find(|p| same_text(&p.sku, sku))
            .cloned())
    }

    async fn product_sku_exists(
        &mut self,
        sku: &str,
        exclude: Option<ProductId>,
    ) -> Result<bool> {
        Ok(self
            .tables()
            .products
            .values()
            .any(|p| same_text(&p.sku, sku) && Some(p.id) != exclude))
    }

    async fn list_products(&mut self) -> Result<Vec<ProductRecord>> {
        let rows = self.tables().products.values().cloned().collect();
        Ok(by_name(rows, |p: &ProductRecord| &p.name))
    }

    async fn active_products(&mut self) -> Result<Vec<ProductRecord>> {
        let rows = self
            .tables()
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        Ok(by_name(rows, |p: &ProductRecord| &p.name))
    }

    async fn products_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> Result<Vec<ProductRecord>> {
        let rows = self
            .tables()
            .products
            .values()
            .filter(|p| p.category_id == Some(category_id))
            .cloned()
            .collect();
        Ok(by_name(rows, |p: &ProductRecord| &p.name))
    }

    async fn search_products(&mut self, term: &str) -> Result<Vec<ProductRecord>> {
        let needle = term.to_lowercase();
        let rows = self
            .tables()
            .products
            .values()
            .filter(|p| {
                contains_text(Some(&p.name), &needle)
                    || contains_text(p.description.as_deref(), &needle)
                    || contains_text(Some(&p.sku), &needle)
            })
            .cloned()
            .collect();
        Ok(by_name(rows, |p: &ProductRecord| &p.name))
    }

    async fn update_product(&mut self, product: &ProductRecord) -> Result<()> {
        if self
            .product_sku_exists(&product.sku, Some(product.id))
            .await?
        {
            return Err(StoreError::unique("products_sku_key"));
        }
        match self.tables_mut().products.get_mut(&product.id) {
            Some(row) => {
                *row = product.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Product", product.id)),
        }
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool> {
        if !self.tables().products.contains_key(&id) {
            return Ok(false);
        }
        let ordered = self
            .tables()
            .orders
            .values()
            .flat_map(|o| o.items.iter())
            .any(|item| item.product_id == id);
        if ordered {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "order_items_product_id_fkey".to_string(),
            });
        }
        let tables = self.tables_mut();
        tables.products.remove(&id);
        for cart in tables.carts.values_mut() {
            cart.items.retain(|item| item.product_id != id);
        }
        Ok(true)
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<Option<u32>> {
        let Some(current) = self.tables().products.get(&id).map(|p| p.stock_quantity) else {
            return Ok(None);
        };
        let Ok(next) = u32::try_from(i64::from(current) + delta) else {
            return Ok(None);
        };
        if let Some(product) = self.tables_mut().products.get_mut(&id) {
            product.stock_quantity = next;
            product.updated_at = Some(Utc::now());
        }
        Ok(Some(next))
    }
}

#[async_trait]
impl CartRepository for InMemoryTransaction {
    async fn insert_cart(&mut self, cart: &CartRecord) -> Result<()> {
        self.tables_mut().carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn get_cart(&mut self, id: CartId) -> Result<Option<CartRecord>> {
        Ok(self.tables().carts.get(&id).cloned())
    }

    async fn latest_cart_for_customer(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<Option<CartRecord>> {
        Ok(self
            .tables()
            .carts
            .values()
            .filter(|c| c.customer_id == customer_id)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn save_cart(&mut self, cart: &CartRecord) -> Result<()> {
        match self.tables_mut().carts.get_mut(&cart.id) {
            Some(row) => {
                *row = cart.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Cart", cart.id)),
        }
    }

    async fn delete_carts_inactive_since(&mut self, cutoff: DateTime<Utc>) -> Result<u64> {
        let carts = &mut self.tables_mut().carts;
        let before = carts.len();
        carts.retain(|_, c| c.last_activity() >= cutoff);
        Ok((before - carts.len()) as u64)
    }
}

#[async_trait]
impl OrderRepository for InMemoryTransaction {
    async fn insert_order(&mut self, order: &OrderRecord) -> Result<()> {
        if self.order_number_exists(&order.order_number).await? {
            return Err(StoreError::unique("orders_order_number_key"));
        }
        self.tables_mut().orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.tables().orders.get(&id).cloned())
    }

    async fn find_order_by_number(&mut self, order_number: &str) -> Result<Option<OrderRecord>> {
        Ok(self
            .tables()
            .orders
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn order_number_exists(&mut self, order_number: &str) -> Result<bool> {
        Ok(self
            .tables()
            .orders
            .values()
            .any(|o| o.order_number == order_number))
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderRecord>> {
        Ok(newest_first(
            self.tables().orders.values().cloned().collect(),
        ))
    }

    async fn orders_for_customer(&mut self, customer_id: CustomerId) -> Result<Vec<OrderRecord>> {
        Ok(newest_first(
            self.tables()
                .orders
                .values()
                .filter(|o| o.customer_id == customer_id)
                .cloned()
                .collect(),
        ))
    }

    async fn orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<OrderRecord>> {
        Ok(newest_first(
            self.tables()
                .orders
                .values()
                .filter(|o| o.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn orders_for_customer_between(
        &mut self,
        customer_id: CustomerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>> {
        let mut orders: Vec<_> = self
            .tables()
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id && o.order_date >= from && o.order_date < to)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.order_date.cmp(&b.order_date));
        Ok(orders)
    }

    async fn update_order_header(&mut self, order: &OrderRecord) -> Result<()> {
        match self.tables_mut().orders.get_mut(&order.id) {
            Some(row) => {
                row.status = order.status;
                row.notes = order.notes.clone();
                row.shipped_date = order.shipped_date;
                row.delivered_date = order.delivered_date;
                row.updated_at = order.updated_at;
                Ok(())
            }
            None => Err(StoreError::not_found("Order", order.id)),
        }
    }
}

#[async_trait]
impl PaymentRepository for InMemoryTransaction {
    async fn insert_payment(&mut self, payment: &PaymentRecord) -> Result<()> {
        if self.payment_for_order(payment.order_id).await?.is_some() {
            return Err(StoreError::unique("payments_order_id_key"));
        }
        self.tables_mut()
            .payments
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_payment(&mut self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        Ok(self.tables().payments.get(&id).cloned())
    }

    async fn payment_for_order(&mut self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        Ok(self
            .tables()
            .payments
            .values()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn find_payment_by_transaction_id(
        &mut self,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        Ok(self
            .tables()
            .payments
            .values()
            .find(|p| p.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn payments_by_status(&mut self, status: PaymentStatus) -> Result<Vec<PaymentRecord>> {
        let mut payments: Vec<_> = self
            .tables()
            .payments
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }

    async fn pending_payments_before(
        &mut self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentRecord>> {
        let mut payments: Vec<_> = self
            .tables()
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Pending && p.created_at < cutoff)
            .cloned()
            .collect();
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(payments)
    }

    async fn update_payment(&mut self, payment: &PaymentRecord) -> Result<()> {
        match self.tables_mut().payments.get_mut(&payment.id) {
            Some(row) => {
                *row = payment.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Payment", payment.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::{CartItemId, Money};

    use crate::CartItemRecord;

    fn customer(email: &str) -> CustomerRecord {
        CustomerRecord {
            id: CustomerId::new(),
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            date_of_birth: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn product(sku: &str, stock: u32) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(),
            name: format!("Product {sku}"),
            description: Some("A sturdy widget".to_string()),
            price: Money::from_cents(1999),
            sku: sku.to_string(),
            stock_quantity: stock,
            image_url: None,
            is_active: true,
            weight_grams: None,
            dimensions: None,
            category_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = InMemoryStore::new();
        let record = customer("ada@example.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&record).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get_customer(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        let record = customer("ada@example.com");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_customer(&record).await.unwrap();
            assert!(tx.get_customer(record.id).await.unwrap().is_some());
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_customer(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&customer("ada@example.com"))
            .await
            .unwrap();

        let result = tx.insert_customer(&customer("ADA@example.com")).await;
        assert!(matches!(
            result,
            Err(StoreError::UniqueViolation { ref constraint }) if constraint == "customers_email_key"
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_refuses_negative_result() {
        let store = InMemoryStore::new();
        let widget = product("W-1", 5);
        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&widget).await.unwrap();

        assert_eq!(tx.adjust_stock(widget.id, -3).await.unwrap(), Some(2));
        assert_eq!(tx.adjust_stock(widget.id, -3).await.unwrap(), None);
        assert_eq!(
            tx.get_product(widget.id).await.unwrap().unwrap().stock_quantity,
            2
        );
        assert_eq!(tx.adjust_stock(ProductId::new(), 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_matches_name_description_and_sku() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&product("KB-100", 1)).await.unwrap();
        tx.insert_product(&product("MS-200", 1)).await.unwrap();

        assert_eq!(tx.search_products("kb-1").await.unwrap().len(), 1);
        assert_eq!(tx.search_products("STURDY").await.unwrap().len(), 2);
        assert!(tx.search_products("lamp").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_inactive_carts() {
        let store = InMemoryStore::new();
        let owner = customer("cart@example.com");
        let now = Utc::now();

        let stale = CartRecord::new(owner.id, now - Duration::days(31));
        let mut fresh = CartRecord::new(owner.id, now);
        fresh.items.push(CartItemRecord {
            id: CartItemId::new(),
            product_id: ProductId::new(),
            quantity: 1,
            unit_price: Money::from_cents(100),
            added_at: now,
        });

        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&owner).await.unwrap();
        tx.insert_cart(&stale).await.unwrap();
        tx.insert_cart(&fresh).await.unwrap();

        let removed = tx
            .delete_carts_inactive_since(now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(tx.get_cart(stale.id).await.unwrap().is_none());
        assert_eq!(
            tx.latest_cart_for_customer(owner.id).await.unwrap(),
            Some(fresh)
        );
    }

    #[tokio::test]
    async fn test_delete_customer_cascades_to_carts() {
        let store = InMemoryStore::new();
        let owner = customer("gone@example.com");
        let cart = CartRecord::new(owner.id, Utc::now());

        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&owner).await.unwrap();
        tx.insert_cart(&cart).await.unwrap();

        assert!(tx.delete_customer(owner.id).await.unwrap());
        assert!(tx.get_cart(cart.id).await.unwrap().is_none());
        assert!(!tx.delete_customer(owner.id).await.unwrap());
    }
}
