use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AddressId, CartId, CategoryId, CustomerId, OrderId, OrderStatus, PaymentId, PaymentStatus,
    ProductId,
};

use crate::{
    AddressRecord, CartRecord, CategoryRecord, CustomerRecord, OrderRecord, PaymentRecord,
    ProductRecord, Result,
};

#[async_trait]
pub trait CustomerRepository: Send {
    async fn insert_customer(&mut self, customer: &CustomerRecord) -> Result<()>;

    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<CustomerRecord>>;

    /// Looks a customer up by email, ignoring case.
    async fn find_customer_by_email(&mut self, email: &str) -> Result<Option<CustomerRecord>>;

    /// Returns true if another customer (not `exclude`) already uses the email.
    async fn customer_email_exists(
        &mut self,
        email: &str,
        exclude: Option<CustomerId>,
    ) -> Result<bool>;

    async fn update_customer(&mut self, customer: &CustomerRecord) -> Result<()>;

    /// Deletes a customer together with their addresses and carts.
    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool>;

    async fn list_customers(&mut self) -> Result<Vec<CustomerRecord>>;

    async fn customer_has_orders(&mut self, id: CustomerId) -> Result<bool>;
}

#[async_trait]
pub trait AddressRepository: Send {
    async fn insert_address(&mut self, address: &AddressRecord) -> Result<()>;

    async fn get_address(&mut self, id: AddressId) -> Result<Option<AddressRecord>>;

    async fn list_addresses(&mut self, customer_id: CustomerId) -> Result<Vec<AddressRecord>>;

    /// Clears the default flag on every address of the customer.
    async fn clear_default_addresses(&mut self, customer_id: CustomerId) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send {
    async fn insert_category(&mut self, category: &CategoryRecord) -> Result<()>;

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<CategoryRecord>>;

    async fn find_category_by_name(&mut self, name: &str) -> Result<Option<CategoryRecord>>;

    async fn category_name_exists(
        &mut self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool>;

    /// All categories ordered by name.
    async fn list_categories(&mut self) -> Result<Vec<CategoryRecord>>;

    /// Categories without a parent, ordered by name.
    async fn root_categories(&mut self) -> Result<Vec<CategoryRecord>>;

    /// Direct children of `parent`, ordered by name.
    async fn subcategories(&mut self, parent: CategoryId) -> Result<Vec<CategoryRecord>>;

    async fn update_category(&mut self, category: &CategoryRecord) -> Result<()>;

    async fn delete_category(&mut self, id: CategoryId) -> Result<bool>;

    async fn category_has_products(&mut self, id: CategoryId) -> Result<bool>;

    async fn category_has_subcategories(&mut self, id: CategoryId) -> Result<bool>;
}

#[async_trait]
pub trait ProductRepository: Send {
    async fn insert_product(&mut self, product: &ProductRecord) -> Result<()>;

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Looks a product up by SKU, ignoring case.
    async fn find_product_by_sku(&mut self, sku: &str) -> Result<Option<ProductRecord>>;

    async fn product_sku_exists(&mut self, sku: &str, exclude: Option<ProductId>)
    -> Result<bool>;

    /// All products ordered by name.
    async fn list_products(&mut self) -> Result<Vec<ProductRecord>>;

    async fn active_products(&mut self) -> Result<Vec<ProductRecord>>;

    async fn products_by_category(&mut self, category_id: CategoryId)
    -> Result<Vec<ProductRecord>>;

    /// Case-insensitive substring match on name, description or SKU.
    async fn search_products(&mut self, term: &str) -> Result<Vec<ProductRecord>>;

    async fn update_product(&mut self, product: &ProductRecord) -> Result<()>;

    async fn delete_product(&mut self, id: ProductId) -> Result<bool>;

    /// Adds `delta` to the stock of a product.
    ///
    /// Returns the new stock level, or `None` without changing anything if the
    /// product does not exist or the result would be negative.
    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<Option<u32>>;
}

#[async_trait]
pub trait CartRepository: Send {
    async fn insert_cart(&mut self, cart: &CartRecord) -> Result<()>;

    /// Loads a cart with its items.
    async fn get_cart(&mut self, id: CartId) -> Result<Option<CartRecord>>;

    /// The most recently created cart of the customer.
    async fn latest_cart_for_customer(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<Option<CartRecord>>;

    /// Writes the cart header and replaces its items.
    async fn save_cart(&mut self, cart: &CartRecord) -> Result<()>;

    /// Deletes carts whose last activity is before `cutoff`.
    async fn delete_carts_inactive_since(&mut self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait OrderRepository: Send {
    /// Inserts an order together with its items.
    async fn insert_order(&mut self, order: &OrderRecord) -> Result<()>;

    async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderRecord>>;

    async fn find_order_by_number(&mut self, order_number: &str) -> Result<Option<OrderRecord>>;

    async fn order_number_exists(&mut self, order_number: &str) -> Result<bool>;

    /// All orders, newest first.
    async fn list_orders(&mut self) -> Result<Vec<OrderRecord>>;

    /// Orders of a customer, newest first.
    async fn orders_for_customer(&mut self, customer_id: CustomerId) -> Result<Vec<OrderRecord>>;

    /// Orders with the given status, newest first.
    async fn orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<OrderRecord>>;

    /// Orders of a customer placed in `[from, to)`, oldest first.
    async fn orders_for_customer_between(
        &mut self,
        customer_id: CustomerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>>;

    /// Writes status, notes and fulfilment dates. Items are immutable.
    async fn update_order_header(&mut self, order: &OrderRecord) -> Result<()>;
}

#[async_trait]
pub trait PaymentRepository: Send {
    async fn insert_payment(&mut self, payment: &PaymentRecord) -> Result<()>;

    async fn get_payment(&mut self, id: PaymentId) -> Result<Option<PaymentRecord>>;

    async fn payment_for_order(&mut self, order_id: OrderId) -> Result<Option<PaymentRecord>>;

    async fn find_payment_by_transaction_id(
        &mut self,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>>;

    async fn payments_by_status(&mut self, status: PaymentStatus) -> Result<Vec<PaymentRecord>>;

    /// Pending payments created before `cutoff`.
    async fn pending_payments_before(&mut self, cutoff: DateTime<Utc>)
    -> Result<Vec<PaymentRecord>>;

    async fn update_payment(&mut self, payment: &PaymentRecord) -> Result<()>;
}
