use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AddressId, AddressType, CartId, CartItemId, CategoryId, CustomerId, Money, OrderId,
    OrderItemId, OrderStatus, PaymentId, PaymentStatus, ProductId, UnknownVariant,
};
use sqlx::{PgPool, Postgres, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AddressRecord, AddressRepository, CartItemRecord, CartRecord, CartRepository, CategoryRecord,
    CategoryRepository, CustomerRecord, CustomerRepository, OrderItemRecord, OrderRecord,
    OrderRepository, PaymentRecord, PaymentRepository, ProductRecord, ProductRepository, Result,
    Store, StoreError, Transaction,
};

const CUSTOMER_COLUMNS: &str =
    "id, email, first_name, last_name, phone, date_of_birth, created_at, updated_at";
const ADDRESS_COLUMNS: &str = "id, customer_id, street, address_line2, city, state, country, \
     postal_code, address_type, is_default, created_at, updated_at";
const CATEGORY_COLUMNS: &str =
    "id, name, description, image_url, is_active, parent_category_id, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, sku, stock_quantity, \
     image_url, is_active, weight_grams, dimensions, category_id, created_at, updated_at";
const CART_COLUMNS: &str = "id, customer_id, expires_at, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, order_number, customer_id, order_date, status, \
     total_amount_cents, notes, payment_method, shipping_address_id, billing_address_id, \
     shipped_date, delivered_date, created_at, updated_at";
const PAYMENT_COLUMNS: &str = "id, order_id, payment_method, amount_cents, status, \
     transaction_id, gateway_response, processed_at, payment_date, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        Ok(PostgresTransaction {
            tx: self.pool.begin().await?,
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A unit of work backed by a database transaction.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn quantity(value: i64, column: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData {
        column,
        message: format!("{value} is out of range"),
    })
}

fn status<T>(value: String, column: &'static str) -> Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    value.parse().map_err(|e: UnknownVariant| StoreError::InvalidData {
        column,
        message: e.to_string(),
    })
}

fn customer_from_row(row: &PgRow) -> Result<CustomerRecord> {
    Ok(CustomerRecord {
        id: CustomerId::from_uuid(row.try_get("id")?),
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        date_of_birth: row.try_get("date_of_birth")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn address_from_row(row: &PgRow) -> Result<AddressRecord> {
    Ok(AddressRecord {
        id: AddressId::from_uuid(row.try_get("id")?),
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        street: row.try_get("street")?,
        address_line2: row.try_get("address_line2")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        postal_code: row.try_get("postal_code")?,
        address_type: status::<AddressType>(row.try_get("address_type")?, "address_type")?,
        is_default: row.try_get("is_default")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: CategoryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        is_active: row.try_get("is_active")?,
        parent_category_id: row
            .try_get::<Option<Uuid>, _>("parent_category_id")?
            .map(CategoryId::from_uuid),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<ProductRecord> {
    Ok(ProductRecord {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        sku: row.try_get("sku")?,
        stock_quantity: quantity(row.try_get("stock_quantity")?, "stock_quantity")?,
        image_url: row.try_get("image_url")?,
        is_active: row.try_get("is_active")?,
        weight_grams: row
            .try_get::<Option<i64>, _>("weight_grams")?
            .map(|w| quantity(w, "weight_grams"))
            .transpose()?,
        dimensions: row.try_get("dimensions")?,
        category_id: row
            .try_get::<Option<Uuid>, _>("category_id")?
            .map(CategoryId::from_uuid),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn cart_from_row(row: &PgRow) -> Result<CartRecord> {
    Ok(CartRecord {
        id: CartId::from_uuid(row.try_get("id")?),
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        expires_at: row.try_get("expires_at")?,
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn cart_item_from_row(row: &PgRow) -> Result<CartItemRecord> {
    Ok(CartItemRecord {
        id: CartItemId::from_uuid(row.try_get("id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        quantity: quantity(row.try_get("quantity")?, "quantity")?,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        added_at: row.try_get("added_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<OrderRecord> {
    Ok(OrderRecord {
        id: OrderId::from_uuid(row.try_get("id")?),
        order_number: row.try_get("order_number")?,
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        order_date: row.try_get("order_date")?,
        status: status::<OrderStatus>(row.try_get("status")?, "status")?,
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        notes: row.try_get("notes")?,
        payment_method: row.try_get("payment_method")?,
        shipping_address_id: AddressId::from_uuid(row.try_get("shipping_address_id")?),
        billing_address_id: AddressId::from_uuid(row.try_get("billing_address_id")?),
        shipped_date: row.try_get("shipped_date")?,
        delivered_date: row.try_get("delivered_date")?,
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItemRecord> {
    Ok(OrderItemRecord {
        id: OrderItemId::from_uuid(row.try_get("id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        product_name: row.try_get("product_name")?,
        sku: row.try_get("sku")?,
        quantity: quantity(row.try_get("quantity")?, "quantity")?,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        total_price: Money::from_cents(row.try_get("total_price_cents")?),
    })
}

fn payment_from_row(row: &PgRow) -> Result<PaymentRecord> {
    Ok(PaymentRecord {
        id: PaymentId::from_uuid(row.try_get("id")?),
        order_id: OrderId::from_uuid(row.try_get("order_id")?),
        payment_method: row.try_get("payment_method")?,
        amount: Money::from_cents(row.try_get("amount_cents")?),
        status: status::<PaymentStatus>(row.try_get("status")?, "status")?,
        transaction_id: row.try_get("transaction_id")?,
        gateway_response: row.try_get("gateway_response")?,
        processed_at: row.try_get("processed_at")?,
        payment_date: row.try_get("payment_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl PostgresTransaction {
    /// Attaches items to cart headers with one query.
    async fn with_cart_items(&mut self, rows: Vec<PgRow>) -> Result<Vec<CartRecord>> {
        let mut carts = rows.iter().map(cart_from_row).collect::<Result<Vec<_>>>()?;
        if carts.is_empty() {
            return Ok(carts);
        }
        let ids: Vec<Uuid> = carts.iter().map(|c| c.id.as_uuid()).collect();
        let item_rows = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, unit_price_cents, added_at
            FROM cart_items
            WHERE cart_id = ANY($1)
            ORDER BY position ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut items: HashMap<Uuid, Vec<CartItemRecord>> = HashMap::new();
        for row in &item_rows {
            let cart_id: Uuid = row.try_get("cart_id")?;
            items.entry(cart_id).or_default().push(cart_item_from_row(row)?);
        }
        for cart in &mut carts {
            cart.items = items.remove(&cart.id.as_uuid()).unwrap_or_default();
        }
        Ok(carts)
    }

    /// Attaches items to order headers with one query.
    async fn with_order_items(&mut self, rows: Vec<PgRow>) -> Result<Vec<OrderRecord>> {
        let mut orders = rows.iter().map(order_from_row).collect::<Result<Vec<_>>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, sku, quantity,
                   unit_price_cents, total_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY position ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItemRecord>> = HashMap::new();
        for row in &item_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items
                .entry(order_id)
                .or_default()
                .push(order_item_from_row(row)?);
        }
        for order in &mut orders {
            order.items = items.remove(&order.id.as_uuid()).unwrap_or_default();
        }
        Ok(orders)
    }

    async fn insert_cart_items(&mut self, cart: &CartRecord) -> Result<()> {
        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, quantity, unit_price_cents, added_at, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(cart.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .bind(item.added_at)
            .bind(position as i32)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for PostgresTransaction {
    async fn insert_customer(&mut self, customer: &CustomerRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, email, first_name, last_name, phone, date_of_birth, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.email)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(customer.date_of_birth)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn find_customer_by_email(&mut self, email: &str) -> Result<Option<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE LOWER(email) = LOWER($1)");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn customer_email_exists(
        &mut self,
        email: &str,
        exclude: Option<CustomerId>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM customers
                WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude.map(|id| id.as_uuid()))
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn update_customer(&mut self, customer: &CustomerRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET email = $2, first_name = $3, last_name = $4, phone = $5,
                date_of_birth = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.email)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(customer.date_of_birth)
        .bind(customer.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", customer.id));
        }
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_customers(&mut self) -> Result<Vec<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at ASC");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(customer_from_row).collect()
    }

    async fn customer_has_orders(&mut self, id: CustomerId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE customer_id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl AddressRepository for PostgresTransaction {
    async fn insert_address(&mut self, address: &AddressRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, customer_id, street, address_line2, city, state, country,
                                   postal_code, address_type, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(address.id.as_uuid())
        .bind(address.customer_id.as_uuid())
        .bind(&address.street)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(address.address_type.as_str())
        .bind(address.is_default)
        .bind(address.created_at)
        .bind(address.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_address(&mut self, id: AddressId) -> Result<Option<AddressRecord>> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(address_from_row).transpose()
    }

    async fn list_addresses(&mut self, customer_id: CustomerId) -> Result<Vec<AddressRecord>> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE customer_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(address_from_row).collect()
    }

    async fn clear_default_addresses(&mut self, customer_id: CustomerId) -> Result<()> {
        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE customer_id = $1")
            .bind(customer_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for PostgresTransaction {
    async fn insert_category(&mut self, category: &CategoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, image_url, is_active, parent_category_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(category.parent_category_id.map(|id| id.as_uuid()))
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_category_by_name(&mut self, name: &str) -> Result<Option<CategoryRecord>> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE LOWER(name) = LOWER($1)");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn category_name_exists(
        &mut self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(exclude.map(|id| id.as_uuid()))
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn list_categories(&mut self) -> Result<Vec<CategoryRecord>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY LOWER(name) ASC");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn root_categories(&mut self) -> Result<Vec<CategoryRecord>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_category_id IS NULL ORDER BY LOWER(name) ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn subcategories(&mut self, parent: CategoryId) -> Result<Vec<CategoryRecord>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_category_id = $1 ORDER BY LOWER(name) ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(parent.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn update_category(&mut self, category: &CategoryRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = $2, description = $3, image_url = $4, is_active = $5,
                parent_category_id = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(category.parent_category_id.map(|id| id.as_uuid()))
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Category", category.id));
        }
        Ok(())
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn category_has_products(&mut self, id: CategoryId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn category_has_subcategories(&mut self, id: CategoryId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE parent_category_id = $1)",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ProductRepository for PostgresTransaction {
    async fn insert_product(&mut self, product: &ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, sku, stock_quantity, image_url,
                                  is_active, weight_grams, dimensions, category_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.sku)
        .bind(i64::from(product.stock_quantity))
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.weight_grams.map(i64::from))
        .bind(&product.dimensions)
        .bind(product.category_id.map(|id| id.as_uuid()))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRecord>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_product_by_sku(&mut self, sku: &str) -> Result<Option<ProductRecord>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE LOWER(sku) = LOWER($1)");
        let row = sqlx::query(&sql)
            .bind(sku)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn product_sku_exists(
        &mut self,
        sku: &str,
        exclude: Option<ProductId>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM products
                WHERE LOWER(sku) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(sku)
        .bind(exclude.map(|id| id.as_uuid()))
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn list_products(&mut self) -> Result<Vec<ProductRecord>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY LOWER(name) ASC");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn active_products(&mut self) -> Result<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active ORDER BY LOWER(name) ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn products_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> Result<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY LOWER(name) ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(category_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn search_products(&mut self, term: &str) -> Result<Vec<ProductRecord>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name ILIKE $1 OR description ILIKE $1 OR sku ILIKE $1
            ORDER BY LOWER(name) ASC
            "#
        );
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let rows = sqlx::query(&sql)
            .bind(format!("%{escaped}%"))
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update_product(&mut self, product: &ProductRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, sku = $5, stock_quantity = $6,
                image_url = $7, is_active = $8, weight_grams = $9, dimensions = $10,
                category_id = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.sku)
        .bind(i64::from(product.stock_quantity))
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.weight_grams.map(i64::from))
        .bind(&product.dimensions)
        .bind(product.category_id.map(|id| id.as_uuid()))
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", product.id));
        }
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<Option<u32>> {
        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $2, updated_at = NOW()
            WHERE id = $1 AND stock_quantity + $2 >= 0
            RETURNING stock_quantity
            "#,
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await?;
        stock.map(|s| quantity(s, "stock_quantity")).transpose()
    }
}

#[async_trait]
impl CartRepository for PostgresTransaction {
    async fn insert_cart(&mut self, cart: &CartRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shopping_carts (id, customer_id, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.customer_id.as_uuid())
        .bind(cart.expires_at)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&mut *self.tx)
        .await?;
        self.insert_cart_items(cart).await
    }

    async fn get_cart(&mut self, id: CartId) -> Result<Option<CartRecord>> {
        let sql = format!("SELECT {CART_COLUMNS} FROM shopping_carts WHERE id = $1");
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(self.with_cart_items(rows).await?.into_iter().next())
    }

    async fn latest_cart_for_customer(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<Option<CartRecord>> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM shopping_carts WHERE customer_id = $1 ORDER BY created_at DESC LIMIT 1"
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(self.with_cart_items(rows).await?.into_iter().next())
    }

    async fn save_cart(&mut self, cart: &CartRecord) -> Result<()> {
        let result = sqlx::query(
            "UPDATE shopping_carts SET expires_at = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(cart.id.as_uuid())
        .bind(cart.expires_at)
        .bind(cart.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cart", cart.id));
        }
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        self.insert_cart_items(cart).await
    }

    async fn delete_carts_inactive_since(&mut self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM shopping_carts WHERE COALESCE(updated_at, created_at) < $1")
                .bind(cutoff)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for PostgresTransaction {
    async fn insert_order(&mut self, order: &OrderRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, order_date, status, total_amount_cents,
                                notes, payment_method, shipping_address_id, billing_address_id,
                                shipped_date, delivered_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.customer_id.as_uuid())
        .bind(order.order_date)
        .bind(order.status.as_str())
        .bind(order.total_amount.cents())
        .bind(&order.notes)
        .bind(&order.payment_method)
        .bind(order.shipping_address_id.as_uuid())
        .bind(order.billing_address_id.as_uuid())
        .bind(order.shipped_date)
        .bind(order.delivered_date)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_name, sku, quantity,
                                         unit_price_cents, total_price_cents, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(&item.sku)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .bind(item.total_price.cents())
            .bind(position as i32)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderRecord>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(self.with_order_items(rows).await?.into_iter().next())
    }

    async fn find_order_by_number(&mut self, order_number: &str) -> Result<Option<OrderRecord>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");
        let rows = sqlx::query(&sql)
            .bind(order_number)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(self.with_order_items(rows).await?.into_iter().next())
    }

    async fn order_number_exists(&mut self, order_number: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(order_number)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderRecord>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date DESC");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        self.with_order_items(rows).await
    }

    async fn orders_for_customer(&mut self, customer_id: CustomerId) -> Result<Vec<OrderRecord>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY order_date DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        self.with_order_items(rows).await
    }

    async fn orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<OrderRecord>> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 ORDER BY order_date DESC");
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&mut *self.tx)
            .await?;
        self.with_order_items(rows).await
    }

    async fn orders_for_customer_between(
        &mut self,
        customer_id: CustomerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE customer_id = $1 AND order_date >= $2 AND order_date < $3
            ORDER BY order_date ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.as_uuid())
            .bind(from)
            .bind(to)
            .fetch_all(&mut *self.tx)
            .await?;
        self.with_order_items(rows).await
    }

    async fn update_order_header(&mut self, order: &OrderRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, notes = $3, shipped_date = $4, delivered_date = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.shipped_date)
        .bind(order.delivered_date)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", order.id));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for PostgresTransaction {
    async fn insert_payment(&mut self, payment: &PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, payment_method, amount_cents, status, transaction_id,
                                  gateway_response, processed_at, payment_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(&payment.payment_method)
        .bind(payment.amount.cents())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.gateway_response)
        .bind(payment.processed_at)
        .bind(payment.payment_date)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_payment(&mut self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn payment_for_order(&mut self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1");
        let row = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn find_payment_by_transaction_id(
        &mut self,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_id = $1");
        let row = sqlx::query(&sql)
            .bind(transaction_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn payments_by_status(&mut self, status: PaymentStatus) -> Result<Vec<PaymentRecord>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE status = $1 ORDER BY payment_date DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn pending_payments_before(
        &mut self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentRecord>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE status = $1 AND created_at < $2 ORDER BY created_at ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(PaymentStatus::Pending.as_str())
            .bind(cutoff)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn update_payment(&mut self, payment: &PaymentRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET payment_method = $2, amount_cents = $3, status = $4, transaction_id = $5,
                gateway_response = $6, processed_at = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.payment_method)
        .bind(payment.amount.cents())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.gateway_response)
        .bind(payment.processed_at)
        .bind(payment.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Payment", payment.id));
        }
        Ok(())
    }
}
