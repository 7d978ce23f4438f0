//! Orders: placement, fulfilment and cancellation.

mod number;
mod service;

use chrono::{DateTime, Utc};
use common::{AddressId, CartId, CustomerId, OrderId, OrderItemId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};
use store::{OrderItemRecord, OrderRecord};

pub use number::generate_order_number;
pub use service::OrderService;

/// Request to turn a cart into an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub customer_id: CustomerId,
    pub cart_id: CartId,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl From<OrderItemRecord> for OrderItemView {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            sku: item.sku,
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            total_price_cents: item.total_price.cents(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub notes: Option<String>,
    pub payment_method: String,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<OrderRecord> for OrderView {
    fn from(o: OrderRecord) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            customer_id: o.customer_id,
            order_date: o.order_date,
            status: o.status,
            total_amount_cents: o.total_amount.cents(),
            notes: o.notes,
            payment_method: o.payment_method,
            shipping_address_id: o.shipping_address_id,
            billing_address_id: o.billing_address_id,
            shipped_date: o.shipped_date,
            delivered_date: o.delivered_date,
            items: o.items.into_iter().map(Into::into).collect(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}
