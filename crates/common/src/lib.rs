//! Shared types for the online shop workspace.
//!
//! - Typed UUID identifiers for every entity
//! - [`Money`] in integer cents
//! - Order, payment and address enums, including the order status state machine

pub mod money;
pub mod status;
pub mod types;

pub use money::Money;
pub use status::{AddressType, OrderStatus, PaymentStatus, UnknownVariant};
pub use types::{
    AddressId, CartId, CartItemId, CategoryId, CustomerId, OrderId, OrderItemId, PaymentId,
    ProductId,
};
