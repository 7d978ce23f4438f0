//! Business rules for the online shop.
//!
//! This crate provides one service per aggregate:
//! - [`CustomerService`] for customers and their addresses
//! - [`CategoryService`] and [`ProductService`] for the catalog
//! - [`ShoppingCartService`] for carts
//! - [`OrderService`] for order placement and the order lifecycle
//! - [`PaymentService`] for payments and refunds
//!
//! Every service is generic over a [`store::Store`] and runs each operation
//! in one store transaction.

pub mod cart;
pub mod category;
pub mod customer;
pub mod error;
pub mod order;
pub mod payment;
pub mod product;
pub mod validation;

pub use cart::{AddCartItem, CartItemView, CartView, ShoppingCartService};
pub use category::{CategoryService, CategoryView, CreateCategory, UpdateCategory};
pub use customer::{
    AddressView, CreateAddress, CreateCustomer, CustomerService, CustomerView, UpdateCustomer,
};
pub use error::{DomainError, Result};
pub use order::{CreateOrder, OrderItemView, OrderService, OrderView, generate_order_number};
pub use payment::{PaymentService, PaymentView, RecordPayment};
pub use product::{CreateProduct, ProductService, ProductView, UpdateProduct};
