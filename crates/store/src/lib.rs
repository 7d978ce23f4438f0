//! Persistence layer for the online shop.
//!
//! Each entity has its own repository trait. A [`Transaction`] implements all
//! of them and groups their writes into one unit of work; a [`Store`] starts
//! transactions. Two implementations are provided:
//!
//! - [`InMemoryStore`] for tests and local development
//! - [`PostgresStore`] backed by sqlx

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod repository;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use records::{
    AddressRecord, CartItemRecord, CartRecord, CategoryRecord, CustomerRecord, OrderItemRecord,
    OrderRecord, PaymentRecord, ProductRecord,
};
pub use repository::{
    AddressRepository, CartRepository, CategoryRepository, CustomerRepository, OrderRepository,
    PaymentRepository, ProductRepository,
};
pub use store::{Store, Transaction};
