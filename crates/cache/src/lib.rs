//! Caching for the shop services.
//!
//! - [`CacheService`] trait over a JSON value cache, with a Moka-backed
//!   [`InMemoryCache`]
//! - Cache-aside decorators for products and carts
//! - [`CachedOrderService`], which drops stale stock and cart entries after
//!   order placement and cancellation
//! - [`CachedCustomerService`], which drops cart entries of deleted customers
//!
//! Cache failures are logged and treated as misses; they never fail a request.

pub mod carts;
pub mod customers;
pub mod error;
pub mod memory;
pub mod orders;
pub mod products;
pub mod service;

pub use carts::CachedShoppingCartService;
pub use customers::CachedCustomerService;
pub use error::{CacheError, Result};
pub use memory::InMemoryCache;
pub use orders::CachedOrderService;
pub use products::CachedProductService;
pub use service::{CacheService, DEFAULT_TTL};
