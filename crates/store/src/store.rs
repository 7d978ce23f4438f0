use async_trait::async_trait;

use crate::{
    AddressRepository, CartRepository, CategoryRepository, CustomerRepository, OrderRepository,
    PaymentRepository, ProductRepository, Result,
};

/// A unit of work.
///
/// Every repository operation performed through a transaction becomes visible
/// to other transactions only after [`Transaction::commit`]. Dropping a
/// transaction without committing discards its writes.
#[async_trait]
pub trait Transaction:
    CustomerRepository
    + AddressRepository
    + CategoryRepository
    + ProductRepository
    + CartRepository
    + OrderRepository
    + PaymentRepository
    + Send
{
    async fn commit(self) -> Result<()>
    where
        Self: Sized;
}

/// Core trait for store implementations.
///
/// A store hands out transactions. All implementations must be cheap to clone
/// and thread-safe.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: Transaction;

    /// Starts a new unit of work.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Checks that the backing database is reachable.
    async fn ping(&self) -> Result<()>;
}
