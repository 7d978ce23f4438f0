//! Shared application state and its wiring.

use std::sync::Arc;

use cache::{
    CacheService, CachedCustomerService, CachedOrderService, CachedProductService,
    CachedShoppingCartService, InMemoryCache,
};
use domain::{
    CategoryService, CustomerService, OrderService, PaymentService, ProductService,
    ShoppingCartService,
};
use reporting::{LogMailer, Mailer, ReportService, ResiliencePolicy, ResilientMailer, Sender};
use store::Store;

use crate::config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub cache: Arc<dyn CacheService>,
    pub customers: CachedCustomerService<S>,
    pub categories: CategoryService<S>,
    pub products: CachedProductService<S>,
    pub carts: CachedShoppingCartService<S>,
    pub orders: CachedOrderService<S>,
    pub payments: PaymentService<S>,
    pub reports: ReportService<S>,
    /// Policy guarding outbound mail, when mail goes through one.
    pub mail_policy: Option<Arc<ResiliencePolicy>>,
}

impl<S: Store> AppState<S> {
    /// Wires every service over one store and one cache.
    pub fn new(store: S, cache: Arc<dyn CacheService>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            customers: CachedCustomerService::new(
                CustomerService::new(store.clone()),
                cache.clone(),
            ),
            categories: CategoryService::new(store.clone()),
            products: CachedProductService::new(ProductService::new(store.clone()), cache.clone()),
            carts: CachedShoppingCartService::new(
                ShoppingCartService::new(store.clone()),
                cache.clone(),
            ),
            orders: CachedOrderService::new(OrderService::new(store.clone()), cache.clone()),
            payments: PaymentService::new(store.clone()),
            reports: ReportService::new(store.clone(), mailer),
            mail_policy: None,
            cache,
            store,
        }
    }
}

/// Creates the production application state: an in-process cache and a
/// logging mailer behind the resilience policy.
pub fn create_default_state<S: Store>(store: S, config: &Config) -> Arc<AppState<S>> {
    let cache: Arc<dyn CacheService> = Arc::new(InMemoryCache::new(config.cache_max_entries));
    let policy = Arc::new(ResiliencePolicy::new("email"));
    let mailer = ResilientMailer::new(
        LogMailer::new(Sender {
            address: config.mail_from_address.clone(),
            name: config.mail_from_name.clone(),
        }),
        policy.clone(),
    );

    let mut state = AppState::new(store, cache, Arc::new(mailer));
    state.mail_policy = Some(policy);
    Arc::new(state)
}
