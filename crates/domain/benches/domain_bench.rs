use common::{AddressId, CartId, CustomerId, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    AddCartItem, CreateAddress, CreateCustomer, CreateOrder, CreateProduct, CustomerService,
    OrderService, ProductService, ShoppingCartService,
};
use store::InMemoryStore;

struct Seeded {
    store: InMemoryStore,
    customer_id: CustomerId,
    address_id: AddressId,
    products: Vec<ProductId>,
}

async fn seed(product_count: usize) -> Seeded {
    let store = InMemoryStore::new();
    let customers = CustomerService::new(store.clone());
    let customer = customers
        .create_customer(CreateCustomer {
            email: "bench@example.com".to_string(),
            first_name: "Bench".to_string(),
            last_name: "Mark".to_string(),
            phone: None,
            date_of_birth: None,
        })
        .await
        .unwrap();
    let address = customers
        .add_address(
            customer.id,
            CreateAddress {
                street: "1 Bench St".to_string(),
                address_line2: None,
                city: "Metric".to_string(),
                state: "CA".to_string(),
                country: "US".to_string(),
                postal_code: "90000".to_string(),
                address_type: Default::default(),
                is_default: true,
            },
        )
        .await
        .unwrap();

    let catalog = ProductService::new(store.clone());
    let mut products = Vec::with_capacity(product_count);
    for n in 0..product_count {
        let product = catalog
            .create_product(CreateProduct {
                name: format!("Product {n}"),
                description: Some(format!("Benchmark product number {n}")),
                price_cents: 100 + n as i64,
                sku: format!("BENCH-{n:04}"),
                stock_quantity: u32::MAX / 2,
                category_id: None,
                image_url: None,
                weight_grams: None,
                dimensions: None,
            })
            .await
            .unwrap();
        products.push(product.id);
    }

    Seeded {
        store,
        customer_id: customer.id,
        address_id: address.id,
        products,
    }
}

async fn fill_cart(seeded: &Seeded, lines: usize) -> CartId {
    let carts = ShoppingCartService::new(seeded.store.clone());
    let mut cart_id = None;
    for product_id in seeded.products.iter().take(lines) {
        let cart = carts
            .add_item(
                seeded.customer_id,
                AddCartItem {
                    product_id: *product_id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();
        cart_id = Some(cart.id);
    }
    cart_id.unwrap()
}

fn bench_add_to_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let seeded = rt.block_on(seed(1));
    let carts = ShoppingCartService::new(seeded.store.clone());
    let product_id = seeded.products[0];

    c.bench_function("domain/add_to_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cart = carts
                    .add_item(
                        seeded.customer_id,
                        AddCartItem {
                            product_id,
                            quantity: 1,
                        },
                    )
                    .await
                    .unwrap();
                carts.clear_cart(cart.id).await.unwrap();
            });
        });
    });
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let seeded = rt.block_on(seed(10));
    let orders = OrderService::new(seeded.store.clone());

    c.bench_function("domain/place_order_10_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cart_id = fill_cart(&seeded, 10).await;
                orders
                    .create_order(CreateOrder {
                        customer_id: seeded.customer_id,
                        cart_id,
                        shipping_address_id: seeded.address_id,
                        billing_address_id: seeded.address_id,
                        payment_method: "CreditCard".to_string(),
                        notes: None,
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let seeded = rt.block_on(seed(500));
    let catalog = ProductService::new(seeded.store.clone());

    c.bench_function("domain/search_500_products", |b| {
        b.iter(|| {
            rt.block_on(async {
                catalog.search_products("number 42").await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_add_to_cart, bench_place_order, bench_search);
criterion_main!(benches);
