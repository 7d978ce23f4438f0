//! Integration tests for the shop services.
//!
//! These tests drive complete flows through the public service API against the
//! in-memory store: catalog setup, carts, order placement and cancellation.

use common::{AddressId, CartId, CategoryId, CustomerId, OrderStatus, ProductId};
use domain::{
    AddCartItem, CategoryService, CreateAddress, CreateCategory, CreateCustomer, CreateOrder,
    CreateProduct, CustomerService, DomainError, OrderService, ProductService,
    ShoppingCartService,
};
use store::InMemoryStore;

struct Shop {
    store: InMemoryStore,
    customers: CustomerService<InMemoryStore>,
    categories: CategoryService<InMemoryStore>,
    products: ProductService<InMemoryStore>,
    carts: ShoppingCartService<InMemoryStore>,
    orders: OrderService<InMemoryStore>,
}

impl Shop {
    fn new() -> Self {
        let store = InMemoryStore::new();
        Self {
            customers: CustomerService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            products: ProductService::new(store.clone()),
            carts: ShoppingCartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
        }
    }

    async fn customer(&self, email: &str) -> (CustomerId, AddressId) {
        let customer = self
            .customers
            .create_customer(CreateCustomer {
                email: email.to_string(),
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                phone: Some("+1 555 0100".to_string()),
                date_of_birth: None,
            })
            .await
            .unwrap();
        let address = self
            .customers
            .add_address(
                customer.id,
                CreateAddress {
                    street: "10 Harbour Rd".to_string(),
                    address_line2: None,
                    city: "Arlington".to_string(),
                    state: "VA".to_string(),
                    country: "US".to_string(),
                    postal_code: "22201".to_string(),
                    address_type: Default::default(),
                    is_default: true,
                },
            )
            .await
            .unwrap();
        (customer.id, address.id)
    }

    async fn product(&self, sku: &str, price_cents: i64, stock: u32) -> ProductId {
        self.products
            .create_product(CreateProduct {
                name: format!("Product {sku}"),
                description: None,
                price_cents,
                sku: sku.to_string(),
                stock_quantity: stock,
                category_id: None,
                image_url: None,
                weight_grams: None,
                dimensions: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn add(&self, customer_id: CustomerId, product_id: ProductId, quantity: u32) -> CartId {
        self.carts
            .add_item(
                customer_id,
                AddCartItem {
                    product_id,
                    quantity,
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn stock(&self, product_id: ProductId) -> u32 {
        self.products
            .get_product(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    fn order(customer_id: CustomerId, cart_id: CartId, address_id: AddressId) -> CreateOrder {
        CreateOrder {
            customer_id,
            cart_id,
            shipping_address_id: address_id,
            billing_address_id: address_id,
            payment_method: "DebitCard".to_string(),
            notes: Some("Leave at the door".to_string()),
        }
    }
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn order_total_is_sum_of_lines() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("total@example.com").await;
        let pen = shop.product("PEN-1", 150, 100).await;
        let pad = shop.product("PAD-1", 425, 100).await;

        shop.add(customer, pen, 4).await;
        let cart = shop.add(customer, pad, 3).await;

        let order = shop
            .orders
            .create_order(Shop::order(customer, cart, address))
            .await
            .unwrap();

        let expected: i64 = order
            .items
            .iter()
            .map(|i| i64::from(i.quantity) * i.unit_price_cents)
            .sum();
        assert_eq!(order.total_amount_cents, expected);
        assert_eq!(order.total_amount_cents, 4 * 150 + 3 * 425);
        assert_eq!(order.notes.as_deref(), Some("Leave at the door"));
    }

    #[tokio::test]
    async fn placing_and_cancelling_moves_stock() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("stock@example.com").await;
        let mug = shop.product("MUG-1", 900, 10).await;
        let cart = shop.add(customer, mug, 3).await;

        let order = shop
            .orders
            .create_order(Shop::order(customer, cart, address))
            .await
            .unwrap();
        assert_eq!(shop.stock(mug).await, 7);

        assert!(shop.orders.cancel_order(order.id).await.unwrap());
        assert_eq!(shop.stock(mug).await, 10);

        let cancelled = shop.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn unit_price_is_snapshotted_at_placement() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("snapshot@example.com").await;
        let lamp = shop.product("LAMP-1", 3000, 5).await;
        let cart = shop.add(customer, lamp, 1).await;

        let order = shop
            .orders
            .create_order(Shop::order(customer, cart, address))
            .await
            .unwrap();

        shop.products
            .update_product(
                lamp,
                domain::UpdateProduct {
                    price_cents: Some(3500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = shop.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].unit_price_cents, 3000);
        assert_eq!(stored.total_amount_cents, 3000);
    }

    #[tokio::test]
    async fn order_numbers_are_unique_and_well_formed() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("numbers@example.com").await;
        let clip = shop.product("CLIP-1", 10, 1000).await;

        let mut numbers = std::collections::HashSet::new();
        for _ in 0..20 {
            let cart = shop.add(customer, clip, 1).await;
            let order = shop
                .orders
                .create_order(Shop::order(customer, cart, address))
                .await
                .unwrap();

            let number = &order.order_number;
            let parts: Vec<&str> = number.split('-').collect();
            assert_eq!(parts.len(), 3, "{number}");
            assert_eq!(parts[0], "ORD");
            assert!(parts[1].len() == 14 && parts[1].chars().all(|c| c.is_ascii_digit()));
            assert!(parts[2].len() == 4 && parts[2].chars().all(|c| c.is_ascii_digit()));
            assert!(numbers.insert(number.clone()), "duplicate {number}");
        }

        let found = shop.orders.customer_orders(customer).await.unwrap();
        assert_eq!(found.len(), 20);
    }
}

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn failed_placement_leaves_stock_and_cart_untouched() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("atomic@example.com").await;
        let plenty = shop.product("PLENTY-1", 100, 50).await;
        let scarce = shop.product("SCARCE-1", 100, 2).await;

        shop.add(customer, plenty, 5).await;
        let cart = shop.add(customer, scarce, 2).await;

        // Someone else buys the scarce item after it was added to the cart.
        shop.products.update_stock(scarce, 1).await.unwrap();

        let result = shop
            .orders
            .create_order(Shop::order(customer, cart, address))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            })
        ));

        assert_eq!(shop.stock(plenty).await, 50);
        assert_eq!(shop.stock(scarce).await, 1);
        let cart = shop.carts.get_cart(cart).await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 2);
        assert!(shop.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cannot_cancel_shipped_or_delivered_orders() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("shipped@example.com").await;
        let book = shop.product("BOOK-1", 1999, 10).await;
        let cart = shop.add(customer, book, 1).await;
        let order = shop
            .orders
            .create_order(Shop::order(customer, cart, address))
            .await
            .unwrap();

        for status in [OrderStatus::Processing, OrderStatus::Shipped] {
            shop.orders
                .update_order_status(order.id, status)
                .await
                .unwrap();
        }
        let result = shop.orders.cancel_order(order.id).await;
        assert!(
            matches!(result, Err(DomainError::BusinessRule(ref m)) if m == "Cannot cancel shipped or delivered orders")
        );

        shop.orders
            .update_order_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert!(shop.orders.cancel_order(order.id).await.is_err());
        assert_eq!(shop.stock(book).await, 9);
    }

    #[tokio::test]
    async fn duplicate_customer_email_is_rejected() {
        let shop = Shop::new();
        shop.customer("dup@example.com").await;

        let result = shop
            .customers
            .create_customer(CreateCustomer {
                email: "DUP@example.com".to_string(),
                first_name: "Another".to_string(),
                last_name: "Person".to_string(),
                phone: None,
                date_of_birth: None,
            })
            .await;
        assert!(matches!(result, Err(DomainError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn address_of_another_customer_is_rejected() {
        let shop = Shop::new();
        let (alice, _) = shop.customer("alice@example.com").await;
        let (_, bob_address) = shop.customer("bob@example.com").await;
        let tea = shop.product("TEA-9", 500, 10).await;
        let cart = shop.add(alice, tea, 1).await;

        let result = shop
            .orders
            .create_order(Shop::order(alice, cart, bob_address))
            .await;
        assert!(matches!(result, Err(DomainError::BusinessRule(_))));
        assert_eq!(shop.stock(tea).await, 10);
    }
}

mod catalog {
    use super::*;

    fn category(name: &str, parent: Option<CategoryId>) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            description: None,
            image_url: None,
            parent_category_id: parent,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn category_with_products_or_children_cannot_be_deleted() {
        let shop = Shop::new();
        let garden = shop
            .categories
            .create_category(category("Garden", None))
            .await
            .unwrap();
        let tools = shop
            .categories
            .create_category(category("Tools", Some(garden.id)))
            .await
            .unwrap();
        let rake = shop
            .products
            .create_product(CreateProduct {
                name: "Rake".to_string(),
                description: None,
                price_cents: 2500,
                sku: "RAKE-1".to_string(),
                stock_quantity: 3,
                category_id: Some(tools.id),
                image_url: None,
                weight_grams: None,
                dimensions: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            shop.categories.delete_category(garden.id).await,
            Err(DomainError::BusinessRule(_))
        ));
        assert!(matches!(
            shop.categories.delete_category(tools.id).await,
            Err(DomainError::BusinessRule(_))
        ));

        assert!(shop.products.delete_product(rake.id).await.unwrap());
        assert!(shop.categories.delete_category(tools.id).await.unwrap());
        assert!(shop.categories.delete_category(garden.id).await.unwrap());
        assert!(!shop.categories.delete_category(garden.id).await.unwrap());
    }

    #[test]
    fn category_defaults_to_active_when_deserialized() {
        let cmd: CreateCategory = serde_json::from_str(r#"{"name": "Kitchen"}"#).unwrap();
        assert!(cmd.is_active);
        assert!(cmd.parent_category_id.is_none());
    }

    #[tokio::test]
    async fn adding_same_product_increments_the_line() {
        let shop = Shop::new();
        let (customer, _) = shop.customer("lines@example.com").await;
        let soap = shop.product("SOAP-1", 350, 20).await;

        shop.add(customer, soap, 2).await;
        let cart_id = shop.add(customer, soap, 3).await;

        let cart = shop.carts.get_cart(cart_id).await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total_items, 5);
        assert_eq!(cart.total_amount_cents, 1750);
    }

    #[tokio::test]
    async fn customer_with_orders_cannot_be_deleted() {
        let shop = Shop::new();
        let (customer, address) = shop.customer("keep@example.com").await;
        let cup = shop.product("CUP-1", 400, 4).await;
        let cart = shop.add(customer, cup, 1).await;
        shop.orders
            .create_order(Shop::order(customer, cart, address))
            .await
            .unwrap();

        assert!(matches!(
            shop.customers.delete_customer(customer).await,
            Err(DomainError::BusinessRule(_))
        ));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn last_unit_is_sold_once() {
        let shop = Shop::new();
        let (first, first_address) = shop.customer("first@example.com").await;
        let (second, second_address) = shop.customer("second@example.com").await;
        let vase = shop.product("VASE-1", 12000, 1).await;
        let first_cart = shop.add(first, vase, 1).await;
        let second_cart = shop.add(second, vase, 1).await;

        let orders = OrderService::new(shop.store.clone());
        let (a, b) = tokio::join!(
            orders.create_order(Shop::order(first, first_cart, first_address)),
            orders.create_order(Shop::order(second, second_cart, second_address)),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(shop.stock(vase).await, 0);
    }
}
