use canteen_engine::{
    db_types::{
        CartEntry,
        CartLine,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Paise,
        Product,
        ProductId,
        ProductUpdate,
        UserId,
    },
    traits::{
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        GatewayError,
        GatewayTransaction,
        OrderManagement,
        OrderManagementError,
        PaymentApplied,
        PaymentConfirmation,
        PaymentGateway,
    },
};
use chrono::{TimeZone, Utc};
use mockall::mock;

mock! {
    pub CanteenDb {}
    impl Clone for CanteenDb {
        fn clone(&self) -> Self;
    }
    impl CatalogManagement for CanteenDb {
        async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;
        async fn fetch_available_products(&self) -> Result<Vec<Product>, CatalogError>;
        async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;
        async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError>;
        async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError>;
        async fn check_available(&self, id: ProductId) -> Result<i64, CatalogError>;
        async fn debit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError>;
        async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError>;
    }
    impl CartManagement for CanteenDb {
        async fn add_to_cart(&self, user: &UserId, product: ProductId, quantity: i64) -> Result<CartLine, CartError>;
        async fn set_cart_quantity(&self, user: &UserId, product: ProductId, quantity: i64) -> Result<CartLine, CartError>;
        async fn remove_from_cart(&self, user: &UserId, product: ProductId) -> Result<(), CartError>;
        async fn fetch_cart(&self, user: &UserId) -> Result<Vec<CartEntry>, CartError>;
        async fn clear_cart(&self, user: &UserId) -> Result<u64, CartError>;
    }
    impl OrderManagement for CanteenDb {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;
        async fn bind_gateway_order(&self, id: OrderId, gateway_order_id: &str) -> Result<Order, OrderManagementError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderManagementError>;
        async fn fetch_orders_for_customer(&self, customer_id: &UserId) -> Result<Vec<Order>, OrderManagementError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderManagementError>;
        async fn apply_payment(&self, id: OrderId, confirmation: &PaymentConfirmation) -> Result<PaymentApplied, OrderManagementError>;
        async fn mark_delivered(&self, id: OrderId, allow_unpaid: bool) -> Result<Order, OrderManagementError>;
    }
}

pub const STUB_KEY_ID: &str = "rzp_test_key";

/// A gateway that accepts every order, naming the remote transaction after the order number.
#[derive(Debug, Clone, Default)]
pub struct StubGateway;

impl PaymentGateway for StubGateway {
    fn key_id(&self) -> &str {
        STUB_KEY_ID
    }

    async fn create_transaction(&self, order: &Order) -> Result<GatewayTransaction, GatewayError> {
        Ok(GatewayTransaction {
            gateway_order_id: format!("order_stub{}", order.id.value()),
            amount: order.total,
            currency: order.currency.clone(),
        })
    }
}

pub fn product(id: i64, name: &str, price: i64, quantity: i64) -> Product {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Product {
        id: ProductId(id),
        name: name.to_string(),
        description: String::new(),
        price: Paise::from(price),
        quantity,
        created_by: "canteen-admin".into(),
        created_at,
        updated_at: created_at,
    }
}

pub fn order(id: i64, customer: &str, status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let item = OrderItem {
        product_id: ProductId(1),
        name: "Masala Dosa".into(),
        unit_price: Paise::from(6000),
        quantity: 2,
        line_total: Paise::from(12000),
    };
    let is_paid = status != OrderStatusType::Pending;
    Order {
        id: OrderId(id),
        customer_id: customer.parse().unwrap(),
        customer_name: format!("{customer}-name"),
        customer_email: format!("{customer}@example.com"),
        items: vec![item],
        total: Paise::from(12000),
        currency: "INR".into(),
        status,
        payment_method: "razorpay".into(),
        is_paid,
        delivered: status == OrderStatusType::Delivered,
        gateway_order_id: Some(format!("order_stub{id}")),
        gateway_payment_id: is_paid.then(|| "pay_stub".to_string()),
        created_at,
        updated_at: created_at,
    }
}
