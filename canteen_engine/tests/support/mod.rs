#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use canteen_common::Secret;
use canteen_engine::{
    db_types::{Customer, NewProduct, Order, Paise, Product, UserId},
    helpers::PaymentVerifier,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CatalogManagement, GatewayError, GatewayTransaction, PaymentGateway},
    SqliteDatabase,
};

pub const KEY_SECRET: &str = "rzp_test_secret";

/// A payment gateway that answers locally. Gateway order ids are derived from the order id.
#[derive(Clone, Default)]
pub struct StubGateway {
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    delay_ms: Arc<AtomicU64>,
}

impl StubGateway {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for StubGateway {
    fn key_id(&self) -> &str {
        "rzp_test_key"
    }

    async fn create_transaction(&self, order: &Order) -> Result<GatewayTransaction, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("stub gateway is down".into()));
        }
        Ok(GatewayTransaction {
            gateway_order_id: gateway_order_id(order),
            amount: order.total,
            currency: order.currency.clone(),
        })
    }
}

pub fn gateway_order_id(order: &Order) -> String {
    format!("order_stub{}", order.id.value())
}

pub fn verifier() -> PaymentVerifier {
    PaymentVerifier::new(Secret::new(KEY_SECRET.to_string()))
}

pub fn sign(gateway_order_id: &str, payment_id: &str) -> String {
    verifier().sign(gateway_order_id, payment_id).expect("signing failed")
}

pub async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn add_product(db: &SqliteDatabase, name: &str, rupees: i64, stock: i64) -> Product {
    let product = NewProduct::new(name, Paise::from(rupees * 100), stock).with_created_by("admin");
    db.insert_product(product).await.expect("Error inserting product")
}

pub fn user(id: &str) -> UserId {
    id.parse().expect("invalid user id")
}

pub fn customer(id: &str) -> Customer {
    Customer::new(user(id), format!("Customer {id}"), format!("{id}@example.com"))
}
