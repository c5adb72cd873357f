use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_common::Secret;
use canteen_engine::{
    db_types::{CartEntry, OrderId, OrderStatusType, Paise, ProductId},
    helpers::PaymentVerifier,
    traits::{OrderManagementError, PaymentApplied},
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{admin_token, post_request, user_token},
    mocks::{order, MockCanteenDb, StubGateway, STUB_KEY_ID},
};
use crate::{
    config::ServerOptions,
    routes::{CheckoutRoute, VerifyPaymentRoute},
};

const KEY_SECRET: &str = "rzp_test_secret";

fn sign(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    PaymentVerifier::new(Secret::new(KEY_SECRET.to_string())).sign(gateway_order_id, gateway_payment_id).unwrap()
}

fn verification(order_id: serde_json::Value, gateway_order_id: &str, signature: &str) -> serde_json::Value {
    json!({
        "razorpay_payment_id": "pay_stub",
        "razorpay_order_id": gateway_order_id,
        "razorpay_signature": signature,
        "orderID": order_id,
    })
}

#[actix_web::test]
async fn checkout() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&user_token("u-1"), "/user/order", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["orderID"], 1);
    assert_eq!(body["gatewayOrderID"], "order_stub1");
    assert_eq!(body["amount"], 12000);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["key"], STUB_KEY_ID);
    assert_eq!(body["user"]["name"], "u-1-name");
    assert_eq!(body["user"]["email"], "u-1@example.com");
}

#[actix_web::test]
async fn checkout_with_empty_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&user_token("u-empty"), "/user/order", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Your cart is empty"}"#);
}

#[actix_web::test]
async fn admins_cannot_check_out() {
    let _ = env_logger::try_init().ok();
    let err = post_request(&admin_token(), "/user/order", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. The admin role cannot access this resource");
}

#[actix_web::test]
async fn verify_payment() {
    let _ = env_logger::try_init().ok();
    let body = verification(json!(1), "order_stub1", &sign("order_stub1", "pay_stub"));
    let (status, body) =
        post_request(&user_token("u-1"), "/user/payment/verify", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Payment verified");
    assert_eq!(body["order"]["status"], "Paid");
    assert_eq!(body["order"]["isPaid"], true);
    assert_eq!(body["cartCleared"], true);
}

#[actix_web::test]
async fn repeated_verification_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = verification(json!("5"), "order_stub5", &sign("order_stub5", "pay_stub"));
    let (status, body) =
        post_request(&user_token("u-1"), "/user/payment/verify", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Payment was already verified");
    assert_eq!(body["cartCleared"], false);
}

#[actix_web::test]
async fn bad_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let signature = sign("order_stub1", "pay_other");
    let body = verification(json!(1), "order_stub1", &signature);
    let (status, body) =
        post_request(&user_token("u-1"), "/user/payment/verify", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid payment signature"), "{body}");
}

#[actix_web::test]
async fn stock_conflict_is_reported() {
    let _ = env_logger::try_init().ok();
    let body = verification(json!(9), "order_stub9", &sign("order_stub9", "pay_stub"));
    let (status, _) =
        post_request(&user_token("u-1"), "/user/payment/verify", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn malformed_verification_body() {
    let _ = env_logger::try_init().ok();
    let body = json!({"razorpay_payment_id": "pay_stub", "orderID": 1});
    let (status, _) =
        post_request(&user_token("u-1"), "/user/payment/verify", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockCanteenDb::new();
    db.expect_fetch_cart().returning(|user| match user.as_str() {
        "u-1" => Ok(vec![CartEntry {
            product_id: ProductId(1),
            name: "Masala Dosa".into(),
            description: String::new(),
            unit_price: Paise::from(6000),
            quantity: 2,
            stock_remaining: 12,
            line_total: Paise::from(12000),
        }]),
        _ => Ok(vec![]),
    });
    db.expect_insert_order()
        .withf(|o| o.total == Paise::from(12000) && o.items.len() == 1 && o.customer.email == "u-1@example.com")
        .returning(|_| {
            let mut pending = order(1, "u-1", OrderStatusType::Pending);
            pending.gateway_order_id = None;
            Ok(pending)
        });
    db.expect_bind_gateway_order()
        .withf(|id, gateway_order_id| *id == OrderId(1) && gateway_order_id.to_string() == "order_stub1")
        .returning(|_, _| Ok(order(1, "u-1", OrderStatusType::Pending)));
    db.expect_apply_payment().returning(|id, confirmation| {
        assert_eq!(confirmation.gateway_payment_id, "pay_stub");
        match id.value() {
            1 => Ok(PaymentApplied::Applied(order(1, "u-1", OrderStatusType::Paid))),
            5 => Ok(PaymentApplied::AlreadyApplied(order(5, "u-1", OrderStatusType::Paid))),
            _ => Err(OrderManagementError::StockConflict { order_id: id, product_id: ProductId(1), requested: 2 }),
        }
    });
    db.expect_clear_cart().returning(|_| Ok(1));
    let verifier = PaymentVerifier::new(Secret::new(KEY_SECRET.to_string()));
    let api = OrderFlowApi::new(db, StubGateway, verifier);
    cfg.app_data(web::Data::new(api))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(CheckoutRoute::<MockCanteenDb, StubGateway>::new())
        .service(VerifyPaymentRoute::<MockCanteenDb, StubGateway>::new());
}
