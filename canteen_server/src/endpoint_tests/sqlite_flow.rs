//! Full cart → checkout → payment runs against a real SQLite database, so that every request is served from whichever
//! pooled connection happens to be free.
use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_common::Secret;
use canteen_engine::{
    db_types::UserId,
    helpers::PaymentVerifier,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CartApi,
    CatalogApi,
    OrderFlowApi,
    OrdersApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::{
    helpers::{admin_token, delete_request, get_request, post_request, user_token},
    mocks::StubGateway,
};
use crate::{
    config::ServerOptions,
    routes::{
        AddToCartRoute,
        CheckoutRoute,
        CreateProductRoute,
        DeleteProductRoute,
        MyCartRoute,
        ProductByIdRoute,
        VerifyPaymentRoute,
    },
};

const KEY_SECRET: &str = "rzp_sqlite_flow_secret";

async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn routes(db: &SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    let db = db.clone();
    move |cfg: &mut ServiceConfig| {
        let verifier = PaymentVerifier::new(Secret::new(KEY_SECRET.to_string()));
        cfg.app_data(web::Data::new(CatalogApi::new(db.clone())))
            .app_data(web::Data::new(CartApi::new(db.clone())))
            .app_data(web::Data::new(OrderFlowApi::new(db, StubGateway, verifier)))
            .app_data(web::Data::new(ServerOptions::default()))
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, StubGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, StubGateway>::new());
    }
}

fn json_body(status: StatusCode, body: &str) -> Value {
    assert_eq!(status, StatusCode::OK, "{body}");
    serde_json::from_str(body).unwrap()
}

async fn create_product(db: &SqliteDatabase, name: &str, price: i64, quantity: i64) -> i64 {
    let body = json!({"name": name, "price": price, "quantity": quantity});
    let (status, body) = post_request(&admin_token(), "/admin/products", body, routes(db)).await.unwrap();
    json_body(status, &body)["id"].as_i64().unwrap()
}

async fn add_to_cart(db: &SqliteDatabase, user: &str, product: i64, quantity: i64) -> Value {
    let path = format!("/addtocart/{product}/{user}");
    let body = json!({"quantity": quantity});
    let (status, body) = post_request(&user_token(user), &path, body, routes(db)).await.unwrap();
    json_body(status, &body)
}

#[actix_web::test]
async fn cart_checkout_and_payment() {
    let _ = env_logger::try_init().ok();
    let db = new_database().await;
    let dosa = create_product(&db, "Masala Dosa", 6000, 5).await;

    add_to_cart(&db, "u-1", dosa, 1).await;
    let line = add_to_cart(&db, "u-1", dosa, 1).await;
    assert_eq!(line["cartLine"]["quantity"], 2);
    let (status, body) = get_request(&user_token("u-1"), "/user/cart", routes(&db)).await.unwrap();
    let cart = json_body(status, &body);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["grandTotal"], 12_000);

    let (status, body) = post_request(&user_token("u-1"), "/user/order", json!({}), routes(&db)).await.unwrap();
    let checkout = json_body(status, &body);
    assert_eq!(checkout["amount"], 12_000);
    let gateway_order_id = checkout["gatewayOrderID"].as_str().unwrap().to_string();
    let signature = PaymentVerifier::new(Secret::new(KEY_SECRET.to_string()))
        .sign(&gateway_order_id, "pay_sqlite")
        .unwrap();
    let verification = json!({
        "razorpay_payment_id": "pay_sqlite",
        "razorpay_order_id": gateway_order_id,
        "razorpay_signature": signature,
        "orderID": checkout["orderID"],
    });

    let (status, body) =
        post_request(&user_token("u-1"), "/user/payment/verify", verification.clone(), routes(&db)).await.unwrap();
    let paid = json_body(status, &body);
    assert_eq!(paid["message"], "Payment verified");
    assert_eq!(paid["order"]["status"], "Paid");
    assert_eq!(paid["order"]["isPaid"], true);
    assert_eq!(paid["cartCleared"], true);

    let (status, body) = get_request(&user_token("u-1"), &format!("/products/{dosa}"), routes(&db)).await.unwrap();
    assert_eq!(json_body(status, &body)["quantity"], 3);
    let (status, body) = get_request(&user_token("u-1"), "/user/cart", routes(&db)).await.unwrap();
    assert_eq!(json_body(status, &body)["items"], json!([]));

    // A replayed callback changes nothing
    let (status, body) =
        post_request(&user_token("u-1"), "/user/payment/verify", verification, routes(&db)).await.unwrap();
    assert_eq!(json_body(status, &body)["message"], "Payment was already verified");
    let (status, body) = get_request(&user_token("u-1"), &format!("/products/{dosa}"), routes(&db)).await.unwrap();
    assert_eq!(json_body(status, &body)["quantity"], 3);
}

#[actix_web::test]
async fn deleted_products_drop_out_of_carts_and_checkout() {
    let _ = env_logger::try_init().ok();
    let db = new_database().await;
    let coffee = create_product(&db, "Filter Coffee", 2000, 10).await;
    let cake = create_product(&db, "Plum Cake", 8000, 3).await;
    add_to_cart(&db, "u-2", coffee, 2).await;
    add_to_cart(&db, "u-2", cake, 1).await;

    let path = format!("/admin/products/{cake}");
    let (status, body) = delete_request(&admin_token(), &path, routes(&db)).await.unwrap();
    assert_eq!(json_body(status, &body)["message"], "Product deleted");

    let (status, body) = get_request(&user_token("u-2"), "/user/cart", routes(&db)).await.unwrap();
    let cart = json_body(status, &body);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["productId"], coffee);
    assert_eq!(cart["grandTotal"], 4000);

    let (status, body) = post_request(&user_token("u-2"), "/user/order", json!({}), routes(&db)).await.unwrap();
    assert_eq!(json_body(status, &body)["amount"], 4000);

    // Once only deleted products remain, the cart counts as empty
    let path = format!("/admin/products/{coffee}");
    let (status, body) = delete_request(&admin_token(), &path, routes(&db)).await.unwrap();
    json_body(status, &body);
    let (status, body) = post_request(&user_token("u-2"), "/user/order", json!({}), routes(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Your cart is empty"}"#);
}

#[actix_web::test]
async fn free_carts_cannot_check_out() {
    let _ = env_logger::try_init().ok();
    let db = new_database().await;
    let water = create_product(&db, "Drinking Water", 0, 50).await;
    add_to_cart(&db, "u-3", water, 2).await;

    let (status, _) = post_request(&user_token("u-3"), "/user/order", json!({}), routes(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let customer = "u-3".parse::<UserId>().unwrap();
    let orders = OrdersApi::new(db.clone()).history(&customer).await.unwrap();
    assert!(orders.is_empty());
}
