use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_engine::{
    db_types::{OrderId, OrderStatusType},
    traits::OrderManagementError,
    OrdersApi,
};

use super::{
    helpers::{admin_token, get_request, patch_request, user_token},
    mocks::{order, MockCanteenDb},
};
use crate::routes::{AllOrdersRoute, MarkDeliveredRoute, MyOrderHistoryRoute};

#[actix_web::test]
async fn my_history_only_has_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(&user_token("u-1"), "/user/order/history", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["customerId"] == "u-1"));
    assert_eq!(orders[0]["items"][0]["unitPrice"], 6000);
}

#[actix_web::test]
async fn users_cannot_list_all_orders() {
    let _ = env_logger::try_init().ok();
    let err = get_request(&user_token("u-1"), "/admin/orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. The user role cannot access this resource");
}

#[actix_web::test]
async fn admin_lists_all_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&admin_token(), "/admin/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["orders"].as_array().map(|a| a.len()), Some(3));
}

#[actix_web::test]
async fn users_cannot_deliver_orders() {
    let _ = env_logger::try_init().ok();
    let err = patch_request(&user_token("u-1"), "/admin/order/1/deliver", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. The user role cannot access this resource");
}

#[actix_web::test]
async fn deliver_paid_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        patch_request(&admin_token(), "/admin/order/2/deliver", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Order marked as delivered");
    assert_eq!(body["order"]["status"], "Delivered");
    assert_eq!(body["order"]["delivered"], true);
}

#[actix_web::test]
async fn deliver_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        patch_request(&admin_token(), "/admin/order/1/deliver", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Order #1 cannot move from Pending to Delivered"}"#);
}

#[actix_web::test]
async fn deliver_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        patch_request(&admin_token(), "/admin/order/404/deliver", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockCanteenDb::new();
    db.expect_fetch_orders_for_customer().withf(|customer| customer.as_str() == "u-1").returning(|customer| {
        let customer = customer.as_str();
        Ok(vec![order(2, customer, OrderStatusType::Paid), order(1, customer, OrderStatusType::Pending)])
    });
    db.expect_fetch_all_orders().returning(|| {
        Ok(vec![
            order(3, "u-2", OrderStatusType::Delivered),
            order(2, "u-1", OrderStatusType::Paid),
            order(1, "u-1", OrderStatusType::Pending),
        ])
    });
    db.expect_mark_delivered().withf(|_, allow_unpaid| !*allow_unpaid).returning(|id, _| match id.value() {
        1 => Err(OrderManagementError::InvalidTransition {
            order_id: id,
            from: OrderStatusType::Pending,
            to: OrderStatusType::Delivered,
        }),
        2 => Ok(order(2, "u-1", OrderStatusType::Delivered)),
        _ => Err(OrderManagementError::OrderNotFound(OrderId(id.value()))),
    });
    let api = OrdersApi::new(db);
    cfg.app_data(web::Data::new(api))
        .service(MyOrderHistoryRoute::<MockCanteenDb>::new())
        .service(AllOrdersRoute::<MockCanteenDb>::new())
        .service(MarkDeliveredRoute::<MockCanteenDb>::new());
}
