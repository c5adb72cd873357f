use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_engine::{
    db_types::{ProductId, ProductUpdate},
    traits::CatalogError,
    CatalogApi,
};
use serde_json::json;

use super::{
    helpers::{admin_token, delete_request, get_request, post_request, put_request, user_token},
    mocks::{product, MockCanteenDb},
};
use crate::routes::{CreateProductRoute, DeleteProductRoute, ProductByIdRoute, ProductsRoute, UpdateProductRoute};

#[actix_web::test]
async fn list_products_without_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/products", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. No bearer token was provided.");
}

#[actix_web::test]
async fn list_products_with_a_forged_token() {
    let _ = env_logger::try_init().ok();
    let mut token = user_token("u-1");
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let err = get_request(&token, "/products", configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error. Access token is invalid."), "{err}");
}

#[actix_web::test]
async fn list_products() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&user_token("u-1"), "/products", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let products: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(products[0]["name"], "Masala Dosa");
    assert_eq!(products[0]["price"], 6000);
    assert_eq!(products[1]["createdBy"], "canteen-admin");
}

#[actix_web::test]
async fn fetch_missing_product() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&admin_token(), "/products/99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product 99 does not exist"}"#);
}

#[actix_web::test]
async fn fetch_product_with_malformed_id() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(&user_token("u-1"), "/products/65f1c0ffee", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn users_cannot_create_products() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Vada Pav", "price": 2500, "quantity": 10});
    let err = post_request(&user_token("u-1"), "/admin/products", body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. The user role cannot access this resource");
}

#[actix_web::test]
async fn admin_creates_product() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Vada Pav", "description": "Spicy", "price": 2500, "quantity": 10});
    let (status, body) =
        post_request(&admin_token(), "/admin/products", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let product: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(product["id"], 3);
    assert_eq!(product["createdBy"], "canteen-admin-name");
}

#[actix_web::test]
async fn negative_prices_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Vada Pav", "price": -1, "quantity": 10});
    let (status, _) = post_request(&admin_token(), "/admin/products", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn admin_restocks_product() {
    let _ = env_logger::try_init().ok();
    let body = json!({"quantity": 40});
    let (status, body) =
        put_request(&admin_token(), "/admin/products/2", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let product: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(product["quantity"], 40);
}

#[actix_web::test]
async fn admin_deletes_product() {
    let _ = env_logger::try_init().ok();
    let (status, body) = delete_request(&admin_token(), "/admin/products/2", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Product deleted"}"#);
    let (status, body) = delete_request(&admin_token(), "/admin/products/7", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product 7 does not exist"}"#);
}

#[actix_web::test]
async fn users_cannot_delete_products() {
    let _ = env_logger::try_init().ok();
    let err = delete_request(&user_token("u-1"), "/admin/products/2", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. The user role cannot access this resource");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockCanteenDb::new();
    db.expect_fetch_available_products()
        .returning(|| Ok(vec![product(1, "Masala Dosa", 6000, 12), product(2, "Filter Coffee", 2000, 30)]));
    db.expect_fetch_product().returning(|id| Ok((id == ProductId(1)).then(|| product(1, "Masala Dosa", 6000, 12))));
    db.expect_insert_product().returning(|p| {
        let mut created = product(3, &p.name, p.price.value(), p.quantity);
        created.description = p.description;
        created.created_by = p.created_by;
        Ok(created)
    });
    db.expect_update_product()
        .withf(|id, update| *id == ProductId(2) && *update == ProductUpdate::default().with_quantity(40))
        .returning(|_, _| Ok(product(2, "Filter Coffee", 2000, 40)));
    db.expect_delete_product().returning(|id| match id {
        ProductId(2) => Ok(()),
        id => Err(CatalogError::ProductNotFound(id)),
    });
    let api = CatalogApi::new(db);
    cfg.app_data(web::Data::new(api))
        .service(ProductsRoute::<MockCanteenDb>::new())
        .service(ProductByIdRoute::<MockCanteenDb>::new())
        .service(CreateProductRoute::<MockCanteenDb>::new())
        .service(UpdateProductRoute::<MockCanteenDb>::new())
        .service(DeleteProductRoute::<MockCanteenDb>::new());
}
