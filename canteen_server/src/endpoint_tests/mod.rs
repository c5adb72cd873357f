mod helpers;
mod mocks;
mod orders;
mod payments;
mod products;
mod sqlite_flow;

use actix_web::{body::MessageBody, http::StatusCode, test, App};

use crate::routes::health;

#[actix_web::test]
async fn health_check_needs_no_token() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(body, "👍️\n");
}
