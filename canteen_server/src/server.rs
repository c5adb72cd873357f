use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use canteen_engine::{helpers::PaymentVerifier, CartApi, CatalogApi, OrderFlowApi, OrdersApi, SqliteDatabase};
use log::*;

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::razorpay::RazorpayGateway,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AddToCartRoute,
        AllOrdersRoute,
        CheckoutRoute,
        CreateProductRoute,
        DeleteProductRoute,
        MarkDeliveredRoute,
        MyCartRoute,
        MyOrderHistoryRoute,
        ProductByIdRoute,
        ProductsRoute,
        RemoveCartItemRoute,
        UpdateCartItemRoute,
        UpdateProductRoute,
        VerifyPaymentRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, MAX_DB_CONNECTIONS, config.store_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations()
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    let razorpay = config.razorpay.clone().with_timeout(config.gateway_timeout);
    let gateway = RazorpayGateway::new(razorpay).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
) -> Result<Server, ServerError> {
    let timeouts = config.timeouts();
    let options = ServerOptions::from_config(&config);
    let validator = TokenValidator::new(&config.auth);
    let verifier = PaymentVerifier::new(config.razorpay.key_secret.clone());
    let allow_unpaid_delivery = config.allow_unpaid_delivery;
    if allow_unpaid_delivery {
        warn!("🪛️ Unpaid orders may be marked as delivered");
    }
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone()).with_timeouts(timeouts);
        let cart_api = CartApi::new(db.clone()).with_timeouts(timeouts);
        let order_flow_api =
            OrderFlowApi::new(db.clone(), gateway.clone(), verifier.clone()).with_timeouts(timeouts);
        let orders_api =
            OrdersApi::new(db.clone()).with_timeouts(timeouts).with_unpaid_delivery(allow_unpaid_delivery);
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            debug!("💻️ Rejected request body. {err}");
            ServerError::InvalidInput(err.to_string()).into()
        });
        // Everything except the health check requires a valid access token
        let auth_scope = web::scope("")
            .wrap(JwtMiddlewareFactory::new(validator.clone()))
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(MyOrderHistoryRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(MarkDeliveredRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("canteen::access_log"))
            .app_data(json_config)
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(orders_api))
            .service(health)
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("🚀️ Canteen server listening on {}:{}", config.host, config.port);
    Ok(srv)
}
