//! Request handler definitions
//!
//! Define each route and its handler here. Every route except `/health` sits behind the JWT middleware, and is
//! additionally wrapped in an ACL that lists the roles allowed to call it.
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the current thread stops that
//! worker from serving anything else. Database and gateway calls are therefore always awaited, never blocked on.
//!
//! | Method | Path                              | Roles       |
//! |--------|-----------------------------------|-------------|
//! | GET    | `/products`                       | user, admin |
//! | GET    | `/products/{id}`                  | user, admin |
//! | POST   | `/admin/products`                 | admin       |
//! | PUT    | `/admin/products/{id}`            | admin       |
//! | DELETE | `/admin/products/{id}`            | admin       |
//! | POST   | `/addtocart/{productId}/{userId}` | user        |
//! | GET    | `/user/cart`                      | user        |
//! | PUT    | `/cart/{productId}/{userId}`      | user        |
//! | DELETE | `/cart/{productId}/{userId}`      | user        |
//! | POST   | `/user/order`                     | user        |
//! | POST   | `/user/payment/verify`            | user        |
//! | GET    | `/user/order/history`             | user        |
//! | GET    | `/admin/orders`                   | admin       |
//! | PATCH  | `/admin/order/{id}/deliver`       | admin       |
use std::str::FromStr;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use canteen_engine::{
    db_types::{OrderId, ProductId, ProductUpdate, Role, UserId},
    traits::{CanteenDatabase, CartManagement, CatalogManagement, OrderManagement, PaymentGateway},
    CartApi,
    CatalogApi,
    OrderFlowApi,
    OrdersApi,
};
use log::*;

use crate::{
    auth::JwtClaims,
    config::ServerOptions,
    data_objects::{
        CartLineResponse,
        CheckoutResponse,
        JsonResponse,
        NewProductRequest,
        OrderResponse,
        OrdersResponse,
        PaymentVerificationRequest,
        PaymentVerificationResponse,
        QuantityRequest,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each trait bound becomes one generic parameter on the route struct, named `T<Bound>`, in the order given.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [<T $bounds>], )+ >( $( core::marker::PhantomData<fn() -> [<T $bounds>]>, )+ );}
        paste::paste! { impl< $( [<T $bounds>], )+ > [<$name:camel Route>]< $( [<T $bounds>], )+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self( $( core::marker::PhantomData::<fn() -> [<T $bounds>]>, )+ )
            }
        }}
        paste::paste! { impl< $( [<T $bounds>], )+ > actix_web::dev::HttpServiceFactory for [<$name:camel Route>]< $( [<T $bounds>], )+ >
        where
            $( [<T $bounds>]: $bounds + 'static, )+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [<T $bounds>], )+ >)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn parse_path<T>(value: &str) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| {
        debug!("💻️ Invalid path parameter. {e}");
        ServerError::InvalidInput(e.to_string())
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement where requires [Role::User, Role::Admin]);
/// Lists the products that are currently in stock.
pub async fn products<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET products");
    let products = api.available_products().await.map_err(|e| {
        debug!("💻️ Could not fetch products. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl CatalogManagement where requires [Role::User, Role::Admin]);
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_path::<ProductId>(&path.into_inner())?;
    debug!("💻️ GET product {id}");
    let product = api.product(id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(create_product => Post "/admin/products" impl CatalogManagement where requires [Role::Admin]);
/// Adds a product to the catalog. The admin's username is recorded as its creator.
pub async fn create_product<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = body.into_inner().into_new_product(&claims.username);
    debug!("💻️ POST new product '{}' by {}", product.name, claims.username);
    let product = api.create_product(product).await.map_err(|e| {
        debug!("💻️ Could not create product. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Put "/admin/products/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_product<B: CatalogManagement>(
    path: web::Path<String>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_path::<ProductId>(&path.into_inner())?;
    debug!("💻️ PUT product {id}");
    let product = api.update_product(id, body.into_inner()).await.map_err(|e| {
        debug!("💻️ Could not update product {id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/admin/products/{id}" impl CatalogManagement where requires [Role::Admin]);
/// Removes a product from the catalog. Cart lines that still refer to it are ignored from then on.
pub async fn delete_product<B: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_path::<ProductId>(&path.into_inner())?;
    debug!("💻️ DELETE product {id}");
    api.delete_product(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Product deleted")))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(add_to_cart => Post "/addtocart/{product_id}/{user_id}" impl CartManagement where requires [Role::User]);
/// Adds `quantity` units of a product to the caller's cart, merging with any existing line.
///
/// The user id in the path must be the caller's own.
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<(String, String)>,
    body: web::Json<QuantityRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (product_id, user_id) = path.into_inner();
    let product_id = parse_path::<ProductId>(&product_id)?;
    let user_id = parse_path::<UserId>(&user_id)?;
    claims.ensure_is(&user_id)?;
    let quantity = body.quantity;
    debug!("💻️ POST add {quantity} of product {product_id} to cart for {user_id}");
    let cart_line = api.add_item(&user_id, product_id, quantity).await.map_err(|e| {
        debug!("💻️ Could not add to cart. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(CartLineResponse { message: "Added to cart".into(), cart_line }))
}

route!(my_cart => Get "/user/cart" impl CartManagement where requires [Role::User]);
pub async fn my_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for {}", claims.user_id);
    let cart = api.cart(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(update_cart_item => Put "/cart/{product_id}/{user_id}" impl CartManagement where requires [Role::User]);
/// Sets a cart line to an absolute quantity.
pub async fn update_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<(String, String)>,
    body: web::Json<QuantityRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (product_id, user_id) = path.into_inner();
    let product_id = parse_path::<ProductId>(&product_id)?;
    let user_id = parse_path::<UserId>(&user_id)?;
    claims.ensure_is(&user_id)?;
    let quantity = body.quantity;
    debug!("💻️ PUT product {product_id} to {quantity} in cart for {user_id}");
    let cart_line = api.update_item(&user_id, product_id, quantity).await.map_err(|e| {
        debug!("💻️ Could not update cart. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(CartLineResponse { message: "Cart updated".into(), cart_line }))
}

route!(remove_cart_item => Delete "/cart/{product_id}/{user_id}" impl CartManagement where requires [Role::User]);
pub async fn remove_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<(String, String)>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (product_id, user_id) = path.into_inner();
    let product_id = parse_path::<ProductId>(&product_id)?;
    let user_id = parse_path::<UserId>(&user_id)?;
    claims.ensure_is(&user_id)?;
    debug!("💻️ DELETE product {product_id} from cart for {user_id}");
    api.remove_item(&user_id, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Removed from cart")))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/user/order" impl CanteenDatabase, PaymentGateway where requires [Role::User]);
/// Turns the caller's cart into a `Pending` order and opens a Razorpay transaction for it.
///
/// The response carries everything the client needs to open the Razorpay checkout widget. The cart is left as is
/// until payment is confirmed.
pub async fn checkout<B, G>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CanteenDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST checkout for {}", claims.user_id);
    let checkout = api.create_order(claims.customer()).await.map_err(|e| {
        debug!("💻️ Checkout failed for {}. {e}", claims.user_id);
        e
    })?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(checkout)))
}

route!(verify_payment => Post "/user/payment/verify" impl CanteenDatabase, PaymentGateway where requires [Role::User]);
/// Applies a payment after checking the gateway's signature.
///
/// Callbacks are idempotent: replaying a verified payment returns the order without changing it again.
pub async fn verify_payment<B, G>(
    req: HttpRequest,
    claims: JwtClaims,
    options: web::Data<ServerOptions>,
    body: web::Json<PaymentVerificationRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CanteenDatabase,
    G: PaymentGateway,
{
    let PaymentVerificationRequest { razorpay_payment_id, razorpay_order_id, razorpay_signature, order_id } =
        body.into_inner();
    debug!("💻️ POST payment verification for order {order_id} from {}", claims.user_id);
    let outcome = api
        .verify_and_apply(order_id, &razorpay_order_id, &razorpay_payment_id, &razorpay_signature)
        .await
        .map_err(|e| {
            let peer_addr = get_remote_ip(&req, options.use_x_forwarded_for);
            warn!("💻️ Payment verification for order {order_id} from {peer_addr:?} was rejected. {e}");
            e
        })?;
    let message = if outcome.newly_paid { "Payment verified" } else { "Payment was already verified" };
    let response = PaymentVerificationResponse {
        message: message.into(),
        order: outcome.order,
        cart_cleared: outcome.cart_cleared,
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_order_history => Get "/user/order/history" impl OrderManagement where requires [Role::User]);
pub async fn my_order_history<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET order history for {}", claims.user_id);
    let orders = api.history(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(OrdersResponse { orders }))
}

route!(all_orders => Get "/admin/orders" impl OrderManagement where requires [Role::Admin]);
pub async fn all_orders<B: OrderManagement>(api: web::Data<OrdersApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all orders");
    let orders = api.all_orders().await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(OrdersResponse { orders }))
}

route!(mark_delivered => Patch "/admin/order/{id}/deliver" impl OrderManagement where requires [Role::Admin]);
pub async fn mark_delivered<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_path::<OrderId>(&path.into_inner())?;
    debug!("💻️ PATCH deliver order {id} by {}", claims.username);
    let order = api.mark_delivered(id).await.map_err(|e| {
        debug!("💻️ Could not mark order {id} as delivered. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(OrderResponse { message: "Order marked as delivered".into(), order }))
}
