//! Mock backend route handlers.
//!
//! # Route Structure
//!
//! ```text
//! POST   /users/signin                              - Sign in
//! POST   /users/signup                              - Create account
//! GET    /users/me                                  - Current user (bearer)
//! GET    /users/{id}                                - Profile (bearer)
//!
//! GET    /carts/{userId}                            - Cart (bearer)
//! POST   /carts/add                                 - Add item
//! PUT    /carts/increase-quantity/{userId}/{productId}
//! PUT    /carts/decrease-quantity/{userId}/{productId}
//! DELETE /carts/remove/{userId}/{productId}
//! DELETE /carts/remove-all/{userId}
//!
//! GET    /products/allproducts                      - Catalog
//! POST   /products/search                           - Keyword search
//! POST   /products/createproduct                    - Create (admin)
//! GET    /products/{id}                             - One product
//! DELETE /products/{id}                             - Delete (admin)
//!
//! POST   /orders                                    - Place order (bearer)
//! GET    /orders                                    - All orders (admin)
//! PUT    /orders/update-status                      - Status (admin)
//! PUT    /orders/updatepaystatus                    - Payment (admin)
//!
//! POST   /reviews/createreview                      - Review (bearer, buyers only)
//! GET    /reviews/user/all                          - All reviews (admin)
//! GET    /reviews/{productId}                       - Product reviews
//! DELETE /reviews/{id}                              - Delete (admin)
//!
//! POST   /logoBanner/upload-logo                    - Multipart `logo` (admin)
//! GET    /logoBanner/logo                           - Logo bytes
//! POST   /logoBanner/upload-banner                  - Multipart `banner` x n (admin)
//! GET    /logoBanner/banner                         - Banner listing
//! ```
//!
//! Cart endpoints accept requests without a token, like the real backend.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use cartwheel_core::{
    CartItem, NewProduct, Order, OrderId, OrderItem, OrderStatus, PaymentStatus, Price, Product,
    ProductId, Review, ReviewId, UserId, UserRole,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::Shared;
use crate::state::StoredFile;

type ApiResult<T> = Result<T, ApiError>;

/// Error answer in the backend's `{ message }` shape.
pub(crate) struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

const UNAUTHORIZED: ApiError = ApiError(StatusCode::UNAUTHORIZED, "Not authorized, no token");
const FORBIDDEN: ApiError = ApiError(StatusCode::FORBIDDEN, "Not authorized as an admin");

pub(crate) fn router(shared: Arc<Shared>) -> Router {
    Router::new()
        .route("/users/signin", post(sign_in))
        .route("/users/signup", post(sign_up))
        .route("/users/me", get(current_user))
        .route("/users/{id}", get(user_profile))
        .route("/carts/add", post(add_to_cart))
        .route(
            "/carts/increase-quantity/{user_id}/{product_id}",
            put(increase_quantity),
        )
        .route(
            "/carts/decrease-quantity/{user_id}/{product_id}",
            put(decrease_quantity),
        )
        .route(
            "/carts/remove/{user_id}/{product_id}",
            delete(remove_from_cart),
        )
        .route("/carts/remove-all/{user_id}", delete(empty_cart))
        .route("/carts/{user_id}", get(fetch_cart))
        .route("/products/allproducts", get(all_products))
        .route("/products/search", post(search_products))
        .route("/products/createproduct", post(create_product))
        .route("/products/{id}", get(product).delete(delete_product))
        .route("/orders", get(all_orders).post(place_order))
        .route("/orders/update-status", put(update_order_status))
        .route("/orders/updatepaystatus", put(update_payment_status))
        .route("/reviews/createreview", post(create_review))
        .route("/reviews/user/all", get(all_reviews))
        .route("/reviews/{id}", get(product_reviews).delete(delete_review))
        .route("/logoBanner/upload-logo", post(upload_logo))
        .route("/logoBanner/logo", get(logo))
        .route("/logoBanner/upload-banner", post(upload_banners))
        .route("/logoBanner/banner", get(banners))
        .layer(middleware::from_fn_with_state(shared.clone(), count_requests))
        .with_state(shared)
}

async fn count_requests(State(shared): State<Arc<Shared>>, request: Request, next: Next) -> Response {
    shared.requests.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

// =============================================================================
// Auth helpers
// =============================================================================

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(shared: &Shared, headers: &HeaderMap) -> ApiResult<UserId> {
    let token = bearer(headers).ok_or(UNAUTHORIZED)?;
    shared.state().tokens.get(token).cloned().ok_or(UNAUTHORIZED)
}

fn authenticate_admin(shared: &Shared, headers: &HeaderMap) -> ApiResult<UserId> {
    let user_id = authenticate(shared, headers)?;
    let state = shared.state();
    match state.account(&user_id) {
        Some(account) if account.user.role.is_admin() => Ok(user_id),
        _ => Err(FORBIDDEN),
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Deserialize)]
struct SignInBody {
    email: String,
    password: String,
}

async fn sign_in(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<SignInBody>,
) -> ApiResult<Json<Value>> {
    let answer = {
        let mut state = shared.state();
        let user_id = match state.account_by_email(&body.email) {
            Some(account) if account.password == body.password => account.user.id.clone(),
            _ => {
                return Err(ApiError(
                    StatusCode::UNAUTHORIZED,
                    "Invalid email or password",
                ));
            }
        };

        let user = state.user_view(&user_id);
        if shared.issue_tokens.load(Ordering::SeqCst) {
            let token = state.issue_token(&user_id);
            json!({ "user": user, "token": token })
        } else {
            json!({ "user": user })
        }
    };

    hold_user_answer(&shared).await;
    Ok(Json(answer))
}

#[derive(Deserialize)]
struct SignUpBody {
    name: String,
    email: String,
    password: String,
}

async fn sign_up(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<SignUpBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut state = shared.state();
    if state.account_by_email(&body.email).is_some() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "User already exists"));
    }

    let user_id = state.add_account(&body.name, &body.email, &body.password, UserRole::User);
    let token = state.issue_token(&user_id);
    let user = state.user_view(&user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    ))
}

async fn current_user(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let user_id = authenticate(&shared, &headers)?;
    let user = shared
        .state()
        .user_view(&user_id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "User not found"))?;
    hold_user_answer(&shared).await;
    Ok(Json(json!(user)))
}

async fn user_profile(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    authenticate(&shared, &headers)?;
    let user = shared
        .state()
        .user_view(&UserId::new(id))
        .ok_or(ApiError(StatusCode::NOT_FOUND, "User not found"))?;
    hold_user_answer(&shared).await;
    Ok(Json(json!(user)))
}

/// With a delay configured, signal a sign-in or profile answer and hold it.
async fn hold_user_answer(shared: &Shared) {
    let delay = shared.user_delay();
    if delay.is_zero() {
        return;
    }
    shared.user_received.notify_one();
    tokio::time::sleep(delay).await;
}

// =============================================================================
// Carts
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartBody {
    user_id: UserId,
    product_id: ProductId,
    quantity: u32,
}

fn cart_answer(shared: &Shared, user_id: &UserId, message: &str) -> Json<Value> {
    Json(json!({ "message": message, "cart": shared.state().cart(user_id) }))
}

async fn fetch_cart(
    State(shared): State<Arc<Shared>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    authenticate(&shared, &headers)?;
    Ok(Json(json!(shared.state().cart(&UserId::new(user_id)))))
}

async fn add_to_cart(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<AddToCartBody>,
) -> ApiResult<Json<Value>> {
    {
        let mut state = shared.state();
        if state.product(&body.product_id).is_none() {
            return Err(ApiError(StatusCode::NOT_FOUND, "Product not found"));
        }

        let items = state.cart_items_mut(&body.user_id);
        match items.iter_mut().find(|item| item.product == body.product_id) {
            Some(item) => item.quantity += body.quantity,
            None => items.push(CartItem {
                product: body.product_id,
                quantity: body.quantity,
            }),
        }
    }
    Ok(cart_answer(&shared, &body.user_id, "Item added to cart"))
}

/// Change a line's quantity by `delta`, dropping lines that reach zero.
fn adjust_quantity(shared: &Shared, user_id: &UserId, product_id: &ProductId, delta: i64) -> ApiResult<()> {
    let mut state = shared.state();
    let items = state.cart_items_mut(user_id);
    let item = items
        .iter_mut()
        .find(|item| &item.product == product_id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Item not found in cart"))?;

    let quantity = (i64::from(item.quantity) + delta).max(0);
    item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    items.retain(|item| item.quantity > 0);
    Ok(())
}

async fn increase_quantity(
    State(shared): State<Arc<Shared>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let user_id = UserId::new(user_id);
    adjust_quantity(&shared, &user_id, &ProductId::new(product_id), 1)?;
    let answer = cart_answer(&shared, &user_id, "Item quantity increased");

    // Answer late, after the change is visible to later requests
    shared.increase_received.notify_one();
    let delay = shared.increase_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(answer)
}

async fn decrease_quantity(
    State(shared): State<Arc<Shared>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let user_id = UserId::new(user_id);
    adjust_quantity(&shared, &user_id, &ProductId::new(product_id), -1)?;
    Ok(cart_answer(&shared, &user_id, "Item quantity decreased"))
}

async fn remove_from_cart(
    State(shared): State<Arc<Shared>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let user_id = UserId::new(user_id);
    let product_id = ProductId::new(product_id);
    shared
        .state()
        .cart_items_mut(&user_id)
        .retain(|item| item.product != product_id);
    Ok(cart_answer(&shared, &user_id, "Item removed from cart"))
}

async fn empty_cart(
    State(shared): State<Arc<Shared>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = UserId::new(user_id);
    shared.state().cart_items_mut(&user_id).clear();
    Ok(cart_answer(&shared, &user_id, "All items removed from cart"))
}

// =============================================================================
// Products
// =============================================================================

#[derive(Deserialize)]
struct SearchBody {
    keyword: String,
}

async fn all_products(State(shared): State<Arc<Shared>>) -> Json<Vec<Product>> {
    Json(shared.state().products.clone())
}

async fn product(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    shared
        .state()
        .product(&ProductId::new(id))
        .cloned()
        .map(Json)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Product not found"))
}

async fn search_products(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<SearchBody>,
) -> Json<Vec<Product>> {
    let keyword = body.keyword.to_lowercase();
    let found = shared
        .state()
        .products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&keyword) || p.category.to_lowercase().contains(&keyword)
        })
        .cloned()
        .collect();
    Json(found)
}

async fn create_product(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authenticate_admin(&shared, &headers)?;

    let mut state = shared.state();
    let product = Product {
        id: ProductId::new(state.next_id("p")),
        name: body.name,
        description: body.description,
        price: body.price,
        category: body.category,
        images: body.images,
    };
    state.products.push(product.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product created successfully", "product": product })),
    ))
}

async fn delete_product(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    authenticate_admin(&shared, &headers)?;

    let id = ProductId::new(id);
    let mut state = shared.state();
    let before = state.products.len();
    state.products.retain(|p| p.id != id);
    if state.products.len() == before {
        return Err(ApiError(StatusCode::NOT_FOUND, "Product not found"));
    }
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody {
    user_id: UserId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderStatusBody {
    order_id: OrderId,
    status: OrderStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentStatusBody {
    order_id: OrderId,
    payment: PaymentStatus,
}

async fn place_order(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<PlaceOrderBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authenticate(&shared, &headers)?;

    let mut state = shared.state();
    let items: Vec<OrderItem> = state
        .cart(&body.user_id)
        .items
        .into_iter()
        .map(|item| OrderItem {
            product: item.product,
            quantity: item.quantity,
        })
        .collect();
    if items.is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Cart is empty"));
    }

    let total: Price = items
        .iter()
        .map(|item| {
            state
                .product(&item.product)
                .map_or(Price::ZERO, |p| p.price.times(item.quantity))
        })
        .sum();
    let order = Order {
        id: OrderId::new(state.next_id("o")),
        user: Some(body.user_id),
        items,
        status: OrderStatus::Placed,
        payment: PaymentStatus::Pending,
        total_amount: Some(total),
        created_at: Some(chrono::Utc::now()),
    };
    state.orders.push(order);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Order placed successfully" })),
    ))
}

async fn all_orders(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Order>>> {
    authenticate_admin(&shared, &headers)?;
    Ok(Json(shared.state().orders.clone()))
}

async fn update_order_status(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<OrderStatusBody>,
) -> ApiResult<Json<Value>> {
    authenticate_admin(&shared, &headers)?;

    let mut state = shared.state();
    let order = state
        .order_mut(&body.order_id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Order not found"))?;
    order.status = body.status;
    Ok(Json(json!({ "message": "Order status updated", "order": order })))
}

async fn update_payment_status(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<PaymentStatusBody>,
) -> ApiResult<Json<Value>> {
    authenticate_admin(&shared, &headers)?;

    let mut state = shared.state();
    let order = state
        .order_mut(&body.order_id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Order not found"))?;
    order.payment = body.payment;
    Ok(Json(json!({ "message": "Payment status updated", "order": order })))
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReviewBody {
    user_id: UserId,
    product_id: ProductId,
    rating: u8,
    comment: String,
}

async fn create_review(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<CreateReviewBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authenticate(&shared, &headers)?;
    if !(Review::MIN_RATING..=Review::MAX_RATING).contains(&body.rating) {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Rating must be between 1 and 5"));
    }

    let mut state = shared.state();
    if !state.has_purchased(&body.user_id, &body.product_id) {
        return Err(ApiError(
            StatusCode::FORBIDDEN,
            "You can only review products you have purchased",
        ));
    }

    let author = state
        .account(&body.user_id)
        .map_or_else(|| body.user_id.to_string(), |a| a.user.name.clone());
    let review = Review {
        id: ReviewId::new(state.next_id("r")),
        user: author,
        product: Some(body.product_id),
        rating: body.rating,
        comment: body.comment,
        created_at: Some(chrono::Utc::now()),
    };
    state.reviews.push(review.clone());

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Review created", "review": review })),
    ))
}

async fn product_reviews(
    State(shared): State<Arc<Shared>>,
    Path(product_id): Path<String>,
) -> Json<Vec<Review>> {
    let product_id = ProductId::new(product_id);
    let reviews = shared
        .state()
        .reviews
        .iter()
        .filter(|r| r.product.as_ref() == Some(&product_id))
        .cloned()
        .collect();
    Json(reviews)
}

async fn all_reviews(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Review>>> {
    authenticate_admin(&shared, &headers)?;
    Ok(Json(shared.state().reviews.clone()))
}

async fn delete_review(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    authenticate_admin(&shared, &headers)?;
    if !shared.state().remove_review(&ReviewId::new(id)) {
        return Err(ApiError(StatusCode::NOT_FOUND, "Review not found"));
    }
    Ok(Json(json!({ "message": "Review deleted" })))
}

// =============================================================================
// Logo & Banners
// =============================================================================

/// Collect every file sent under `field`.
async fn read_files(mut multipart: Multipart, field: &str) -> ApiResult<Vec<StoredFile>> {
    let malformed = || ApiError(StatusCode::BAD_REQUEST, "Malformed multipart body");
    let mut files = Vec::new();

    while let Some(part) = multipart.next_field().await.map_err(|_| malformed())? {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part.file_name().unwrap_or_default().to_owned();
        let content_type = part.content_type().map(str::to_owned);
        let bytes = part.bytes().await.map_err(|_| malformed())?;
        files.push(StoredFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "No file uploaded"));
    }
    Ok(files)
}

async fn upload_logo(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    authenticate_admin(&shared, &headers)?;
    let files = read_files(multipart, "logo").await?;
    shared.state().logo = files.into_iter().next_back();
    Ok(Json(json!({ "message": "Logo uploaded successfully" })))
}

async fn logo(State(shared): State<Arc<Shared>>) -> ApiResult<Response> {
    let logo = shared
        .state()
        .logo
        .clone()
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Logo not found"))?;
    let content_type = logo
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_owned());
    Ok(([(header::CONTENT_TYPE, content_type)], logo.bytes).into_response())
}

async fn upload_banners(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    authenticate_admin(&shared, &headers)?;
    let files = read_files(multipart, "banner").await?;
    shared.state().banners = files;
    Ok(Json(json!({ "message": "Banner images uploaded successfully" })))
}

async fn banners(State(shared): State<Arc<Shared>>) -> Json<Value> {
    let listing: Vec<Value> = shared
        .state()
        .banners
        .iter()
        .map(|file| {
            json!({
                "filename": file.file_name,
                "contentType": file.content_type,
                "size": file.bytes.len(),
            })
        })
        .collect();
    Json(json!({ "banners": listing }))
}
