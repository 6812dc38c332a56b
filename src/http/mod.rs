//! Axum routing layer.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET` | `/health` | backend probe |
//! | `POST` | `/orders/create` | order workflow, `201` + order |
//! | `GET` | `/orders/read/{id}` | read order |
//! | `GET` | `/{users,products}/read/{id}` | read document |
//! | `POST` | `/{users,products}/create` | insert, `201` + document |
//! | `PUT` | `/{users,products}/update/{id}` | replace existing document |
//! | `DELETE` | `/{users,products}/delete/{id}` | delete, `{"status": "DELETED"}` |
//!
//! Failures answer `400 {"error": message}`; see [`ApiError`].

pub mod error;

pub use error::ApiError;

use crate::backend::StoreBackend;
use crate::document::Document;
use crate::error::Error;
use crate::models::{Order, OrderRequest, Product, User};
use crate::service::ShopService;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the application router around a shared service.
pub fn router<B: StoreBackend>(service: ShopService<B>) -> Router {
    Router::new()
        .route("/health", get(health::<B>))
        .route("/orders/create", post(create_order::<B>))
        .route("/orders/read/{id}", get(read::<Order, B>))
        .merge(crud_routes::<User, B>())
        .merge(crud_routes::<Product, B>())
        .with_state(service)
}

/// Read, create, update and delete routes for one collection.
///
/// Paths are derived from [`Document::collection`], e.g. `/users/read/{id}`.
pub fn crud_routes<T, B>() -> Router<ShopService<B>>
where
    T: Document,
    B: StoreBackend,
{
    let collection = T::collection();

    Router::new()
        .route(&format!("/{}/read/{{id}}", collection), get(read::<T, B>))
        .route(&format!("/{}/create", collection), post(create::<T, B>))
        .route(
            &format!("/{}/update/{{id}}", collection),
            put(update::<T, B>),
        )
        .route(
            &format!("/{}/delete/{{id}}", collection),
            delete(remove::<T, B>),
        )
}

async fn read<T, B>(
    State(service): State<ShopService<B>>,
    path: Result<Path<T::Key>, PathRejection>,
) -> ApiResult<Json<T>>
where
    T: Document,
    B: StoreBackend,
{
    let Path(key) = path?;

    match service.get::<T>(&key).await? {
        Some(document) => Ok(Json(document)),
        None => Err(Error::not_found(T::collection(), &key).into()),
    }
}

async fn create<T, B>(
    State(service): State<ShopService<B>>,
    body: Result<Json<T>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<T>)>
where
    T: Document,
    B: StoreBackend,
{
    let Json(document) = body?;
    let created = service.create(document).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update<T, B>(
    State(service): State<ShopService<B>>,
    path: Result<Path<T::Key>, PathRejection>,
    body: Result<Json<T>, JsonRejection>,
) -> ApiResult<Json<T>>
where
    T: Document,
    B: StoreBackend,
{
    let Path(key) = path?;
    let Json(document) = body?;

    if document.key() != key {
        return Err(ApiError::bad_request(format!(
            "Invalid input: body id {} does not match path id {}",
            document.key(),
            key
        )));
    }

    let updated = service.update(document).await?;
    Ok(Json(updated))
}

async fn remove<T, B>(
    State(service): State<ShopService<B>>,
    path: Result<Path<T::Key>, PathRejection>,
) -> ApiResult<Json<Value>>
where
    T: Document,
    B: StoreBackend,
{
    let Path(key) = path?;
    service.delete::<T>(key).await?;
    Ok(Json(json!({ "status": "DELETED" })))
}

async fn create_order<B: StoreBackend>(
    State(service): State<ShopService<B>>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let Json(request) = body?;
    let order = service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn health<B: StoreBackend>(State(service): State<ShopService<B>>) -> ApiResult<Json<Value>> {
    if service.health_check().await? {
        Ok(Json(json!({
            "status": "healthy",
            "version": crate::VERSION,
        })))
    } else {
        Err(ApiError::unavailable("store backend is unhealthy"))
    }
}
