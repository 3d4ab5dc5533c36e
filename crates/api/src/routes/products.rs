//! Public catalog routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use bazaar_core::ProductId;

use super::extract::{JsonBody, PathParam, QueryParams};
use crate::db::{DealRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::deal::ProductDeal;
use crate::models::product::{ProductDetail, ProductQuery};
use crate::models::{Paginated, Product, Review, ReviewInput, clamp_page, page_count};
use crate::state::AppState;

/// Number of products in the top-rated carousel.
const TOP_RATED_LIMIT: i64 = 3;

/// Build the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/top", get(top_rated))
        .route("/categories", get(categories))
        .route("/{id}", get(show))
        .route("/{id}/reviews", post(create_review))
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

/// Search the catalog.
///
/// GET /api/products?keyword=&category=&page=
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<Json<Paginated<ProductList>>> {
    let page_size = state.config().page_size;
    let page = clamp_page(query.page);
    let (products, total) = ProductRepository::new(state.pool())
        .search(&query, page, page_size)
        .await?;

    Ok(Json(Paginated {
        rows: ProductList { products },
        page,
        pages: page_count(total, page_size),
    }))
}

/// GET /api/products/top
#[instrument(skip(state))]
async fn top_rated(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .top_rated(TOP_RATED_LIMIT)
        .await?;
    Ok(Json(products))
}

/// GET /api/products/categories
#[instrument(skip(state))]
async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(ProductRepository::new(state.pool()).categories().await?))
}

/// Product detail with reviews and its live deal.
///
/// GET /api/products/{id}
#[instrument(skip(state, viewer))]
async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    PathParam(id): PathParam<ProductId>,
) -> Result<Json<ProductDetail>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    let reviews = repo.reviews(id).await?;
    let deal = DealRepository::new(state.pool())
        .active_for_product(id)
        .await?
        .and_then(|deal| ProductDeal::live(&deal, product.price, Utc::now()));

    let reviewed = viewer.is_some_and(|v| reviews.iter().any(|r| r.user_id == v.id()));

    Ok(Json(ProductDetail {
        product,
        reviews,
        deal,
        reviewed,
    }))
}

/// Review a product, once per customer.
///
/// POST /api/products/{id}/reviews
#[instrument(skip(state, current, input), fields(user_id = %current.id()))]
async fn create_review(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    PathParam(id): PathParam<ProductId>,
    JsonBody(input): JsonBody<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    let (rating, comment) = input.validated()?;
    let review = ProductRepository::new(state.pool())
        .add_review(id, current.id(), &current.user.name, rating, &comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
