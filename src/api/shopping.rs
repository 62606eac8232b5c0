use crate::error::AppError;
use crate::models::{Category, ShoppingItem, StoreRecommendation};
use crate::service::{guess_category, ShoppingService};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub items: Vec<ShoppingItem>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    pub items: Vec<ShoppingItem>,
    pub recommendations: Vec<StoreRecommendation>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub completed: bool,
}

pub async fn category(Json(req): Json<CategoryRequest>) -> Json<CategoryResponse> {
    Json(CategoryResponse {
        category: guess_category(&req.name),
    })
}

/// Stateless comparison for a client-held list
pub async fn recommendations(
    State(service): State<Arc<ShoppingService>>,
    Json(req): Json<RecommendationRequest>,
) -> Json<Vec<StoreRecommendation>> {
    Json(service.recommendations_for(&req.items))
}

pub async fn get_list(
    State(service): State<Arc<ShoppingService>>,
    Path(session_id): Path<Uuid>,
) -> Json<ShoppingListResponse> {
    Json(ShoppingListResponse {
        items: service.items(session_id),
        recommendations: service.session_recommendations(session_id),
    })
}

pub async fn add_item(
    State(service): State<Arc<ShoppingService>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ShoppingItem>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("item name is required".to_string()));
    }
    let item = service.add_item(session_id, &req.name, req.quantity);
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn toggle_item(
    State(service): State<Arc<ShoppingService>>,
    Path((session_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ToggleResponse>, AppError> {
    let completed = service
        .toggle_item(session_id, item_id)
        .ok_or_else(|| AppError::BadRequest(format!("unknown item {}", item_id)))?;
    Ok(Json(ToggleResponse { completed }))
}

pub async fn remove_item(
    State(service): State<Arc<ShoppingService>>,
    Path((session_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    service
        .remove_item(session_id, item_id)
        .ok_or_else(|| AppError::BadRequest(format!("unknown item {}", item_id)))?;
    Ok(StatusCode::NO_CONTENT)
}
