use axum::extract::{Multipart, Path, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::ApiResponse;

use crate::models::{NewRequestImage, Request, RequestImage};
use crate::schema::{request_images, requests};
use crate::AppState;

const MAX_IMAGES_PER_REQUEST: i64 = 4;

pub(crate) fn extension_for(content_type: &str) -> AppResult<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(AppError::new(
            ErrorCode::ImageUploadFailed,
            "unsupported image format, accepted: jpeg, png, webp",
        )),
    }
}

// --- POST /requests/:id/images ---

pub async fn upload_request_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<RequestImage>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let request = requests::table
        .find(request_id)
        .first::<Request>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;

    if request.user_id != user.id {
        return Err(AppError::new(
            ErrorCode::Forbidden,
            "only the request owner can attach images",
        ));
    }

    let existing: i64 = request_images::table
        .filter(request_images::request_id.eq(request_id))
        .select(count_star())
        .get_result(&mut conn)?;
    if existing >= MAX_IMAGES_PER_REQUEST {
        return Err(AppError::new(
            ErrorCode::ImageLimitReached,
            format!("a request can have at most {MAX_IMAGES_PER_REQUEST} images"),
        ));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            AppError::new(ErrorCode::ImageUploadFailed, format!("failed to read multipart: {e}"))
        })?
        .ok_or_else(|| AppError::new(ErrorCode::ImageUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let ext = extension_for(&content_type)?;

    let data = field.bytes().await.map_err(|e| {
        AppError::new(ErrorCode::ImageUploadFailed, format!("failed to read file data: {e}"))
    })?;

    let file_id = Uuid::now_v7();
    let key = format!("requests/{request_id}/{file_id}.{ext}");

    let url = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::ImageUploadFailed, e))?;

    let image: RequestImage = diesel::insert_into(request_images::table)
        .values(&NewRequestImage {
            request_id,
            url,
            position: existing as i32,
        })
        .get_result(&mut conn)?;

    tracing::info!(request_id = %request_id, image_id = %image.id, "request image uploaded");

    Ok(Json(ApiResponse::ok(image)))
}

// --- DELETE /requests/:id/images/:image_id ---

pub async fn delete_request_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((request_id, image_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let request = requests::table
        .find(request_id)
        .first::<Request>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;

    if request.user_id != user.id {
        return Err(AppError::new(
            ErrorCode::Forbidden,
            "only the request owner can remove images",
        ));
    }

    let image = request_images::table
        .find(image_id)
        .filter(request_images::request_id.eq(request_id))
        .first::<RequestImage>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::NotFound, "image not found"))?;

    diesel::delete(request_images::table.find(image.id)).execute(&mut conn)?;

    // The row is gone either way; a stranded object only costs storage
    if let Err(e) = state.minio.delete_by_url(&image.url).await {
        tracing::warn!(image_id = %image.id, error = %e, "failed to delete image object");
    }

    Ok(Json(ApiResponse::ok(())))
}
