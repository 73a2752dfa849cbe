//! Item API handlers
//!
//! Every handler loads the full collection, works on it in memory and, for
//! mutations, writes the full collection back while holding the state's
//! write lock.

use crate::error::AppError;
use crate::services::uploads::UploadService;
use crate::state::item::{find_by_id, position_of, remove_all_by_id};
use crate::state::{Item, SharedState};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Query string accepted by `/items`
///
/// Every `id` value is kept. A repeated `id` names no single item, so it
/// matches nothing.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct ItemQuery {
    /// All `id` values, in query order
    pub ids: Vec<String>,
}

impl From<Vec<(String, String)>> for ItemQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self {
            ids: pairs
                .into_iter()
                .filter(|(key, _)| key == "id")
                .map(|(_, value)| value)
                .collect(),
        }
    }
}

impl ItemQuery {
    /// Query with a single `id`
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            ids: vec![id.into()],
        }
    }

    /// Id for a lookup; absent or empty means "list everything"
    fn lookup_id(&self) -> Result<Option<&str>, AppError> {
        match self.ids.as_slice() {
            [] => Ok(None),
            [id] if id.is_empty() => Ok(None),
            [id] => Ok(Some(id.as_str())),
            _ => Err(AppError::ItemNotFound(self.ids.join(","))),
        }
    }

    /// Id for a mutation; absent or repeated means nothing can match
    fn required_id(&self) -> Result<&str, AppError> {
        match self.ids.as_slice() {
            [id] => Ok(id.as_str()),
            _ => Err(AppError::ItemNotFound(self.ids.join(","))),
        }
    }
}

/// Body encoding of a create request, from its `Content-Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormEncoding {
    Multipart,
    /// JSON or urlencoded: parseable, but cannot carry a file
    FieldsOnly,
    Unknown,
}

impl FormEncoding {
    fn of(headers: &HeaderMap) -> Self {
        let mime = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("multipart/form-data") => FormEncoding::Multipart,
            Some("application/json") | Some("application/x-www-form-urlencoded") => {
                FormEncoding::FieldsOnly
            }
            _ => FormEncoding::Unknown,
        }
    }
}

/// Image part of a create request
#[derive(Debug)]
struct ImageUpload {
    filename: Option<String>,
    data: Vec<u8>,
}

/// Parsed create form, before validation
#[derive(Debug, Default)]
struct CreateForm {
    id: Option<String>,
    name: Option<String>,
    image: Option<ImageUpload>,
}

impl CreateForm {
    /// Read every part of the form, enforcing the image size limit
    async fn read(mut multipart: Multipart, max_upload_bytes: usize) -> Result<Self, AppError> {
        let mut form = CreateForm::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Upload(format!("Failed to read multipart field: {}", e)))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "id" | "name" => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Upload(format!("Failed to read {} field: {}", field_name, e))
                    })?;
                    let value = Some(text).filter(|t| !t.is_empty());
                    if field_name == "id" {
                        form.id = value;
                    } else {
                        form.name = value;
                    }
                }
                "image" => {
                    let Some(filename) = field.file_name().map(|s| s.to_string()) else {
                        warn!("Ignoring image field without a filename");
                        continue;
                    };

                    let mut data = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(|e| {
                        AppError::Upload(format!("Failed to read image data: {}", e))
                    })? {
                        if data.len() + chunk.len() > max_upload_bytes {
                            return Err(AppError::Upload(format!(
                                "Image exceeds maximum size of {} bytes",
                                max_upload_bytes
                            )));
                        }
                        data.extend_from_slice(&chunk);
                    }

                    form.image = Some(ImageUpload {
                        filename: Some(filename).filter(|f| !f.is_empty()),
                        data,
                    });
                }
                _ => {
                    warn!("Unknown multipart field: {}", field_name);
                }
            }
        }

        Ok(form)
    }
}

/// Parse a PUT/PATCH body into the fields to merge
fn parse_update_body(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(AppError::InvalidBody(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(AppError::InvalidBody(e.to_string())),
    }
}

/// GET /items - List all items, or the first item matching `?id=`
pub async fn get_items(
    State(state): State<SharedState>,
    Query(query): Query<ItemQuery>,
) -> Result<Response, AppError> {
    let state = state.read().await;
    let items = state.store.load().await?;

    match query.lookup_id()? {
        Some(id) => {
            let item = find_by_id(&items, id)
                .cloned()
                .ok_or_else(|| AppError::ItemNotFound(id.to_string()))?;
            Ok(Json(item).into_response())
        }
        None => Ok(Json(items).into_response()),
    }
}

/// POST /items - Create an item from a multipart form with `id`, `name` and `image`
///
/// JSON, urlencoded and empty bodies cannot carry the image and are rejected
/// as missing fields; any other non-multipart body is an upload error.
pub async fn create_item(
    State(state): State<SharedState>,
    request: Request,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let max_upload_bytes = state.read().await.max_upload_bytes;

    let multipart = match FormEncoding::of(request.headers()) {
        FormEncoding::Multipart => Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Upload(format!("Invalid multipart request: {}", e)))?,
        FormEncoding::FieldsOnly => return Err(AppError::MissingFields),
        FormEncoding::Unknown => {
            let body = axum::body::to_bytes(
                request.into_body(),
                max_upload_bytes.saturating_add(super::FORM_OVERHEAD_BYTES),
            )
            .await
            .map_err(|e| AppError::Upload(format!("Failed to read request body: {}", e)))?;
            if body.is_empty() {
                return Err(AppError::MissingFields);
            }
            return Err(AppError::Upload(
                "Unsupported content type for item upload".to_string(),
            ));
        }
    };

    let form = CreateForm::read(multipart, max_upload_bytes).await?;
    let (Some(id), Some(name), Some(image)) = (form.id, form.name, form.image) else {
        return Err(AppError::MissingFields);
    };

    let state = state.write().await;
    let stored_filename = UploadService::store_image(
        state.store.upload_dir(),
        image.filename.as_deref(),
        &image.data,
    )
    .await?;

    let item = Item::new(id, name, UploadService::url_for(&stored_filename));
    let mut items = state.store.load().await?;
    items.push(item.clone());
    state.store.save(&items).await?;

    info!(item_id = ?item.id(), stored_filename = %stored_filename, "Created item");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /items?id= - Merge the JSON body into the item
///
/// Named "replace", but fields missing from the body are kept, exactly as
/// with PATCH.
pub async fn replace_item(
    State(state): State<SharedState>,
    Query(query): Query<ItemQuery>,
    body: Bytes,
) -> Result<Json<Item>, AppError> {
    merge_item(&state, &query, &body).await
}

/// PATCH /items?id= - Merge the JSON body into the item
pub async fn update_item(
    State(state): State<SharedState>,
    Query(query): Query<ItemQuery>,
    body: Bytes,
) -> Result<Json<Item>, AppError> {
    merge_item(&state, &query, &body).await
}

async fn merge_item(
    state: &SharedState,
    query: &ItemQuery,
    body: &[u8],
) -> Result<Json<Item>, AppError> {
    let updates = parse_update_body(body)?;
    let id = query.required_id()?;

    let state = state.write().await;
    let mut items = state.store.load().await?;
    let index = position_of(&items, id).ok_or_else(|| AppError::ItemNotFound(id.to_string()))?;

    items[index].merge(updates);
    state.store.save(&items).await?;

    info!(item_id = %id, "Updated item");
    Ok(Json(items.swap_remove(index)))
}

/// DELETE /items?id= - Remove every item with the id
pub async fn delete_item(
    State(state): State<SharedState>,
    Query(query): Query<ItemQuery>,
) -> Result<StatusCode, AppError> {
    let id = query.required_id()?;

    let state = state.write().await;
    let mut items = state.store.load().await?;
    let removed = remove_all_by_id(&mut items, id);
    if removed == 0 {
        return Err(AppError::ItemNotFound(id.to_string()));
    }

    state.store.save(&items).await?;

    info!(item_id = %id, removed, "Deleted item");
    Ok(StatusCode::NO_CONTENT)
}
