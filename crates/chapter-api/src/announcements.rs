use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use chapter_db::models::{AnnouncementRow, parse_timestamp};
use chapter_types::api::{Claims, CreateAnnouncementRequest, MessageResponse};
use chapter_types::models::Announcement;

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::require_admin;

#[derive(Debug, Deserialize)]
pub struct AnnouncementQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list_announcements(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<AnnouncementQuery>, ApiError>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    let limit = query.limit.min(200);
    let rows = with_db(&state, move |db| db.list_announcements(limit)).await?;
    Ok(Json(rows.into_iter().map(to_announcement).collect()))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateAnnouncementRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    if req.title.trim().is_empty() || req.body.trim().is_empty() {
        return Err(ApiError::Validation("Announcement title and body are required".into()));
    }

    let id = Uuid::new_v4().to_string();
    let author_id = claims.sub.to_string();
    let aid = id.clone();
    let row = with_db(&state, move |db| {
        db.insert_announcement(&aid, &req.title, &req.body, &author_id)?;
        db.get_announcement(&aid)
    })
    .await?
    .ok_or_else(|| ApiError::Internal(format!("announcement '{}' missing after insert", id)))?;

    info!(announcement_id = %id, author_id = %claims.sub, "Announcement posted");
    Ok((StatusCode::CREATED, Json(to_announcement(row))))
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    WithRejection(Path(announcement_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&claims)?;

    let id = announcement_id.to_string();
    if !with_db(&state, move |db| db.delete_announcement(&id)).await? {
        return Err(ApiError::NotFound(format!("Announcement '{}' was not found", announcement_id)));
    }

    Ok(Json(MessageResponse {
        message: "Announcement deleted".into(),
    }))
}

fn to_announcement(row: AnnouncementRow) -> Announcement {
    Announcement {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt announcement id '{}': {}", row.id, e);
            Uuid::default()
        }),
        author_id: row.author_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt author_id '{}' on announcement '{}': {}", row.author_id, row.id, e);
            Uuid::default()
        }),
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on announcement '{}'", row.created_at, row.id);
            chrono::DateTime::default()
        }),
        title: row.title,
        body: row.body,
        author_username: row.author_username,
    }
}
