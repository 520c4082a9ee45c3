use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use lehrmatch_gateway::chat;
use lehrmatch_types::api::{Claims, MessageResponse};

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination — pass the `created_at` timestamp of the
    /// oldest message from the previous page to fetch older messages.
    pub before: Option<String>,
}

fn default_limit() -> u32 {
    50
}

/// Chat history for a match the caller is party to, in chronological order.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let limit = query.limit.min(200);

    let before = match &query.before {
        Some(raw) => Some(raw.parse::<DateTime<Utc>>().map_err(|_| {
            let mut details = HashMap::new();
            details.insert(
                "before".to_string(),
                vec!["must be an ISO 8601 timestamp".to_string()],
            );
            ApiError::validation("Invalid query parameters", details)
        })?),
        None => None,
    };

    let messages = chat::history(&state.db, match_id, claims.sub, limit, before).await?;
    Ok(Json(messages))
}
