use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MatchStatus, MessageType, OceanScores, RiasecScores, Role, SwipeDirection};

// -- JWT Claims --

/// JWT claims shared across lehrmatch-api (REST middleware) and
/// lehrmatch-gateway (WebSocket Identify handshake). Canonical definition
/// lives here in lehrmatch-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Errors --

/// Wire shape of every error response: `{message, code, details?}`.
/// `details` maps a field path to the validation messages for that field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<std::collections::HashMap<String, Vec<String>>>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token: String,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub canton: String,
    pub city: String,
    /// Desired apprenticeship fields in priority order. May be empty.
    #[serde(default)]
    pub desired_fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyProfileRequest {
    pub company_name: String,
    pub canton: String,
    pub city: String,
}

/// Numeric output of the personality quiz. The quiz UI itself lives in the
/// clients; the backend only consumes the resulting trait vectors.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraitsRequest {
    pub ocean: OceanScores,
    pub riasec: RiasecScores,
}

#[derive(Debug, Serialize)]
pub struct StudentProfileResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub canton: String,
    pub city: String,
    pub desired_fields: Vec<String>,
    pub quiz_completed: bool,
}

// -- Feed --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub label: String,
    pub weight: f64,
    pub score: u8,
}

/// One swipeable card in the feed: a listing plus its compatibility score.
#[derive(Debug, Clone, Serialize)]
pub struct ListingWithScore {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_code: Option<String>,
    pub canton: String,
    pub city: String,
    pub spots_available: i64,
    pub created_at: DateTime<Utc>,
    pub compatibility_score: u8,
    pub score_breakdown: Vec<ScoreBreakdown>,
}

// -- Swipes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwipeRequest {
    pub listing_id: Uuid,
    pub direction: SwipeDirection,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub is_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<u8>,
}

// -- Careers --

#[derive(Debug, Clone, Serialize)]
pub struct SharedDimensionDto {
    pub key: String,
    pub label: String,
    pub user_score: f64,
    pub career_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CareerMatchResponse {
    pub code: String,
    pub name: String,
    pub field: String,
    pub match_percentage: u8,
    pub shared_dimensions: Vec<SharedDimensionDto>,
    pub explanations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteToggleResponse {
    pub is_favorite: bool,
}

// -- Matches --

#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub field: String,
    pub canton: String,
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub id: Uuid,
    pub student_id: Uuid,
    pub listing: ListingSummary,
    pub compatibility_score: u8,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageResponse>,
    pub unread_count: i64,
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
