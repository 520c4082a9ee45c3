use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use lehrmatch_db::Database;
use lehrmatch_gateway::dispatcher::Dispatcher;
use lehrmatch_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use lehrmatch_types::models::Role;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let mut details: HashMap<String, Vec<String>> = HashMap::new();
    if !req.email.contains('@') || req.email.len() > 254 {
        details
            .entry("email".into())
            .or_default()
            .push("must be a valid email address".into());
    }
    if req.password.len() < 8 {
        details
            .entry("password".into())
            .or_default()
            .push("must be at least 8 characters".into());
    }
    if !details.is_empty() {
        return Err(ApiError::validation("Invalid registration data", details));
    }

    // Check if email is taken
    let db = state.db.clone();
    let email = req.email.clone();
    let existing = tokio::task::spawn_blocking(move || db.get_user_by_email(&email))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;
    if existing.is_some() {
        return Err(ApiError::conflict("Email already registered", "CONFLICT"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::internal())?
        .to_string();

    let user_id = Uuid::new_v4();

    let db = state.db.clone();
    let email = req.email.clone();
    let role = req.role;
    tokio::task::spawn_blocking(move || {
        db.create_user(&user_id.to_string(), &email, &password_hash, role.as_str())
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    let token = create_token(&state.jwt_secret, user_id, &req.email, req.role)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.get_user_by_email(&email))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??
        .ok_or_else(ApiError::unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::internal())?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthorized())?;

    let user_id: Uuid = user.id.parse().map_err(|_| ApiError::internal())?;
    let role = Role::parse(&user.role).ok_or_else(ApiError::internal)?;

    let token = create_token(&state.jwt_secret, user_id, &user.email, role)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        role,
        token,
    }))
}

fn create_token(secret: &str, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
