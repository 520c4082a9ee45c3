use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use uuid::Uuid;

use lehrmatch_types::api::{
    Claims, CompanyProfileRequest, StudentProfileRequest, StudentProfileResponse, TraitsRequest,
};
use lehrmatch_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;

/// Create or update the caller's student profile, including the
/// priority-ordered desired fields.
pub async fn upsert_student_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StudentProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students have a student profile"));
    }

    let mut details: HashMap<String, Vec<String>> = HashMap::new();
    if req.first_name.trim().is_empty() {
        details
            .entry("first_name".into())
            .or_default()
            .push("must not be empty".into());
    }
    if req.last_name.trim().is_empty() {
        details
            .entry("last_name".into())
            .or_default()
            .push("must not be empty".into());
    }
    if req.canton.len() != 2 || !req.canton.chars().all(|c| c.is_ascii_uppercase()) {
        details
            .entry("canton".into())
            .or_default()
            .push("must be a two-letter canton code".into());
    }
    if !details.is_empty() {
        return Err(ApiError::validation("Invalid profile data", details));
    }

    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let profile = tokio::task::spawn_blocking(move || {
        // Reuse the existing profile id on update so swipes and matches
        // keep pointing at the same student.
        let profile_id = match db.get_student_profile_by_user(&user_id)? {
            Some(existing) => existing.id,
            None => Uuid::new_v4().to_string(),
        };

        db.upsert_student_profile(
            &profile_id,
            &user_id,
            req.first_name.trim(),
            req.last_name.trim(),
            &req.canton,
            req.city.trim(),
        )?;
        db.set_desired_fields(&profile_id, &req.desired_fields)?;
        db.get_student_profile_by_user(&user_id)
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??
    .ok_or_else(ApiError::internal)?;

    let db = state.db.clone();
    let profile_id = profile.id.clone();
    let desired_fields =
        tokio::task::spawn_blocking(move || db.get_desired_fields(&profile_id))
            .await
            .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok((
        StatusCode::OK,
        Json(StudentProfileResponse {
            id: profile.id.parse().unwrap_or_default(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            canton: profile.canton,
            city: profile.city,
            desired_fields,
            quiz_completed: profile.quiz_completed_at.is_some(),
        }),
    ))
}

/// Store the quiz's numeric output — the OCEAN and RIASEC vectors — and
/// stamp the quiz as completed. The quiz UI lives in the clients.
pub async fn submit_traits(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TraitsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students can submit quiz traits"));
    }

    let mut details: HashMap<String, Vec<String>> = HashMap::new();
    let ocean = req.ocean.to_vec();
    let riasec = req.riasec.to_vec();
    let ocean_fields = [
        "ocean.openness",
        "ocean.conscientiousness",
        "ocean.extraversion",
        "ocean.agreeableness",
        "ocean.neuroticism",
    ];
    let riasec_fields = [
        "riasec.realistic",
        "riasec.investigative",
        "riasec.artistic",
        "riasec.social",
        "riasec.enterprising",
        "riasec.conventional",
    ];
    for (value, field) in ocean.iter().zip(ocean_fields) {
        if !(0.0..=1.0).contains(value) {
            details
                .entry(field.into())
                .or_default()
                .push("must be between 0 and 1".into());
        }
    }
    for (value, field) in riasec.iter().zip(riasec_fields) {
        if !(0.0..=1.0).contains(value) {
            details
                .entry(field.into())
                .or_default()
                .push("must be between 0 and 1".into());
        }
    }
    if !details.is_empty() {
        return Err(ApiError::validation("Invalid trait vectors", details));
    }

    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let updated = tokio::task::spawn_blocking(move || db.set_student_traits(&user_id, ocean, riasec))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    if !updated {
        return Err(ApiError::not_found("Student profile not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Create or update the caller's company profile.
pub async fn upsert_company_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CompanyProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Company {
        return Err(ApiError::forbidden("Only companies have a company profile"));
    }

    let mut details: HashMap<String, Vec<String>> = HashMap::new();
    if req.company_name.trim().is_empty() {
        details
            .entry("company_name".into())
            .or_default()
            .push("must not be empty".into());
    }
    if req.canton.len() != 2 || !req.canton.chars().all(|c| c.is_ascii_uppercase()) {
        details
            .entry("canton".into())
            .or_default()
            .push("must be a two-letter canton code".into());
    }
    if !details.is_empty() {
        return Err(ApiError::validation("Invalid profile data", details));
    }

    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        let profile_id = match db.get_company_profile_by_user(&user_id)? {
            Some(existing) => existing.id,
            None => Uuid::new_v4().to_string(),
        };
        db.upsert_company_profile(
            &profile_id,
            &user_id,
            req.company_name.trim(),
            &req.canton,
            req.city.trim(),
        )
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok(StatusCode::OK)
}
