use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use lehrmatch_matching::careers::{match_careers, CAREER_ARCHETYPES};
use lehrmatch_types::api::{
    CareerMatchResponse, Claims, FavoriteToggleResponse, SharedDimensionDto,
};
use lehrmatch_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::feed::student_traits;

/// How many career matches the endpoint returns at most.
pub const CAREER_MATCH_LIMIT: usize = 15;

pub async fn get_career_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<CareerMatchResponse>>, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students can match careers"));
    }

    Ok(Json(career_matches_for_user(&state, claims.sub).await?))
}

/// Rank the career catalog against the student's interest profile.
/// Before the quiz there is nothing to rank against: the list is empty.
pub(crate) async fn career_matches_for_user(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<CareerMatchResponse>, ApiError> {
    let db = state.db.clone();
    let uid = user_id.to_string();
    let profile = tokio::task::spawn_blocking(move || db.get_student_profile_by_user(&uid))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??
        .ok_or_else(|| ApiError::not_found("Student profile not found"))?;

    if profile.quiz_completed_at.is_none() || profile.riasec.iter().all(|v| *v == 0.0) {
        return Ok(vec![]);
    }

    let riasec = student_traits(&profile).riasec;
    let matches = match_careers(&riasec, CAREER_ARCHETYPES, CAREER_MATCH_LIMIT);

    Ok(matches
        .into_iter()
        .map(|m| CareerMatchResponse {
            code: m.archetype.code.to_string(),
            name: m.archetype.name.to_string(),
            field: m.archetype.field.to_string(),
            match_percentage: m.match_percentage,
            shared_dimensions: m
                .shared_dimensions
                .into_iter()
                .map(|d| SharedDimensionDto {
                    key: d.dimension.key().to_string(),
                    label: d.dimension.label().to_string(),
                    user_score: d.user_score,
                    career_score: d.career_score,
                })
                .collect(),
            explanations: m.explanations.into_iter().map(Into::into).collect(),
        })
        .collect())
}

pub async fn get_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<String>>, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students have favorite careers"));
    }

    let db = state.db.clone();
    let uid = claims.sub.to_string();
    let codes = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ApiError> {
        let profile = db
            .get_student_profile_by_user(&uid)?
            .ok_or_else(|| ApiError::not_found("Student profile not found"))?;
        Ok(db.favorite_career_codes(&profile.id)?)
    })
    .await
    .map_err(|e| ApiError::from(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    Ok(Json(codes))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FavoriteToggleResponse>, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students have favorite careers"));
    }

    if !CAREER_ARCHETYPES.iter().any(|a| a.code == code) {
        return Err(ApiError::not_found("Unknown career"));
    }

    let db = state.db.clone();
    let uid = claims.sub.to_string();
    let is_favorite = tokio::task::spawn_blocking(move || -> Result<bool, ApiError> {
        let profile = db
            .get_student_profile_by_user(&uid)?
            .ok_or_else(|| ApiError::not_found("Student profile not found"))?;
        Ok(db.toggle_favorite_career(&profile.id, &code)?)
    })
    .await
    .map_err(|e| ApiError::from(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    Ok(Json(FavoriteToggleResponse { is_favorite }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AppStateInner;
    use lehrmatch_db::Database;
    use lehrmatch_gateway::dispatcher::Dispatcher;
    use std::sync::Arc;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Arc::new(Database::open_in_memory().unwrap()),
            jwt_secret: "test-secret".into(),
            dispatcher: Dispatcher::new(),
        })
    }

    fn seed_student(state: &AppState, quiz_done: bool) -> Uuid {
        let user_id = Uuid::new_v4();
        let student_id = Uuid::new_v4().to_string();
        state
            .db
            .create_user(&user_id.to_string(), "mia@test.ch", "hash", "STUDENT")
            .unwrap();
        state
            .db
            .upsert_student_profile(&student_id, &user_id.to_string(), "Mia", "Keller", "ZH", "Zürich")
            .unwrap();
        if quiz_done {
            state
                .db
                .set_student_traits(
                    &user_id.to_string(),
                    [0.7, 0.8, 0.5, 0.6, 0.3],
                    [0.4, 0.8, 0.3, 0.5, 0.6, 0.7],
                )
                .unwrap();
        }
        user_id
    }

    #[tokio::test]
    async fn quiz_incomplete_yields_an_empty_list() {
        let state = test_state();
        let user_id = seed_student(&state, false);

        let matches = career_matches_for_user(&state, user_id).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn completed_quiz_yields_ranked_matches() {
        let state = test_state();
        let user_id = seed_student(&state, true);

        let matches = career_matches_for_user(&state, user_id).await.unwrap();
        assert!(!matches.is_empty());
        assert!(matches.len() <= CAREER_MATCH_LIMIT);
        for pair in matches.windows(2) {
            assert!(pair[0].match_percentage >= pair[1].match_percentage);
        }
    }
}
