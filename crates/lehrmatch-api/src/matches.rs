use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use tracing::warn;
use uuid::Uuid;

use lehrmatch_db::models::MessageRow;
use lehrmatch_gateway::chat::{message_response_from_row, parse_timestamp};
use lehrmatch_types::api::{Claims, ListingSummary, MatchSummary};
use lehrmatch_types::models::{MatchStatus, Role};

use crate::auth::AppState;
use crate::error::ApiError;

/// Active matches for the caller — the student's own, or every match on the
/// company's listings — newest activity first, with last message and unread
/// count for the conversation list.
pub async fn get_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MatchSummary>>, ApiError> {
    let db = state.db.clone();
    let uid = claims.sub.to_string();
    let role = claims.role;

    let summaries = tokio::task::spawn_blocking(move || -> Result<Vec<MatchSummary>, ApiError> {
        let rows = match role {
            Role::Student => {
                let profile = db
                    .get_student_profile_by_user(&uid)?
                    .ok_or_else(|| ApiError::not_found("Student profile not found"))?;
                db.matches_for_student(&profile.id)?
            }
            Role::Company => {
                let profile = db
                    .get_company_profile_by_user(&uid)?
                    .ok_or_else(|| ApiError::not_found("Company profile not found"))?;
                db.matches_for_company(&profile.id)?
            }
        };

        let match_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let last_rows = db.last_messages_for_matches(&match_ids)?;
        let unread_rows = db.unread_counts(&match_ids, &uid)?;

        // last_messages_for_matches returns newest-first, so the first row
        // per match is its latest message.
        let mut last_map: HashMap<String, MessageRow> = HashMap::new();
        for row in last_rows {
            last_map.entry(row.match_id.clone()).or_insert(row);
        }
        let unread_map: HashMap<String, i64> = unread_rows.into_iter().collect();

        Ok(rows
            .into_iter()
            .map(|r| {
                let last_message = last_map.get(&r.id).map(message_response_from_row);
                let unread_count = unread_map.get(&r.id).copied().unwrap_or(0);
                MatchSummary {
                    id: parse_id(&r.id),
                    student_id: parse_id(&r.student_id),
                    listing: ListingSummary {
                        id: parse_id(&r.listing_id),
                        company_id: parse_id(&r.company_id),
                        company_name: r.company_name,
                        title: r.listing_title,
                        field: r.listing_field,
                        canton: r.listing_canton,
                        city: r.listing_city,
                    },
                    compatibility_score: r.compatibility_score.clamp(0, 100) as u8,
                    status: MatchStatus::parse(&r.status).unwrap_or(MatchStatus::Active),
                    created_at: parse_timestamp(&r.created_at),
                    last_message,
                    unread_count,
                }
            })
            .collect())
    })
    .await
    .map_err(|e| ApiError::from(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    Ok(Json(summaries))
}

fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AppStateInner;
    use crate::swipes::record_swipe_for_user;
    use lehrmatch_db::queries::NewListing;
    use lehrmatch_db::Database;
    use lehrmatch_gateway::dispatcher::Dispatcher;
    use lehrmatch_types::api::SwipeRequest;
    use lehrmatch_types::models::SwipeDirection;
    use std::sync::Arc;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Arc::new(Database::open_in_memory().unwrap()),
            jwt_secret: "test-secret".into(),
            dispatcher: Dispatcher::new(),
        })
    }

    #[tokio::test]
    async fn match_list_carries_listing_summary_and_unread_count() {
        let state = test_state();

        let student_user = Uuid::new_v4();
        let student_id = Uuid::new_v4().to_string();
        state
            .db
            .create_user(&student_user.to_string(), "mia@test.ch", "hash", "STUDENT")
            .unwrap();
        state
            .db
            .upsert_student_profile(
                &student_id,
                &student_user.to_string(),
                "Mia",
                "Keller",
                "ZH",
                "Zürich",
            )
            .unwrap();
        state
            .db
            .set_student_traits(
                &student_user.to_string(),
                [0.7, 0.8, 0.5, 0.6, 0.3],
                [0.4, 0.8, 0.3, 0.5, 0.6, 0.7],
            )
            .unwrap();

        let company_user = Uuid::new_v4().to_string();
        let company_id = Uuid::new_v4().to_string();
        let listing_id = Uuid::new_v4();
        state
            .db
            .create_user(&company_user, "firma@test.ch", "hash", "COMPANY")
            .unwrap();
        state
            .db
            .upsert_company_profile(&company_id, &company_user, "Muster AG", "ZH", "Zürich")
            .unwrap();
        state
            .db
            .create_listing(&NewListing {
                id: listing_id.to_string(),
                company_id,
                title: "Informatiker/in EFZ".into(),
                description: "Lehrstelle".into(),
                field: "informatik".into(),
                career_code: None,
                canton: "ZH".into(),
                city: "Zürich".into(),
                ideal_ocean: [None; 5],
                ideal_riasec: [None; 6],
                spots_available: 1,
            })
            .unwrap();

        let response = record_swipe_for_user(
            &state,
            student_user,
            SwipeRequest {
                listing_id,
                direction: SwipeDirection::Right,
            },
        )
        .await
        .unwrap();
        let match_id = response.match_id.unwrap();

        // A message from the company that the student has not read yet.
        state
            .db
            .insert_message(
                &Uuid::new_v4().to_string(),
                &match_id.to_string(),
                &company_user,
                "Grüezi!",
                "TEXT",
            )
            .unwrap();

        let rows = state.db.matches_for_student(&student_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company_name, "Muster AG");
        assert_eq!(rows[0].listing_title, "Informatiker/in EFZ");

        let unread = state
            .db
            .unread_counts(&[match_id.to_string()], &student_user.to_string())
            .unwrap();
        assert_eq!(unread, vec![(match_id.to_string(), 1)]);
    }
}
