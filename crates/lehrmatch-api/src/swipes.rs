use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use uuid::Uuid;

use lehrmatch_db::models::ListingRow;
use lehrmatch_db::queries::{NewMatch, NewSwipe, SwipeOutcome};
use lehrmatch_matching::scoring::{compatibility, ListingProfile};
use lehrmatch_types::api::{Claims, SwipeRequest, SwipeResponse};
use lehrmatch_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::feed::{ideal_ocean, ideal_riasec, student_traits};

/// System greeting dropped into every fresh match conversation.
const MATCH_GREETING: &str = "Es ist ein Match! Startet eine Unterhaltung.";

pub async fn record_swipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SwipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students can swipe"));
    }

    let response = record_swipe_for_user(&state, claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Record a student's decision on a listing. A right or super swipe creates
/// exactly one match, scored fresh at swipe time rather than reusing the
/// feed's snapshot.
pub(crate) async fn record_swipe_for_user(
    state: &AppState,
    user_id: Uuid,
    req: SwipeRequest,
) -> Result<SwipeResponse, ApiError> {
    let db = state.db.clone();
    let uid = user_id.to_string();
    let listing_id = req.listing_id.to_string();
    let direction = req.direction;

    tokio::task::spawn_blocking(move || -> Result<SwipeResponse, ApiError> {
        let profile = db
            .get_student_profile_by_user(&uid)?
            .ok_or_else(|| ApiError::not_found("Student profile not found"))?;

        // Resolve the listing. One that lives only in the imported store
        // gets a durable proxy row first, so the swipe's foreign key holds.
        let listing = match db.get_listing(&listing_id)? {
            Some(listing) => listing,
            None => {
                let imported = db
                    .get_imported_listing(&listing_id)?
                    .ok_or_else(|| ApiError::not_found("Listing not found"))?;
                db.ensure_listing_proxy(&imported)?;
                db.get_listing(&listing_id)?.ok_or_else(ApiError::internal)?
            }
        };

        let new_match = if direction.creates_match() {
            let desired_fields = db.get_desired_fields(&profile.id)?;
            let result = compatibility(
                &student_traits(&profile),
                &listing_profile(&listing),
                &desired_fields,
            );
            Some(NewMatch {
                id: Uuid::new_v4().to_string(),
                compatibility_score: result.total as i64,
                greeting_message_id: Uuid::new_v4().to_string(),
                sender_id: uid.clone(),
                greeting: MATCH_GREETING.into(),
            })
        } else {
            None
        };

        let swipe = NewSwipe {
            id: Uuid::new_v4().to_string(),
            student_id: profile.id,
            listing_id: listing.id,
            direction: direction.as_str().into(),
        };

        match db.record_swipe(&swipe, new_match.as_ref())? {
            SwipeOutcome::Duplicate => Err(ApiError::conflict(
                "Already swiped on this listing",
                "ALREADY_SWIPED",
            )),
            SwipeOutcome::Recorded => Ok(match new_match {
                Some(m) => SwipeResponse {
                    is_match: true,
                    match_id: Some(m.id.parse().unwrap_or_default()),
                    compatibility_score: Some(m.compatibility_score as u8),
                },
                None => SwipeResponse {
                    is_match: false,
                    match_id: None,
                    compatibility_score: None,
                },
            }),
        }
    })
    .await
    .map_err(|e| ApiError::from(anyhow::anyhow!("spawn_blocking join error: {e}")))?
}

fn listing_profile(row: &ListingRow) -> ListingProfile {
    ListingProfile {
        canton: row.canton.clone(),
        field: row.field.clone(),
        ideal_ocean: ideal_ocean(row.ideal_ocean),
        ideal_riasec: ideal_riasec(row.ideal_riasec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AppStateInner;
    use lehrmatch_db::models::ImportedListingRow;
    use lehrmatch_db::queries::NewListing;
    use lehrmatch_db::Database;
    use lehrmatch_gateway::dispatcher::Dispatcher;
    use lehrmatch_types::models::SwipeDirection;
    use std::sync::Arc;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Arc::new(Database::open_in_memory().unwrap()),
            jwt_secret: "test-secret".into(),
            dispatcher: Dispatcher::new(),
        })
    }

    fn seed_student(state: &AppState) -> Uuid {
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
        state
            .db
            .set_student_traits(
                &user_id.to_string(),
                [0.7, 0.8, 0.5, 0.6, 0.3],
                [0.4, 0.8, 0.3, 0.5, 0.6, 0.7],
            )
            .unwrap();
        user_id
    }

    fn seed_listing(state: &AppState) -> Uuid {
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
                ideal_ocean: [Some(0.7), Some(0.8), Some(0.5), Some(0.6), Some(0.3)],
                ideal_riasec: [Some(0.4), Some(0.8), Some(0.3), Some(0.5), Some(0.6), Some(0.7)],
                spots_available: 1,
            })
            .unwrap();
        listing_id
    }

    #[tokio::test]
    async fn right_swipe_creates_a_match_with_a_fresh_score() {
        let state = test_state();
        let user_id = seed_student(&state);
        let listing_id = seed_listing(&state);

        let response = record_swipe_for_user(
            &state,
            user_id,
            SwipeRequest {
                listing_id,
                direction: SwipeDirection::Right,
            },
        )
        .await
        .unwrap();

        assert!(response.is_match);
        let match_id = response.match_id.unwrap();

        // The stored score matches a fresh evaluation at swipe time.
        let profile = state
            .db
            .get_student_profile_by_user(&user_id.to_string())
            .unwrap()
            .unwrap();
        let listing = state
            .db
            .get_listing(&listing_id.to_string())
            .unwrap()
            .unwrap();
        let expected = compatibility(&student_traits(&profile), &listing_profile(&listing), &[]);
        assert_eq!(response.compatibility_score, Some(expected.total));

        let stored = state.db.get_match(&match_id.to_string()).unwrap().unwrap();
        assert_eq!(stored.compatibility_score, expected.total as i64);
    }

    #[tokio::test]
    async fn second_swipe_is_a_conflict_with_a_specific_code() {
        let state = test_state();
        let user_id = seed_student(&state);
        let listing_id = seed_listing(&state);

        record_swipe_for_user(
            &state,
            user_id,
            SwipeRequest {
                listing_id,
                direction: SwipeDirection::Left,
            },
        )
        .await
        .unwrap();

        let err = record_swipe_for_user(
            &state,
            user_id,
            SwipeRequest {
                listing_id,
                direction: SwipeDirection::Right,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "ALREADY_SWIPED");
    }

    #[tokio::test]
    async fn left_swipe_never_creates_a_match() {
        let state = test_state();
        let user_id = seed_student(&state);
        let listing_id = seed_listing(&state);

        let response = record_swipe_for_user(
            &state,
            user_id,
            SwipeRequest {
                listing_id,
                direction: SwipeDirection::Left,
            },
        )
        .await
        .unwrap();

        assert!(!response.is_match);
        assert!(response.match_id.is_none());

        let count: i64 = state
            .db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))
                    .map_err(Into::into)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn swiping_an_imported_listing_creates_its_proxy_first() {
        let state = test_state();
        let user_id = seed_student(&state);

        let imported_id = Uuid::new_v4();
        state
            .db
            .insert_imported_listing(&ImportedListingRow {
                id: imported_id.to_string(),
                company_id: Uuid::new_v4().to_string(),
                company_name: "Legacy GmbH".into(),
                title: "Kauffrau/Kaufmann EFZ".into(),
                description: "Importiert".into(),
                field: "kv".into(),
                career_code: None,
                canton: "ZH".into(),
                city: "Zürich".into(),
                is_active: true,
                spots_available: 1,
                created_at: String::new(),
            })
            .unwrap();

        let response = record_swipe_for_user(
            &state,
            user_id,
            SwipeRequest {
                listing_id: imported_id,
                direction: SwipeDirection::Super,
            },
        )
        .await
        .unwrap();

        assert!(response.is_match);

        let proxy = state
            .db
            .get_listing(&imported_id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(proxy.source, "import");
        assert_eq!(proxy.company_name, "Legacy GmbH");
    }

    #[tokio::test]
    async fn unknown_listing_is_not_found() {
        let state = test_state();
        let user_id = seed_student(&state);

        let err = record_swipe_for_user(
            &state,
            user_id,
            SwipeRequest {
                listing_id: Uuid::new_v4(),
                direction: SwipeDirection::Right,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
