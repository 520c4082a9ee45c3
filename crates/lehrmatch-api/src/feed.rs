use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::{error, warn};
use uuid::Uuid;

use lehrmatch_db::models::{ImportedListingRow, ListingRow, StudentProfileRow};
use lehrmatch_db::Database;
use lehrmatch_gateway::chat::parse_timestamp;
use lehrmatch_matching::cantons;
use lehrmatch_matching::scoring::{compatibility, ListingProfile, StudentTraits};
use lehrmatch_types::api::{Claims, ListingWithScore, ScoreBreakdown};
use lehrmatch_types::models::{IdealOcean, IdealRiasec, OceanScores, RiasecScores, Role};

use crate::auth::AppState;
use crate::error::ApiError;

/// Maximum number of cards in one feed.
pub const FEED_SIZE: usize = 50;

/// Candidates scoring below this are not worth showing.
pub const MIN_SCORE: u8 = 30;

/// Bonus for listings whose career the student has favorited.
pub const FAVORITE_BOOST: u8 = 15;

/// Score shown on unscored cards while the quiz is still open.
const UNSCORED_NEUTRAL: u8 = 50;

/// A listing candidate normalized from either backing store.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub company_id: String,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub field: String,
    pub career_code: Option<String>,
    pub canton: String,
    pub city: String,
    pub spots_available: i64,
    pub created_at: String,
    pub ideal_ocean: [Option<f64>; 5],
    pub ideal_riasec: [Option<f64>; 6],
}

impl From<ListingRow> for Candidate {
    fn from(row: ListingRow) -> Self {
        Candidate {
            id: row.id,
            company_id: row.company_id,
            company_name: row.company_name,
            title: row.title,
            description: row.description,
            field: row.field,
            career_code: row.career_code,
            canton: row.canton,
            city: row.city,
            spots_available: row.spots_available,
            created_at: row.created_at,
            ideal_ocean: row.ideal_ocean,
            ideal_riasec: row.ideal_riasec,
        }
    }
}

impl From<ImportedListingRow> for Candidate {
    fn from(row: ImportedListingRow) -> Self {
        Candidate {
            id: row.id,
            company_id: row.company_id,
            company_name: row.company_name,
            title: row.title,
            description: row.description,
            field: row.field,
            career_code: row.career_code,
            canton: row.canton,
            city: row.city,
            spots_available: row.spots_available,
            created_at: row.created_at,
            // Imported rows carry no ideal profiles; scoring falls back to
            // the per-field default interest profile.
            ideal_ocean: [None; 5],
            ideal_riasec: [None; 6],
        }
    }
}

/// One backing store of feed candidates. Sources stay ignorant of each
/// other; the merge happens in the feed build.
pub trait CandidateSource: Send + Sync {
    fn label(&self) -> &'static str;
    fn fetch(&self, cantons: Option<&[String]>) -> anyhow::Result<Vec<Candidate>>;
}

pub struct PrimarySource {
    pub db: Arc<Database>,
}

impl CandidateSource for PrimarySource {
    fn label(&self) -> &'static str {
        "primary"
    }

    fn fetch(&self, cantons: Option<&[String]>) -> anyhow::Result<Vec<Candidate>> {
        Ok(self
            .db
            .get_active_listings(cantons)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

pub struct ImportedSource {
    pub db: Arc<Database>,
}

impl CandidateSource for ImportedSource {
    fn label(&self) -> &'static str {
        "imported"
    }

    fn fetch(&self, cantons: Option<&[String]>) -> anyhow::Result<Vec<Candidate>> {
        Ok(self
            .db
            .get_active_imported_listings(cantons)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

async fn fetch_one(
    source: Arc<dyn CandidateSource>,
    cantons: Option<Vec<String>>,
) -> anyhow::Result<Vec<Candidate>> {
    tokio::task::spawn_blocking(move || source.fetch(cantons.as_deref()))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))?
}

/// Fetch both sources concurrently, merge, and dedup by id with the primary
/// store winning (a swiped import exists in both). One failed source
/// degrades to the other; only both failing is an error.
pub(crate) async fn fetch_candidates(
    primary: Arc<dyn CandidateSource>,
    secondary: Arc<dyn CandidateSource>,
    cantons: Option<Vec<String>>,
) -> Result<Vec<Candidate>, ApiError> {
    let primary_label = primary.label();
    let secondary_label = secondary.label();

    let (primary_result, secondary_result) = tokio::join!(
        fetch_one(primary, cantons.clone()),
        fetch_one(secondary, cantons)
    );

    let (primary_rows, secondary_rows) = match (primary_result, secondary_result) {
        (Ok(p), Ok(s)) => (p, s),
        (Ok(p), Err(e)) => {
            warn!("{} source unavailable, serving degraded feed: {:#}", secondary_label, e);
            (p, vec![])
        }
        (Err(e), Ok(s)) => {
            warn!("{} source unavailable, serving degraded feed: {:#}", primary_label, e);
            (vec![], s)
        }
        (Err(e1), Err(e2)) => {
            error!("Both listing sources unavailable: {:#}; {:#}", e1, e2);
            return Err(ApiError::service_unavailable("Listing sources are unavailable"));
        }
    };

    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(primary_rows.len() + secondary_rows.len());
    for candidate in primary_rows.into_iter().chain(secondary_rows) {
        if seen.insert(candidate.id.clone()) {
            merged.push(candidate);
        }
    }
    Ok(merged)
}

pub(crate) fn student_traits(profile: &StudentProfileRow) -> StudentTraits {
    StudentTraits {
        canton: profile.canton.clone(),
        ocean: OceanScores {
            openness: profile.ocean[0],
            conscientiousness: profile.ocean[1],
            extraversion: profile.ocean[2],
            agreeableness: profile.ocean[3],
            neuroticism: profile.ocean[4],
        },
        riasec: RiasecScores {
            realistic: profile.riasec[0],
            investigative: profile.riasec[1],
            artistic: profile.riasec[2],
            social: profile.riasec[3],
            enterprising: profile.riasec[4],
            conventional: profile.riasec[5],
        },
    }
}

pub(crate) fn ideal_ocean(components: [Option<f64>; 5]) -> IdealOcean {
    IdealOcean {
        openness: components[0],
        conscientiousness: components[1],
        extraversion: components[2],
        agreeableness: components[3],
        neuroticism: components[4],
    }
}

pub(crate) fn ideal_riasec(components: [Option<f64>; 6]) -> IdealRiasec {
    IdealRiasec {
        realistic: components[0],
        investigative: components[1],
        artistic: components[2],
        social: components[3],
        enterprising: components[4],
        conventional: components[5],
    }
}

fn candidate_profile(candidate: &Candidate) -> ListingProfile {
    ListingProfile {
        canton: candidate.canton.clone(),
        field: candidate.field.clone(),
        ideal_ocean: ideal_ocean(candidate.ideal_ocean),
        ideal_riasec: ideal_riasec(candidate.ideal_riasec),
    }
}

/// Assemble the swipe feed for one student.
pub async fn build_feed(
    state: &AppState,
    profile: &StudentProfileRow,
) -> Result<Vec<ListingWithScore>, ApiError> {
    // Read-only snapshots, taken once per build. A swipe that lands while
    // this build runs is picked up by the next build.
    let db = state.db.clone();
    let student_id = profile.id.clone();
    let (swiped, favorites, desired_fields) = tokio::task::spawn_blocking(move || {
        let swiped = db.swiped_listing_ids(&student_id)?;
        let favorites = db.favorite_career_codes(&student_id)?;
        let desired = db.get_desired_fields(&student_id)?;
        Ok::<_, anyhow::Error>((swiped, favorites, desired))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    let swiped: HashSet<String> = swiped.into_iter().collect();
    let favorites: HashSet<String> = favorites.into_iter().collect();

    let quiz_done = profile.quiz_completed_at.is_some();
    let cantons = quiz_done.then(|| cantons::search_region(&profile.canton));

    let primary: Arc<dyn CandidateSource> = Arc::new(PrimarySource {
        db: state.db.clone(),
    });
    let secondary: Arc<dyn CandidateSource> = Arc::new(ImportedSource {
        db: state.db.clone(),
    });

    let mut candidates = fetch_candidates(primary, secondary, cantons).await?;
    candidates.retain(|c| !swiped.contains(&c.id));

    // Before the quiz there is nothing to score against: serve the newest
    // listings as-is.
    if !quiz_done {
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        candidates.truncate(FEED_SIZE);
        return Ok(candidates
            .into_iter()
            .map(|c| to_dto(c, UNSCORED_NEUTRAL, vec![]))
            .collect());
    }

    let traits = student_traits(profile);
    let mut scored: Vec<(Candidate, u8, Vec<ScoreBreakdown>)> = candidates
        .into_iter()
        .map(|candidate| {
            let result = compatibility(&traits, &candidate_profile(&candidate), &desired_fields);
            let mut total = result.total;
            if candidate
                .career_code
                .as_deref()
                .is_some_and(|code| favorites.contains(code))
            {
                total = total.saturating_add(FAVORITE_BOOST).min(100);
            }
            (candidate, total, result.breakdown.to_vec())
        })
        .collect();

    scored.retain(|(_, total, _)| *total >= MIN_SCORE);
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(FEED_SIZE);

    Ok(scored
        .into_iter()
        .map(|(candidate, total, breakdown)| to_dto(candidate, total, breakdown))
        .collect())
}

fn to_dto(candidate: Candidate, score: u8, breakdown: Vec<ScoreBreakdown>) -> ListingWithScore {
    ListingWithScore {
        id: parse_id(&candidate.id),
        company_id: parse_id(&candidate.company_id),
        company_name: candidate.company_name,
        title: candidate.title,
        description: candidate.description,
        field: candidate.field,
        career_code: candidate.career_code,
        canton: candidate.canton,
        city: candidate.city,
        spots_available: candidate.spots_available,
        created_at: parse_timestamp(&candidate.created_at),
        compatibility_score: score,
        score_breakdown: breakdown,
    }
}

fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

pub async fn get_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ListingWithScore>>, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::forbidden("Only students can request a feed"));
    }

    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let profile = tokio::task::spawn_blocking(move || db.get_student_profile_by_user(&user_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??
        .ok_or_else(|| ApiError::not_found("Student profile not found"))?;

    let feed = build_feed(&state, &profile).await?;
    Ok(Json(feed))
}
