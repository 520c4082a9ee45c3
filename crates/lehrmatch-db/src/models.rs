/// Database row types — these map directly to SQLite rows.
/// Distinct from lehrmatch-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct StudentProfileRow {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub canton: String,
    pub city: String,
    pub ocean: [f64; 5],
    pub riasec: [f64; 6],
    pub quiz_completed_at: Option<String>,
}

pub struct CompanyProfileRow {
    pub id: String,
    pub user_id: String,
    pub company_name: String,
    pub canton: String,
    pub city: String,
}

/// A listing from the primary store. `company_name` is resolved from the
/// company profile for native rows and denormalized for imported proxies.
pub struct ListingRow {
    pub id: String,
    pub company_id: String,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub field: String,
    pub career_code: Option<String>,
    pub canton: String,
    pub city: String,
    pub ideal_ocean: [Option<f64>; 5],
    pub ideal_riasec: [Option<f64>; 6],
    pub is_active: bool,
    pub spots_available: i64,
    pub source: String,
    pub created_at: String,
}

pub struct ImportedListingRow {
    pub id: String,
    pub company_id: String,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub field: String,
    pub career_code: Option<String>,
    pub canton: String,
    pub city: String,
    pub is_active: bool,
    pub spots_available: i64,
    pub created_at: String,
}

pub struct MatchRow {
    pub id: String,
    pub student_id: String,
    pub listing_id: String,
    pub compatibility_score: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A match joined with the listing columns the match list renders.
pub struct MatchListingRow {
    pub id: String,
    pub student_id: String,
    pub listing_id: String,
    pub compatibility_score: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub company_id: String,
    pub company_name: String,
    pub listing_title: String,
    pub listing_field: String,
    pub listing_canton: String,
    pub listing_city: String,
}

/// The two user ids allowed to act in a match's chat. The company side is
/// absent for proxy listings whose company never registered.
pub struct MatchParties {
    pub student_user_id: String,
    pub company_user_id: Option<String>,
}

pub struct MessageRow {
    pub id: String,
    pub match_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: String,
    pub is_read: bool,
    pub created_at: String,
}
