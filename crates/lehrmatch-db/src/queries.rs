use crate::models::{
    CompanyProfileRow, ImportedListingRow, ListingRow, MatchListingRow, MatchParties, MatchRow,
    MessageRow, StudentProfileRow, UserRow,
};
use crate::Database;
use anyhow::Result;
use rusqlite::{params, Row};

/// A swipe to record. Direction is stored uppercase (RIGHT/LEFT/SUPER).
pub struct NewSwipe {
    pub id: String,
    pub student_id: String,
    pub listing_id: String,
    pub direction: String,
}

/// The match (plus its system greeting) created alongside a positive swipe.
pub struct NewMatch {
    pub id: String,
    pub compatibility_score: i64,
    pub greeting_message_id: String,
    pub sender_id: String,
    pub greeting: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SwipeOutcome {
    Recorded,
    /// The (student, listing) pair was already swiped. Nothing was written.
    Duplicate,
}

pub struct NewListing {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: String,
    pub field: String,
    pub career_code: Option<String>,
    pub canton: String,
    pub city: String,
    pub ideal_ocean: [Option<f64>; 5],
    pub ideal_riasec: [Option<f64>; 6],
    pub spots_available: i64,
}

const LISTING_COLUMNS: &str = "l.id, l.company_id, COALESCE(c.company_name, l.company_name, ''), \
     l.title, l.description, l.field, l.career_code, l.canton, l.city, \
     l.ideal_ocean_openness, l.ideal_ocean_conscientiousness, l.ideal_ocean_extraversion, \
     l.ideal_ocean_agreeableness, l.ideal_ocean_neuroticism, \
     l.ideal_riasec_realistic, l.ideal_riasec_investigative, l.ideal_riasec_artistic, \
     l.ideal_riasec_social, l.ideal_riasec_enterprising, l.ideal_riasec_conventional, \
     l.is_active, l.spots_available, l.source, l.created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str, role: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, role) VALUES (?1, ?2, ?3, ?4)",
                (id, email, password_hash, role),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, password, role, created_at FROM users WHERE email = ?1",
            )?;
            stmt.query_row([email], map_user_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, email, password, role, created_at FROM users WHERE id = ?1")?;
            stmt.query_row([id], map_user_row).optional()
        })
    }

    // -- Student profiles --

    pub fn upsert_student_profile(
        &self,
        id: &str,
        user_id: &str,
        first_name: &str,
        last_name: &str,
        canton: &str,
        city: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO student_profiles (id, user_id, first_name, last_name, canton, city)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     first_name = excluded.first_name,
                     last_name = excluded.last_name,
                     canton = excluded.canton,
                     city = excluded.city",
                params![id, user_id, first_name, last_name, canton, city],
            )?;
            Ok(())
        })
    }

    pub fn get_student_profile_by_user(&self, user_id: &str) -> Result<Option<StudentProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, first_name, last_name, canton, city,
                        ocean_openness, ocean_conscientiousness, ocean_extraversion,
                        ocean_agreeableness, ocean_neuroticism,
                        riasec_realistic, riasec_investigative, riasec_artistic,
                        riasec_social, riasec_enterprising, riasec_conventional,
                        quiz_completed_at
                 FROM student_profiles WHERE user_id = ?1",
            )?;
            stmt.query_row([user_id], map_student_profile_row).optional()
        })
    }

    /// Store the quiz's numeric output and stamp the quiz as completed.
    /// Returns false when no profile exists for the user.
    pub fn set_student_traits(
        &self,
        user_id: &str,
        ocean: [f64; 5],
        riasec: [f64; 6],
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE student_profiles SET
                     ocean_openness = ?2, ocean_conscientiousness = ?3,
                     ocean_extraversion = ?4, ocean_agreeableness = ?5,
                     ocean_neuroticism = ?6,
                     riasec_realistic = ?7, riasec_investigative = ?8,
                     riasec_artistic = ?9, riasec_social = ?10,
                     riasec_enterprising = ?11, riasec_conventional = ?12,
                     quiz_completed_at = datetime('now')
                 WHERE user_id = ?1",
                params![
                    user_id, ocean[0], ocean[1], ocean[2], ocean[3], ocean[4], riasec[0],
                    riasec[1], riasec[2], riasec[3], riasec[4], riasec[5]
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Replace the student's desired fields, keeping the given priority order.
    pub fn set_desired_fields(&self, student_id: &str, fields: &[String]) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM desired_fields WHERE student_id = ?1",
                [student_id],
            )?;
            for (priority, field) in fields.iter().enumerate() {
                conn.execute(
                    "INSERT INTO desired_fields (student_id, field, priority) VALUES (?1, ?2, ?3)",
                    params![student_id, field, priority as i64],
                )?;
            }
            Ok(())
        })
    }

    pub fn get_desired_fields(&self, student_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT field FROM desired_fields WHERE student_id = ?1 ORDER BY priority",
            )?;
            let rows = stmt
                .query_map([student_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Company profiles --

    pub fn upsert_company_profile(
        &self,
        id: &str,
        user_id: &str,
        company_name: &str,
        canton: &str,
        city: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO company_profiles (id, user_id, company_name, canton, city)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     company_name = excluded.company_name,
                     canton = excluded.canton,
                     city = excluded.city",
                params![id, user_id, company_name, canton, city],
            )?;
            Ok(())
        })
    }

    pub fn get_company_profile_by_user(&self, user_id: &str) -> Result<Option<CompanyProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, company_name, canton, city
                 FROM company_profiles WHERE user_id = ?1",
            )?;
            stmt.query_row([user_id], |row| {
                Ok(CompanyProfileRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    company_name: row.get(2)?,
                    canton: row.get(3)?,
                    city: row.get(4)?,
                })
            })
            .optional()
        })
    }

    // -- Listings (primary store) --

    pub fn create_listing(&self, listing: &NewListing) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO listings (
                     id, company_id, title, description, field, career_code, canton, city,
                     ideal_ocean_openness, ideal_ocean_conscientiousness,
                     ideal_ocean_extraversion, ideal_ocean_agreeableness,
                     ideal_ocean_neuroticism,
                     ideal_riasec_realistic, ideal_riasec_investigative,
                     ideal_riasec_artistic, ideal_riasec_social,
                     ideal_riasec_enterprising, ideal_riasec_conventional,
                     spots_available
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                           ?16, ?17, ?18, ?19, ?20)",
                params![
                    listing.id,
                    listing.company_id,
                    listing.title,
                    listing.description,
                    listing.field,
                    listing.career_code,
                    listing.canton,
                    listing.city,
                    listing.ideal_ocean[0],
                    listing.ideal_ocean[1],
                    listing.ideal_ocean[2],
                    listing.ideal_ocean[3],
                    listing.ideal_ocean[4],
                    listing.ideal_riasec[0],
                    listing.ideal_riasec[1],
                    listing.ideal_riasec[2],
                    listing.ideal_riasec[3],
                    listing.ideal_riasec[4],
                    listing.ideal_riasec[5],
                    listing.spots_available,
                ],
            )?;
            Ok(())
        })
    }

    /// Active listings with open spots, newest first, optionally restricted
    /// to a set of cantons.
    pub fn get_active_listings(&self, cantons: Option<&[String]>) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let base = format!(
                "SELECT {LISTING_COLUMNS}
                 FROM listings l
                 LEFT JOIN company_profiles c ON l.company_id = c.id
                 WHERE l.is_active = 1 AND l.spots_available > 0"
            );

            match cantons {
                Some(cantons) if !cantons.is_empty() => {
                    let placeholders: Vec<String> =
                        (1..=cantons.len()).map(|i| format!("?{}", i)).collect();
                    let sql = format!(
                        "{base} AND l.canton IN ({}) ORDER BY l.created_at DESC",
                        placeholders.join(", ")
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let params: Vec<&dyn rusqlite::types::ToSql> = cantons
                        .iter()
                        .map(|c| c as &dyn rusqlite::types::ToSql)
                        .collect();
                    let rows = stmt
                        .query_map(params.as_slice(), map_listing_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
                _ => {
                    let sql = format!("{base} ORDER BY l.created_at DESC");
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([], map_listing_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
            }
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {LISTING_COLUMNS}
                 FROM listings l
                 LEFT JOIN company_profiles c ON l.company_id = c.id
                 WHERE l.id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([id], map_listing_row).optional()
        })
    }

    // -- Imported listings (secondary store) --

    pub fn insert_imported_listing(&self, listing: &ImportedListingRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO imported_listings (
                     id, company_id, company_name, title, description, field,
                     career_code, canton, city, is_active, spots_available
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    listing.id,
                    listing.company_id,
                    listing.company_name,
                    listing.title,
                    listing.description,
                    listing.field,
                    listing.career_code,
                    listing.canton,
                    listing.city,
                    listing.is_active,
                    listing.spots_available,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_active_imported_listings(
        &self,
        cantons: Option<&[String]>,
    ) -> Result<Vec<ImportedListingRow>> {
        self.with_conn(|conn| {
            let base = "SELECT id, company_id, company_name, title, description, field, \
                        career_code, canton, city, is_active, spots_available, created_at \
                        FROM imported_listings \
                        WHERE is_active = 1 AND spots_available > 0";

            match cantons {
                Some(cantons) if !cantons.is_empty() => {
                    let placeholders: Vec<String> =
                        (1..=cantons.len()).map(|i| format!("?{}", i)).collect();
                    let sql = format!(
                        "{base} AND canton IN ({}) ORDER BY created_at DESC",
                        placeholders.join(", ")
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let params: Vec<&dyn rusqlite::types::ToSql> = cantons
                        .iter()
                        .map(|c| c as &dyn rusqlite::types::ToSql)
                        .collect();
                    let rows = stmt
                        .query_map(params.as_slice(), map_imported_listing_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
                _ => {
                    let sql = format!("{base} ORDER BY created_at DESC");
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([], map_imported_listing_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
            }
        })
    }

    pub fn get_imported_listing(&self, id: &str) -> Result<Option<ImportedListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, company_id, company_name, title, description, field, career_code,
                        canton, city, is_active, spots_available, created_at
                 FROM imported_listings WHERE id = ?1",
            )?;
            stmt.query_row([id], map_imported_listing_row).optional()
        })
    }

    /// Create a proxy row in the primary store for an imported listing, so
    /// that swipes and matches can reference it. Idempotent: racing callers
    /// both succeed, the row is written once.
    pub fn ensure_listing_proxy(&self, listing: &ImportedListingRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO listings (
                     id, company_id, company_name, title, description, field,
                     career_code, canton, city, is_active, spots_available, source
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'import')",
                params![
                    listing.id,
                    listing.company_id,
                    listing.company_name,
                    listing.title,
                    listing.description,
                    listing.field,
                    listing.career_code,
                    listing.canton,
                    listing.city,
                    listing.is_active,
                    listing.spots_available,
                ],
            )?;
            Ok(())
        })
    }

    // -- Swipes / matches --

    pub fn swiped_listing_ids(&self, student_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT listing_id FROM swipes WHERE student_id = ?1")?;
            let rows = stmt
                .query_map([student_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Record a swipe and, for a positive direction, its match and system
    /// greeting in one transaction. The swipes UNIQUE constraint is the
    /// arbiter under concurrency: a second writer for the same pair gets
    /// `Duplicate` and nothing is written.
    pub fn record_swipe(&self, swipe: &NewSwipe, new_match: Option<&NewMatch>) -> Result<SwipeOutcome> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let inserted = tx.execute(
                "INSERT INTO swipes (id, student_id, listing_id, direction) VALUES (?1, ?2, ?3, ?4)",
                params![swipe.id, swipe.student_id, swipe.listing_id, swipe.direction],
            );

            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    return Ok(SwipeOutcome::Duplicate);
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(m) = new_match {
                tx.execute(
                    "INSERT INTO matches (id, student_id, listing_id, compatibility_score)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![m.id, swipe.student_id, swipe.listing_id, m.compatibility_score],
                )?;
                tx.execute(
                    "INSERT INTO messages (id, match_id, sender_id, content, type)
                     VALUES (?1, ?2, ?3, ?4, 'SYSTEM')",
                    params![m.greeting_message_id, m.id, m.sender_id, m.greeting],
                )?;
            }

            tx.commit()?;
            Ok(SwipeOutcome::Recorded)
        })
    }

    pub fn get_match(&self, id: &str) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, listing_id, compatibility_score, status,
                        created_at, updated_at
                 FROM matches WHERE id = ?1",
            )?;
            stmt.query_row([id], map_match_row).optional()
        })
    }

    /// The two user ids allowed to act in a match's chat.
    pub fn get_match_parties(&self, match_id: &str) -> Result<Option<MatchParties>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sp.user_id, cp.user_id
                 FROM matches m
                 JOIN student_profiles sp ON m.student_id = sp.id
                 JOIN listings l ON m.listing_id = l.id
                 LEFT JOIN company_profiles cp ON l.company_id = cp.id
                 WHERE m.id = ?1",
            )?;
            stmt.query_row([match_id], |row| {
                Ok(MatchParties {
                    student_user_id: row.get(0)?,
                    company_user_id: row.get(1)?,
                })
            })
            .optional()
        })
    }

    /// Bump a match's activity timestamp so match lists sort by recency.
    pub fn touch_match(&self, match_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE matches SET updated_at = datetime('now') WHERE id = ?1",
                [match_id],
            )?;
            Ok(())
        })
    }

    /// Status transitions are driven by surrounding collaborators (hiring
    /// flow, archival); the core only persists them.
    pub fn set_match_status(&self, match_id: &str, status: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE matches SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
                params![match_id, status],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn matches_for_student(&self, student_id: &str) -> Result<Vec<MatchListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.student_id, m.listing_id, m.compatibility_score, m.status,
                        m.created_at, m.updated_at,
                        l.company_id, COALESCE(c.company_name, l.company_name, ''),
                        l.title, l.field, l.canton, l.city
                 FROM matches m
                 JOIN listings l ON m.listing_id = l.id
                 LEFT JOIN company_profiles c ON l.company_id = c.id
                 WHERE m.student_id = ?1 AND m.status = 'ACTIVE'
                 ORDER BY m.updated_at DESC",
            )?;
            let rows = stmt
                .query_map([student_id], map_match_listing_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn matches_for_company(&self, company_id: &str) -> Result<Vec<MatchListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.student_id, m.listing_id, m.compatibility_score, m.status,
                        m.created_at, m.updated_at,
                        l.company_id, COALESCE(c.company_name, l.company_name, ''),
                        l.title, l.field, l.canton, l.city
                 FROM matches m
                 JOIN listings l ON m.listing_id = l.id
                 LEFT JOIN company_profiles c ON l.company_id = c.id
                 WHERE l.company_id = ?1 AND m.status = 'ACTIVE'
                 ORDER BY m.updated_at DESC",
            )?;
            let rows = stmt
                .query_map([company_id], map_match_listing_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        match_id: &str,
        sender_id: &str,
        content: &str,
        message_type: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, match_id, sender_id, content, type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, match_id, sender_id, content, message_type],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, match_id, sender_id, content, type, is_read, created_at
                 FROM messages WHERE id = ?1",
            )?;
            stmt.query_row([id], map_message_row).optional()
        })
    }

    /// Newest messages first; `before` is an exclusive upper bound on
    /// created_at for cursor pagination.
    pub fn get_messages(
        &self,
        match_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let rows = match before {
                Some(before) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, match_id, sender_id, content, type, is_read, created_at
                         FROM messages
                         WHERE match_id = ?1 AND created_at < ?2
                         ORDER BY created_at DESC
                         LIMIT ?3",
                    )?;
                    stmt.query_map(params![match_id, before, limit], map_message_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, match_id, sender_id, content, type, is_read, created_at
                         FROM messages
                         WHERE match_id = ?1
                         ORDER BY created_at DESC
                         LIMIT ?2",
                    )?;
                    stmt.query_map(params![match_id, limit], map_message_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    /// Flip the read flag on every message the reader did not author.
    /// Returns how many messages changed.
    pub fn mark_messages_read(&self, match_id: &str, reader_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE match_id = ?1 AND sender_id != ?2 AND is_read = 0",
                params![match_id, reader_id],
            )?;
            Ok(changed)
        })
    }

    /// Batch-fetch the newest message per match, for match list previews.
    pub fn last_messages_for_matches(&self, match_ids: &[String]) -> Result<Vec<MessageRow>> {
        if match_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=match_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, match_id, sender_id, content, type, is_read, created_at
                 FROM messages WHERE match_id IN ({})
                 ORDER BY created_at DESC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = match_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Unread message counts per match for one reader.
    pub fn unread_counts(&self, match_ids: &[String], reader_id: &str) -> Result<Vec<(String, i64)>> {
        if match_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=match_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT match_id, COUNT(*) FROM messages
                 WHERE match_id IN ({}) AND is_read = 0 AND sender_id != ?{}
                 GROUP BY match_id",
                placeholders.join(", "),
                match_ids.len() + 1
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = match_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            params.push(&reader_id as &dyn rusqlite::types::ToSql);
            let rows = stmt
                .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Favorite careers --

    pub fn favorite_career_codes(&self, student_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT career_code FROM favorite_careers WHERE student_id = ?1")?;
            let rows = stmt
                .query_map([student_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Toggle a favorite: removes if present, inserts if not.
    /// Returns true when the career is a favorite afterwards.
    pub fn toggle_favorite_career(&self, student_id: &str, career_code: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM favorite_careers WHERE student_id = ?1 AND career_code = ?2",
                    params![student_id, career_code],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                conn.execute(
                    "DELETE FROM favorite_careers WHERE student_id = ?1 AND career_code = ?2",
                    params![student_id, career_code],
                )?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO favorite_careers (student_id, career_code) VALUES (?1, ?2)",
                    params![student_id, career_code],
                )?;
                Ok(true)
            }
        })
    }
}

fn map_user_row(row: &Row) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_student_profile_row(row: &Row) -> std::result::Result<StudentProfileRow, rusqlite::Error> {
    Ok(StudentProfileRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        canton: row.get(4)?,
        city: row.get(5)?,
        ocean: [
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
        ],
        riasec: [
            row.get(11)?,
            row.get(12)?,
            row.get(13)?,
            row.get(14)?,
            row.get(15)?,
            row.get(16)?,
        ],
        quiz_completed_at: row.get(17)?,
    })
}

fn map_listing_row(row: &Row) -> std::result::Result<ListingRow, rusqlite::Error> {
    Ok(ListingRow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        company_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        field: row.get(5)?,
        career_code: row.get(6)?,
        canton: row.get(7)?,
        city: row.get(8)?,
        ideal_ocean: [
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
            row.get(13)?,
        ],
        ideal_riasec: [
            row.get(14)?,
            row.get(15)?,
            row.get(16)?,
            row.get(17)?,
            row.get(18)?,
            row.get(19)?,
        ],
        is_active: row.get(20)?,
        spots_available: row.get(21)?,
        source: row.get(22)?,
        created_at: row.get(23)?,
    })
}

fn map_imported_listing_row(row: &Row) -> std::result::Result<ImportedListingRow, rusqlite::Error> {
    Ok(ImportedListingRow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        company_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        field: row.get(5)?,
        career_code: row.get(6)?,
        canton: row.get(7)?,
        city: row.get(8)?,
        is_active: row.get(9)?,
        spots_available: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn map_match_row(row: &Row) -> std::result::Result<MatchRow, rusqlite::Error> {
    Ok(MatchRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        listing_id: row.get(2)?,
        compatibility_score: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_match_listing_row(row: &Row) -> std::result::Result<MatchListingRow, rusqlite::Error> {
    Ok(MatchListingRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        listing_id: row.get(2)?,
        compatibility_score: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        company_id: row.get(7)?,
        company_name: row.get(8)?,
        listing_title: row.get(9)?,
        listing_field: row.get(10)?,
        listing_canton: row.get(11)?,
        listing_city: row.get(12)?,
    })
}

fn map_message_row(row: &Row) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        match_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        message_type: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
