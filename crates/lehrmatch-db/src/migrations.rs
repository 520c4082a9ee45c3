use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS student_profiles (
            id                      TEXT PRIMARY KEY,
            user_id                 TEXT NOT NULL UNIQUE REFERENCES users(id),
            first_name              TEXT NOT NULL,
            last_name               TEXT NOT NULL,
            canton                  TEXT NOT NULL,
            city                    TEXT NOT NULL,
            ocean_openness          REAL NOT NULL DEFAULT 0,
            ocean_conscientiousness REAL NOT NULL DEFAULT 0,
            ocean_extraversion      REAL NOT NULL DEFAULT 0,
            ocean_agreeableness     REAL NOT NULL DEFAULT 0,
            ocean_neuroticism       REAL NOT NULL DEFAULT 0,
            riasec_realistic        REAL NOT NULL DEFAULT 0,
            riasec_investigative    REAL NOT NULL DEFAULT 0,
            riasec_artistic         REAL NOT NULL DEFAULT 0,
            riasec_social           REAL NOT NULL DEFAULT 0,
            riasec_enterprising     REAL NOT NULL DEFAULT 0,
            riasec_conventional     REAL NOT NULL DEFAULT 0,
            quiz_completed_at       TEXT,
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS desired_fields (
            student_id  TEXT NOT NULL REFERENCES student_profiles(id),
            field       TEXT NOT NULL,
            priority    INTEGER NOT NULL,
            UNIQUE(student_id, field)
        );

        CREATE TABLE IF NOT EXISTS company_profiles (
            id           TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL UNIQUE REFERENCES users(id),
            company_name TEXT NOT NULL,
            canton       TEXT NOT NULL,
            city         TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Primary listing store. Rows with source = 'import' are proxies for
        -- imported_listings entries, created when a student first swipes on
        -- one, so that swipes/matches/messages keep their foreign keys.
        CREATE TABLE IF NOT EXISTS listings (
            id                            TEXT PRIMARY KEY,
            company_id                    TEXT NOT NULL,
            company_name                  TEXT,
            title                         TEXT NOT NULL,
            description                   TEXT NOT NULL,
            field                         TEXT NOT NULL,
            career_code                   TEXT,
            canton                        TEXT NOT NULL,
            city                          TEXT NOT NULL,
            ideal_ocean_openness          REAL,
            ideal_ocean_conscientiousness REAL,
            ideal_ocean_extraversion      REAL,
            ideal_ocean_agreeableness     REAL,
            ideal_ocean_neuroticism       REAL,
            ideal_riasec_realistic        REAL,
            ideal_riasec_investigative    REAL,
            ideal_riasec_artistic         REAL,
            ideal_riasec_social           REAL,
            ideal_riasec_enterprising     REAL,
            ideal_riasec_conventional     REAL,
            is_active                     INTEGER NOT NULL DEFAULT 1,
            spots_available               INTEGER NOT NULL DEFAULT 1,
            source                        TEXT NOT NULL DEFAULT 'native',
            created_at                    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_listings_canton
            ON listings(canton, is_active);

        -- Legacy-imported listing store. Carries no ideal trait profiles;
        -- scoring falls back to the per-field default interest profile.
        CREATE TABLE IF NOT EXISTS imported_listings (
            id              TEXT PRIMARY KEY,
            company_id      TEXT NOT NULL,
            company_name    TEXT NOT NULL,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            field           TEXT NOT NULL,
            career_code     TEXT,
            canton          TEXT NOT NULL,
            city            TEXT NOT NULL,
            is_active       INTEGER NOT NULL DEFAULT 1,
            spots_available INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_imported_listings_canton
            ON imported_listings(canton, is_active);

        CREATE TABLE IF NOT EXISTS swipes (
            id          TEXT PRIMARY KEY,
            student_id  TEXT NOT NULL REFERENCES student_profiles(id),
            listing_id  TEXT NOT NULL REFERENCES listings(id),
            direction   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(student_id, listing_id)
        );

        CREATE INDEX IF NOT EXISTS idx_swipes_student
            ON swipes(student_id);

        CREATE TABLE IF NOT EXISTS matches (
            id                  TEXT PRIMARY KEY,
            student_id          TEXT NOT NULL REFERENCES student_profiles(id),
            listing_id          TEXT NOT NULL REFERENCES listings(id),
            compatibility_score INTEGER NOT NULL,
            status              TEXT NOT NULL DEFAULT 'ACTIVE',
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_matches_student
            ON matches(student_id);

        CREATE INDEX IF NOT EXISTS idx_matches_listing
            ON matches(listing_id);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            match_id    TEXT NOT NULL REFERENCES matches(id),
            sender_id   TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            type        TEXT NOT NULL DEFAULT 'TEXT',
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_match
            ON messages(match_id, created_at);

        CREATE TABLE IF NOT EXISTS favorite_careers (
            student_id  TEXT NOT NULL REFERENCES student_profiles(id),
            career_code TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(student_id, career_code)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
