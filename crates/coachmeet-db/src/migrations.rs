use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                phone           TEXT NOT NULL,
                gender          TEXT NOT NULL CHECK (gender IN ('male', 'female')),
                date_of_birth   TEXT,
                description     TEXT NOT NULL DEFAULT '',
                is_coach        INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE areas (
                id      TEXT PRIMARY KEY,
                name    TEXT NOT NULL
            );

            CREATE TABLE groups (
                id          TEXT PRIMARY KEY,
                coach_id    TEXT NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                area_id     TEXT NOT NULL REFERENCES areas(id)
            );

            CREATE INDEX idx_groups_area ON groups(area_id);
            CREATE INDEX idx_groups_coach ON groups(coach_id);

            -- Membership edges carry no uniqueness constraint; callers guard
            -- against duplicates with member_exists.
            CREATE TABLE group_members (
                group_id    TEXT NOT NULL REFERENCES groups(id),
                user_id     TEXT NOT NULL REFERENCES users(id)
            );

            CREATE INDEX idx_group_members_group ON group_members(group_id);
            CREATE INDEX idx_group_members_user ON group_members(user_id);

            CREATE TABLE meetings (
                id          TEXT PRIMARY KEY,
                group_id    TEXT NOT NULL REFERENCES groups(id),
                max_members INTEGER NOT NULL,
                date        TEXT NOT NULL,
                duration    INTEGER NOT NULL,
                city        TEXT NOT NULL,
                street      TEXT NOT NULL
            );

            CREATE INDEX idx_meetings_group ON meetings(group_id, date);

            CREATE TABLE meeting_members (
                meeting_id  TEXT NOT NULL REFERENCES meetings(id),
                user_id     TEXT NOT NULL REFERENCES users(id)
            );

            CREATE INDEX idx_meeting_members_meeting ON meeting_members(meeting_id);
            CREATE INDEX idx_meeting_members_user ON meeting_members(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    if version < 2 {
        info!("Running migration v2 (session token versions)");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            -- Bumped on logout and password change; tokens carrying an
            -- older version are rejected.
            ALTER TABLE users ADD COLUMN token_version INTEGER NOT NULL DEFAULT 0;

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}
