use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::Result;
use crate::models::{Gender, User};
use crate::rows::user_from_row;

/// Inserts a new user. Email uniqueness is not checked here; a duplicate is
/// rejected by the storage layer as `DbError::Constraint`.
pub fn create(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    phone: &str,
    gender: Gender,
    is_coach: bool,
) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        phone: phone.to_string(),
        gender,
        date_of_birth: None,
        description: String::new(),
        is_coach,
    };

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, phone, gender, description, is_coach)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.phone,
            user.gender,
            user.description,
            user.is_coach,
        ],
    )?;

    Ok(user)
}

pub fn get_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, password_hash, phone, gender, date_of_birth, description, is_coach
             FROM users WHERE id = ?1",
            [id.to_string()],
            |row| user_from_row(row, 0),
        )
        .optional()?;

    Ok(user)
}

pub fn get_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, password_hash, phone, gender, date_of_birth, description, is_coach
             FROM users WHERE email = ?1",
            [email],
            |row| user_from_row(row, 0),
        )
        .optional()?;

    Ok(user)
}

/// Overwrites the editable profile fields. Callers re-fetch to observe the result.
pub fn update_profile(
    conn: &Connection,
    id: Uuid,
    name: &str,
    email: &str,
    phone: &str,
    description: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE users SET name = ?1, email = ?2, phone = ?3, description = ?4 WHERE id = ?5",
        params![name, email, phone, description, id.to_string()],
    )?;
    Ok(())
}

pub fn update_password(conn: &Connection, id: Uuid, password_hash: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, id.to_string()],
    )?;
    Ok(())
}

/// Current session version, `None` when the user does not exist.
pub fn token_version(conn: &Connection, id: Uuid) -> Result<Option<i64>> {
    let version = conn
        .query_row(
            "SELECT token_version FROM users WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version)
}

/// Invalidates every token issued so far and returns the new version.
pub fn bump_token_version(conn: &Connection, id: Uuid) -> Result<Option<i64>> {
    let version = conn
        .query_row(
            "UPDATE users SET token_version = token_version + 1 WHERE id = ?1
             RETURNING token_version",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbError};

    fn sample(conn: &Connection, email: &str) -> User {
        create(conn, "Anna", email, "$argon2id$stub", "+100200", Gender::Female, false).unwrap()
    }

    #[test]
    fn lookups_match_created_user() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let created = sample(conn, "anna@example.com");
            assert_eq!(created.description, "");
            assert_eq!(created.date_of_birth, None);

            let by_id = get_by_id(conn, created.id)?.unwrap();
            let by_email = get_by_email(conn, "anna@example.com")?.unwrap();
            assert_eq!(by_id, created);
            assert_eq!(by_email, created);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn missing_user_is_none() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            assert!(get_by_id(conn, Uuid::new_v4())?.is_none());
            assert!(get_by_email(conn, "nobody@example.com")?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_email_rejected_only_by_storage() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            sample(conn, "dup@example.com");
            let second = create(conn, "Other", "dup@example.com", "h", "1", Gender::Male, true);
            assert!(matches!(second, Err(DbError::Constraint(_))));
            Ok(())
        })
        .unwrap();

        // Without a UNIQUE column the repository stores both rows.
        let loose = Connection::open_in_memory().unwrap();
        loose
            .execute_batch(
                "CREATE TABLE users (
                    id TEXT PRIMARY KEY, name TEXT, email TEXT, password_hash TEXT, phone TEXT,
                    gender TEXT, date_of_birth TEXT, description TEXT, is_coach INTEGER
                );",
            )
            .unwrap();
        let first = sample(&loose, "dup@example.com");
        let second = sample(&loose, "dup@example.com");
        assert_ne!(first.id, second.id);

        let count: i64 = loose
            .query_row(
                "SELECT COUNT(*) FROM users WHERE email = 'dup@example.com'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn updates_overwrite_by_id() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let user = sample(conn, "old@example.com");

            update_profile(conn, user.id, "Anna K", "new@example.com", "+999", "runner")?;
            update_password(conn, user.id, "$argon2id$other")?;

            let fresh = get_by_id(conn, user.id)?.unwrap();
            assert_eq!(fresh.name, "Anna K");
            assert_eq!(fresh.email, "new@example.com");
            assert_eq!(fresh.phone, "+999");
            assert_eq!(fresh.description, "runner");
            assert_eq!(fresh.password_hash, "$argon2id$other");
            assert_eq!(fresh.gender, Gender::Female);
            assert!(get_by_email(conn, "old@example.com")?.is_none());

            // Updating an unknown id is not an error.
            update_password(conn, Uuid::new_v4(), "x")?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn token_version_bumps() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let user = sample(conn, "anna@example.com");
            assert_eq!(token_version(conn, user.id)?, Some(0));

            assert_eq!(bump_token_version(conn, user.id)?, Some(1));
            assert_eq!(bump_token_version(conn, user.id)?, Some(2));
            assert_eq!(token_version(conn, user.id)?, Some(2));

            assert_eq!(token_version(conn, Uuid::new_v4())?, None);
            assert_eq!(bump_token_version(conn, Uuid::new_v4())?, None);
            Ok(())
        })
        .unwrap();
    }
}
