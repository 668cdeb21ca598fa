//! Column decoding shared by the repositories. Each `*_from_row` reads the
//! entity's columns starting at `base`, in the order the queries select them.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use crate::models::{BIRTH_DATE_FORMAT, Group, MEET_DATE_FORMAT, Meet, User};

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn meet_date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, MEET_DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn birth_date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, BIRTH_DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// id, name, email, password_hash, phone, gender, date_of_birth, description, is_coach
pub(crate) fn user_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, base)?,
        name: row.get(base + 1)?,
        email: row.get(base + 2)?,
        password_hash: row.get(base + 3)?,
        phone: row.get(base + 4)?,
        gender: row.get(base + 5)?,
        date_of_birth: birth_date_at(row, base + 6)?,
        description: row.get(base + 7)?,
        is_coach: row.get(base + 8)?,
    })
}

/// id, coach_id, name, description, area_id
pub(crate) fn group_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Group> {
    Ok(Group {
        id: uuid_at(row, base)?,
        coach_id: uuid_at(row, base + 1)?,
        name: row.get(base + 2)?,
        description: row.get(base + 3)?,
        area_id: uuid_at(row, base + 4)?,
    })
}

/// id, group_id, max_members, date, duration, city, street
pub(crate) fn meet_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Meet> {
    Ok(Meet {
        id: uuid_at(row, base)?,
        group_id: uuid_at(row, base + 1)?,
        max_members: row.get(base + 2)?,
        meet_date: meet_date_at(row, base + 3)?,
        duration: row.get(base + 4)?,
        city: row.get(base + 5)?,
        street: row.get(base + 6)?,
    })
}
