//! Database row types. These map directly to SQLite rows and are distinct
//! from the coachmeet-types response shapes.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{DbError, Result};

/// Literal format of meet timestamps, both as input and as stored.
pub const MEET_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_meet_date(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, MEET_DATE_FORMAT).map_err(|source| {
        DbError::InvalidMeetDate {
            input: input.to_string(),
            source,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Error)]
#[error("unknown gender {0:?}")]
pub struct UnknownGender(pub String);

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(UnknownGender(other.to_string())),
        }
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub gender: Gender,
    pub date_of_birth: Option<NaiveDate>,
    pub description: String,
    pub is_coach: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub description: String,
    pub area_id: Uuid,
}

/// A group with its coach's name joined in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWithCoach {
    pub group: Group,
    pub coach_name: String,
}

/// One row of a trainee's group listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraineeGroup {
    pub group_id: Uuid,
    pub coach_name: String,
    pub group_name: String,
    pub area_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meet {
    pub id: Uuid,
    pub group_id: Uuid,
    pub max_members: u32,
    pub meet_date: NaiveDateTime,
    /// Minutes.
    pub duration: u32,
    pub city: String,
    pub street: String,
}

/// A meet with the id of the coach owning its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetWithCoach {
    pub meet: Meet,
    pub coach_id: Uuid,
}

/// A meet plus the derived flags for one querying user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetStatus {
    pub meet: Meet,
    /// attendee count >= max_members
    pub full: bool,
    pub registered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraineeMeet {
    pub meet: Meet,
    pub group_name: String,
    pub full: bool,
    pub registered: bool,
}
