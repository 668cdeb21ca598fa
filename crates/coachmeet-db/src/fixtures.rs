use rusqlite::Connection;

use crate::models::{Area, Gender, User};
use crate::{areas, users};

pub(crate) fn coach(conn: &Connection, name: &str) -> User {
    let email = format!("{}@coach.test", name.to_lowercase());
    users::create(conn, name, &email, "$argon2id$stub", "+1000", Gender::Male, true).unwrap()
}

pub(crate) fn trainee(conn: &Connection, name: &str) -> User {
    let email = format!("{}@trainee.test", name.to_lowercase());
    users::create(conn, name, &email, "$argon2id$stub", "+2000", Gender::Female, false).unwrap()
}

pub(crate) fn area(conn: &Connection, name: &str) -> Area {
    areas::create(conn, name).unwrap()
}
