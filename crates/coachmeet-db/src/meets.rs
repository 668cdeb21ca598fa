use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use crate::Result;
use crate::models::{MEET_DATE_FORMAT, Meet, MeetStatus, MeetWithCoach, TraineeMeet, User, parse_meet_date};
use crate::rows::{meet_from_row, user_from_row, uuid_at};

/// Schedules a meet. `meet_date` must use `YYYY-MM-DD HH:MM:SS`; anything
/// else fails with `InvalidMeetDate` before touching storage.
pub fn create(
    conn: &Connection,
    group_id: Uuid,
    max_members: u32,
    meet_date: &str,
    duration: u32,
    city: &str,
    street: &str,
) -> Result<Meet> {
    let meet = Meet {
        id: Uuid::new_v4(),
        group_id,
        max_members,
        meet_date: parse_meet_date(meet_date)?,
        duration,
        city: city.to_string(),
        street: street.to_string(),
    };

    conn.execute(
        "INSERT INTO meetings (id, group_id, max_members, date, duration, city, street)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            meet.id.to_string(),
            meet.group_id.to_string(),
            meet.max_members,
            meet.meet_date.format(MEET_DATE_FORMAT).to_string(),
            meet.duration,
            meet.city,
            meet.street,
        ],
    )?;

    Ok(meet)
}

pub fn update(
    conn: &Connection,
    id: Uuid,
    max_members: u32,
    meet_date: &str,
    duration: u32,
    city: &str,
    street: &str,
) -> Result<()> {
    let meet_date = parse_meet_date(meet_date)?;

    conn.execute(
        "UPDATE meetings
         SET max_members = ?1, date = ?2, duration = ?3, city = ?4, street = ?5
         WHERE id = ?6",
        params![
            max_members,
            meet_date.format(MEET_DATE_FORMAT).to_string(),
            duration,
            city,
            street,
            id.to_string(),
        ],
    )?;
    Ok(())
}

/// The meet together with the coach of the group it belongs to.
pub fn get(conn: &Connection, id: Uuid) -> Result<Option<MeetWithCoach>> {
    let meet = conn
        .query_row(
            "SELECT m.id, m.group_id, m.max_members, m.date, m.duration, m.city, m.street, g.coach_id
             FROM meetings AS m
             JOIN groups AS g ON m.group_id = g.id
             WHERE m.id = ?1",
            [id.to_string()],
            |row| {
                Ok(MeetWithCoach {
                    meet: meet_from_row(row, 0)?,
                    coach_id: uuid_at(row, 7)?,
                })
            },
        )
        .optional()?;

    Ok(meet)
}

pub fn list_members(conn: &Connection, id: Uuid) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.name, u.email, u.password_hash, u.phone, u.gender, u.date_of_birth,
                u.description, u.is_coach
         FROM users AS u
         JOIN meeting_members AS mm ON u.id = mm.user_id
         WHERE mm.meeting_id = ?1",
    )?;

    let members = stmt
        .query_map([id.to_string()], |row| user_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(members)
}

pub fn count_members(conn: &Connection, id: Uuid) -> Result<u32> {
    let count = conn.query_row(
        "SELECT COUNT(user_id) FROM meeting_members WHERE meeting_id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Registers an attendee. Neither capacity nor an existing registration is
/// checked; both are the caller's policy.
pub fn add_member(conn: &Connection, id: Uuid, user_id: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO meeting_members (meeting_id, user_id) VALUES (?1, ?2)",
        params![id.to_string(), user_id.to_string()],
    )?;
    debug!("User {} registered for meet {}", user_id, id);
    Ok(())
}

pub fn remove_member(conn: &Connection, id: Uuid, user_id: Uuid) -> Result<()> {
    conn.execute(
        "DELETE FROM meeting_members WHERE meeting_id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    debug!("User {} unregistered from meet {}", user_id, id);
    Ok(())
}

pub fn member_exists(conn: &Connection, id: Uuid, user_id: Uuid) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM meeting_members WHERE meeting_id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

pub fn list_by_group(conn: &Connection, group_id: Uuid) -> Result<Vec<Meet>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_id, max_members, date, duration, city, street
         FROM meetings
         WHERE group_id = ?1
         ORDER BY date",
    )?;

    let meets = stmt
        .query_map([group_id.to_string()], |row| meet_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(meets)
}

/// Meets of a group with `full` and `registered` evaluated for `user_id`,
/// all in one aggregate query.
pub fn list_by_group_with_status(
    conn: &Connection,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<MeetStatus>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.group_id, m.max_members, m.date, m.duration, m.city, m.street,
                COUNT(mm.user_id) >= m.max_members,
                EXISTS (SELECT 1 FROM meeting_members AS me
                        WHERE me.meeting_id = m.id AND me.user_id = ?2)
         FROM meetings AS m
         LEFT JOIN meeting_members AS mm ON m.id = mm.meeting_id
         WHERE m.group_id = ?1
         GROUP BY m.id
         ORDER BY m.date",
    )?;

    let meets = stmt
        .query_map(params![group_id.to_string(), user_id.to_string()], |row| {
            Ok(MeetStatus {
                meet: meet_from_row(row, 0)?,
                full: row.get(7)?,
                registered: row.get(8)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(meets)
}

/// Meets the user is registered for, across all groups, with the group name.
pub fn list_for_trainee(conn: &Connection, user_id: Uuid) -> Result<Vec<TraineeMeet>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.group_id, m.max_members, m.date, m.duration, m.city, m.street, g.name,
                COUNT(mm.user_id) >= m.max_members,
                EXISTS (SELECT 1 FROM meeting_members AS me
                        WHERE me.meeting_id = m.id AND me.user_id = ?1)
         FROM meetings AS m
         JOIN groups AS g ON m.group_id = g.id
         LEFT JOIN meeting_members AS mm ON m.id = mm.meeting_id
         WHERE m.id IN (SELECT meeting_id FROM meeting_members WHERE user_id = ?1)
         GROUP BY m.id
         ORDER BY m.date",
    )?;

    let meets = stmt
        .query_map([user_id.to_string()], |row| {
            Ok(TraineeMeet {
                meet: meet_from_row(row, 0)?,
                group_name: row.get(7)?,
                full: row.get(8)?,
                registered: row.get(9)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(meets)
}
