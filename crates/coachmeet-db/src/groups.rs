use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use crate::Result;
use crate::models::{Group, GroupWithCoach, TraineeGroup, User};
use crate::rows::{group_from_row, user_from_row, uuid_at};

/// Inserts a group. Existence of the coach and area is enforced by foreign
/// keys; whether the coach actually has `is_coach` set is up to the caller.
pub fn create(
    conn: &Connection,
    coach_id: Uuid,
    name: &str,
    description: &str,
    area_id: Uuid,
) -> Result<Group> {
    let group = Group {
        id: Uuid::new_v4(),
        coach_id,
        name: name.to_string(),
        description: description.to_string(),
        area_id,
    };

    conn.execute(
        "INSERT INTO groups (id, coach_id, name, description, area_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            group.id.to_string(),
            group.coach_id.to_string(),
            group.name,
            group.description,
            group.area_id.to_string(),
        ],
    )?;

    Ok(group)
}

pub fn get_by_id(conn: &Connection, id: Uuid) -> Result<Option<GroupWithCoach>> {
    // JOIN users to fetch the coach name in the same round trip
    let group = conn
        .query_row(
            "SELECT g.id, g.coach_id, g.name, g.description, g.area_id, coach.name
             FROM groups AS g
             JOIN users AS coach ON g.coach_id = coach.id
             WHERE g.id = ?1",
            [id.to_string()],
            |row| {
                Ok(GroupWithCoach {
                    group: group_from_row(row, 0)?,
                    coach_name: row.get(5)?,
                })
            },
        )
        .optional()?;

    Ok(group)
}

pub fn list_by_area(conn: &Connection, area_id: Uuid) -> Result<Vec<GroupWithCoach>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.coach_id, g.name, g.description, g.area_id, coach.name
         FROM groups AS g
         JOIN users AS coach ON g.coach_id = coach.id
         WHERE g.area_id = ?1",
    )?;

    let groups = stmt
        .query_map([area_id.to_string()], |row| {
            Ok(GroupWithCoach {
                group: group_from_row(row, 0)?,
                coach_name: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(groups)
}

/// Groups the user belongs to as a member, with coach and area names.
pub fn list_for_trainee(conn: &Connection, user_id: Uuid) -> Result<Vec<TraineeGroup>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, coach.name, g.name, a.name
         FROM group_members AS gm
         JOIN groups AS g ON gm.group_id = g.id
         JOIN users AS coach ON g.coach_id = coach.id
         JOIN areas AS a ON g.area_id = a.id
         WHERE gm.user_id = ?1",
    )?;

    let rows = stmt
        .query_map([user_id.to_string()], |row| {
            Ok(TraineeGroup {
                group_id: uuid_at(row, 0)?,
                coach_name: row.get(1)?,
                group_name: row.get(2)?,
                area_name: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_for_coach(conn: &Connection, coach_id: Uuid) -> Result<Vec<Group>> {
    let mut stmt = conn.prepare(
        "SELECT id, coach_id, name, description, area_id FROM groups WHERE coach_id = ?1",
    )?;

    let groups = stmt
        .query_map([coach_id.to_string()], |row| group_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(groups)
}

pub fn list_members(conn: &Connection, group_id: Uuid) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.name, u.email, u.password_hash, u.phone, u.gender, u.date_of_birth,
                u.description, u.is_coach
         FROM group_members AS gm
         JOIN users AS u ON gm.user_id = u.id
         WHERE gm.group_id = ?1",
    )?;

    let members = stmt
        .query_map([group_id.to_string()], |row| user_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(members)
}

/// Adds a membership edge without checking for an existing one.
pub fn add_member(conn: &Connection, group_id: Uuid, user_id: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO group_members (group_id, user_id) VALUES (?1, ?2)",
        params![group_id.to_string(), user_id.to_string()],
    )?;
    debug!("User {} joined group {}", user_id, group_id);
    Ok(())
}

/// Removes the user from the group together with their registrations for
/// the group's meets. Both deletes commit or roll back together; inside a
/// caller's open transaction they simply join it.
pub fn remove_member(conn: &Connection, group_id: Uuid, user_id: Uuid) -> Result<()> {
    if conn.is_autocommit() {
        let tx = conn.unchecked_transaction()?;
        delete_membership(&tx, group_id, user_id)?;
        tx.commit()?;
    } else {
        delete_membership(conn, group_id, user_id)?;
    }

    debug!("User {} removed from group {}", user_id, group_id);
    Ok(())
}

fn delete_membership(conn: &Connection, group_id: Uuid, user_id: Uuid) -> rusqlite::Result<()> {
    let group_id = group_id.to_string();
    let user_id = user_id.to_string();

    conn.execute(
        "DELETE FROM meeting_members
         WHERE meeting_id IN (SELECT id FROM meetings WHERE group_id = ?1) AND user_id = ?2",
        params![group_id, user_id],
    )?;
    conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )?;
    Ok(())
}

pub fn member_exists(conn: &Connection, group_id: Uuid, user_id: Uuid) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM group_members WHERE group_id = ?1 AND user_id = ?2",
            params![group_id.to_string(), user_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{area, coach, trainee};
    use crate::{Database, DbError, areas, meets};

    #[test]
    fn morning_run_listed_under_north() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let north = areas::create(conn, "North")?;
            let c = coach(conn, "Carl");
            let group = create(conn, c.id, "Morning Run", "5k before work", north.id)?;

            let listed = list_by_area(conn, north.id)?;
            assert_eq!(
                listed,
                vec![GroupWithCoach {
                    group: group.clone(),
                    coach_name: "Carl".to_string(),
                }]
            );

            let fetched = get_by_id(conn, group.id)?.unwrap();
            assert_eq!(fetched.group, group);
            assert_eq!(fetched.coach_name, "Carl");

            assert!(get_by_id(conn, Uuid::new_v4())?.is_none());
            assert!(list_by_area(conn, Uuid::new_v4())?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn dangling_references_are_constraint_errors() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let c = coach(conn, "Carl");
            let err = create(conn, c.id, "Nowhere", "", Uuid::new_v4()).unwrap_err();
            assert!(matches!(err, DbError::Constraint(_)));

            let a = area(conn, "North");
            let err = create(conn, Uuid::new_v4(), "No coach", "", a.id).unwrap_err();
            assert!(err.is_constraint());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn coach_and_trainee_listings() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let north = area(conn, "North");
            let south = area(conn, "South");
            let c = coach(conn, "Carl");
            let t = trainee(conn, "Tina");

            let run = create(conn, c.id, "Morning Run", "", north.id)?;
            let swim = create(conn, c.id, "Swim", "", south.id)?;

            let mut coached: Vec<Uuid> = list_for_coach(conn, c.id)?.into_iter().map(|g| g.id).collect();
            coached.sort();
            let mut expected = vec![run.id, swim.id];
            expected.sort();
            assert_eq!(coached, expected);
            assert!(list_for_coach(conn, t.id)?.is_empty());

            add_member(conn, swim.id, t.id)?;
            assert_eq!(
                list_for_trainee(conn, t.id)?,
                vec![TraineeGroup {
                    group_id: swim.id,
                    coach_name: "Carl".to_string(),
                    group_name: "Swim".to_string(),
                    area_name: "South".to_string(),
                }]
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn membership_roster() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let a = area(conn, "North");
            let c = coach(conn, "Carl");
            let t = trainee(conn, "Tina");
            let group = create(conn, c.id, "Morning Run", "", a.id)?;

            assert!(!member_exists(conn, group.id, t.id)?);
            add_member(conn, group.id, t.id)?;
            assert!(member_exists(conn, group.id, t.id)?);
            assert_eq!(list_members(conn, group.id)?, vec![t.clone()]);

            // No duplicate guard at this layer.
            add_member(conn, group.id, t.id)?;
            assert_eq!(list_members(conn, group.id)?.len(), 2);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn remove_member_cascades_to_meet_registrations() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let a = area(conn, "North");
            let c = coach(conn, "Carl");
            let t = trainee(conn, "Tina");
            let other = trainee(conn, "Olga");
            let run = create(conn, c.id, "Morning Run", "", a.id)?;
            let swim = create(conn, c.id, "Swim", "", a.id)?;

            let run_meet = meets::create(conn, run.id, 10, "2025-05-01 07:00:00", 60, "Oslo", "Main 1")?;
            let swim_meet = meets::create(conn, swim.id, 10, "2025-05-02 07:00:00", 45, "Oslo", "Pool 2")?;

            for (group, meet) in [(run.id, run_meet.id), (swim.id, swim_meet.id)] {
                add_member(conn, group, t.id)?;
                meets::add_member(conn, meet, t.id)?;
            }
            add_member(conn, run.id, other.id)?;
            meets::add_member(conn, run_meet.id, other.id)?;

            remove_member(conn, run.id, t.id)?;

            assert!(!list_members(conn, run.id)?.iter().any(|u| u.id == t.id));
            assert!(!meets::member_exists(conn, run_meet.id, t.id)?);
            let remaining: Vec<Uuid> = meets::list_for_trainee(conn, t.id)?
                .into_iter()
                .map(|m| m.meet.group_id)
                .collect();
            assert_eq!(remaining, vec![swim.id]);

            // Other members and other groups are untouched.
            assert!(meets::member_exists(conn, run_meet.id, other.id)?);
            assert!(member_exists(conn, swim.id, t.id)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn remove_member_joins_open_transaction() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let a = area(conn, "North");
            let c = coach(conn, "Carl");
            let t = trainee(conn, "Tina");
            let group = create(conn, c.id, "Morning Run", "", a.id)?;
            add_member(conn, group.id, t.id)?;

            let tx = conn.unchecked_transaction()?;
            remove_member(&tx, group.id, t.id)?;
            tx.rollback()?;

            assert!(member_exists(conn, group.id, t.id)?);
            Ok(())
        })
        .unwrap();
    }
}
