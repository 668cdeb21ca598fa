use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::Result;
use crate::models::Area;
use crate::rows::uuid_at;

pub fn create(conn: &Connection, name: &str) -> Result<Area> {
    let area = Area {
        id: Uuid::new_v4(),
        name: name.to_string(),
    };

    conn.execute(
        "INSERT INTO areas (id, name) VALUES (?1, ?2)",
        params![area.id.to_string(), area.name],
    )?;

    Ok(area)
}

/// All areas in storage order; callers must not rely on any particular sort.
pub fn list_all(conn: &Connection) -> Result<Vec<Area>> {
    let mut stmt = conn.prepare("SELECT id, name FROM areas")?;

    let areas = stmt
        .query_map([], |row| {
            Ok(Area {
                id: uuid_at(row, 0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(areas)
}

pub fn exists(conn: &Connection, id: Uuid) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM areas WHERE id = ?1", [id.to_string()], |_| Ok(()))
        .optional()?;

    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn create_list_exists() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            assert!(list_all(conn)?.is_empty());

            let north = create(conn, "North")?;
            let south = create(conn, "South")?;

            let mut names: Vec<String> = list_all(conn)?.into_iter().map(|a| a.name).collect();
            names.sort();
            assert_eq!(names, vec!["North", "South"]);

            assert!(exists(conn, north.id)?);
            assert!(exists(conn, south.id)?);
            assert!(!exists(conn, Uuid::new_v4())?);
            Ok(())
        })
        .unwrap();
    }
}
