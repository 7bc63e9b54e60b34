use rusqlite::{params, Connection, OptionalExtension};

use super::models::Group;

fn map_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Insert a group unless its slug is taken. Returns the stored group and
/// whether this call created it.
pub fn create_group(
    conn: &Connection,
    slug: &str,
    title: &str,
    description: &str,
) -> rusqlite::Result<(Group, bool)> {
    let id = uuid::Uuid::now_v7().to_string();
    let inserted = conn.execute(
        "INSERT INTO groups (id, title, slug, description) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(slug) DO NOTHING",
        params![id, title, slug, description],
    )?;
    let group = find_by_slug(conn, slug)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    Ok((group, inserted > 0))
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, title, slug, description FROM groups WHERE slug = ?1",
        params![slug],
        map_group,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, title, slug, description FROM groups WHERE id = ?1",
        params![id],
        map_group,
    )
    .optional()
}

/// All groups by title, for the post form's choice list.
pub fn list_groups(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug, description FROM groups ORDER BY title, slug")?;
    let groups = stmt.query_map([], map_group)?.collect();
    groups
}

/// Delete a group. Its posts stay, detached from any group.
pub fn delete_group(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    Ok(conn.execute("DELETE FROM groups WHERE id = ?1", params![id])? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn create_group_is_idempotent_on_slug() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let (first, created) = create_group(&conn, "cats", "Cats", "All about cats").unwrap();
        assert!(created);
        let (second, created) = create_group(&conn, "cats", "Other title", "").unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(second.title, "Cats");
    }

    #[test]
    fn find_by_slug_and_id() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let (group, _) = create_group(&conn, "dogs", "Dogs", "").unwrap();
        assert_eq!(find_by_slug(&conn, "dogs").unwrap(), Some(group.clone()));
        assert_eq!(find_by_id(&conn, &group.id).unwrap(), Some(group));
        assert!(find_by_slug(&conn, "birds").unwrap().is_none());
    }

    #[test]
    fn list_groups_orders_by_title() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        create_group(&conn, "z", "Zebras", "").unwrap();
        create_group(&conn, "a", "Ants", "").unwrap();
        let titles: Vec<String> = list_groups(&conn)
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["Ants", "Zebras"]);
    }
}
