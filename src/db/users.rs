use rusqlite::{params, Connection, OptionalExtension};

use super::models::User;

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Insert a user. Returns `None` when the username is already taken.
pub fn create_user(
    conn: &Connection,
    username: &str,
    password_hash: Option<&str>,
) -> rusqlite::Result<Option<User>> {
    let id = uuid::Uuid::now_v7().to_string();
    let inserted = conn.execute(
        "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)
         ON CONFLICT(username) DO NOTHING",
        params![id, username, password_hash],
    )?;
    if inserted == 0 {
        return Ok(None);
    }
    find_by_id(conn, &id)
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, created_at FROM users WHERE id = ?1",
        params![id],
        map_user,
    )
    .optional()
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, created_at FROM users WHERE username = ?1",
        params![username],
        map_user,
    )
    .optional()
}

/// User and stored password hash, for login.
pub fn credentials(conn: &Connection, username: &str) -> rusqlite::Result<Option<(User, Option<String>)>> {
    conn.query_row(
        "SELECT id, username, created_at, password_hash FROM users WHERE username = ?1",
        params![username],
        |row| Ok((map_user(row)?, row.get(3)?)),
    )
    .optional()
}

pub fn delete_user(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    Ok(conn.execute("DELETE FROM users WHERE id = ?1", params![id])? > 0)
}
