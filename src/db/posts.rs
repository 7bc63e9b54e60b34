use rusqlite::{params, Connection, OptionalExtension};

use super::models::{format_timestamp, parse_timestamp, NewPost, Post, PostEdit};

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let pub_date: String = row.get(2)?;
    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: parse_timestamp(&pub_date)?,
        author_id: row.get(3)?,
        group_id: row.get(4)?,
        image: row.get(5)?,
    })
}

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

pub fn insert_post(conn: &Connection, new: &NewPost) -> rusqlite::Result<Post> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, text, pub_date, author_id, group_id, image)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            new.text(),
            format_timestamp(&new.pub_date()),
            new.author_id(),
            new.group_id(),
            new.image_path(),
        ],
    )?;
    Ok(Post {
        id,
        text: new.text().to_string(),
        pub_date: new.pub_date(),
        author_id: new.author_id().to_string(),
        group_id: new.group_id().map(str::to_string),
        image: new.image_path().map(str::to_string),
    })
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
        params![id],
        map_post,
    )
    .optional()
}

/// A post only if it was written by `author_id`.
pub fn find_for_author(
    conn: &Connection,
    id: &str,
    author_id: &str,
) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1 AND author_id = ?2"),
        params![id, author_id],
        map_post,
    )
    .optional()
}

/// Replace text, group and image in place; author and pub_date never change.
pub fn update_post(conn: &Connection, id: &str, edit: &PostEdit) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE posts SET text = ?2, group_id = ?3, image = ?4 WHERE id = ?1",
        params![id, edit.text, edit.group_id, edit.image],
    )?;
    Ok(updated > 0)
}

pub fn delete_post(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    Ok(conn.execute("DELETE FROM posts WHERE id = ?1", params![id])? > 0)
}

pub fn count_by_author(conn: &Connection, author_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM posts WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )
}
