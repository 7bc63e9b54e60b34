use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::models::{
    format_timestamp, parse_timestamp, store_precision, Comment, CommentView, FieldErrors, REQUIRED,
};

pub fn add_comment(
    conn: &Connection,
    post_id: &str,
    author_id: &str,
    text: &str,
    created: DateTime<Utc>,
) -> Result<Result<Comment, FieldErrors>, rusqlite::Error> {
    let text = text.trim();
    if text.is_empty() {
        let mut errors = FieldErrors::default();
        errors.add("text", REQUIRED);
        return Ok(Err(errors));
    }

    let created = store_precision(created);
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO comments (id, post_id, author_id, text, created) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, post_id, author_id, text, format_timestamp(&created)],
    )?;

    Ok(Ok(Comment {
        id,
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        created,
    }))
}

/// Comments under a post, oldest first.
pub fn for_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, u.username, c.text, c.created
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created ASC, c.id ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            let created: String = row.get(3)?;
            Ok(CommentView {
                id: row.get(0)?,
                author: row.get(1)?,
                text: row.get(2)?,
                created: parse_timestamp(&created)?,
            })
        })?
        .collect();
    comments
}
