use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::display::{excerpt, format_relative_time};
use super::paginator::{Page, PageRequest, Paginator};
use crate::db::models::parse_timestamp;

/// Which posts a feed shows. Every kind is ordered newest first.
#[derive(Debug, Clone, Copy)]
pub enum FeedKind<'a> {
    Global,
    /// Posts filed under the group with this id.
    Group(&'a str),
    /// Posts written by the user with this id.
    Author(&'a str),
    /// Posts written by anyone the user with this id follows.
    FollowedBy(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

/// A post as feeds render it: joined with author and group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    pub id: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author: String,
    pub group: Option<GroupRef>,
    pub comment_count: i64,
}

impl FeedPost {
    pub fn published(&self) -> String {
        format_relative_time(&self.pub_date)
    }

    pub fn url(&self) -> String {
        format!("/{}/{}/", self.author, self.id)
    }

    /// Page title for the single post view.
    pub fn title(&self) -> String {
        excerpt(&self.text, 30)
    }
}

const FEED_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, u.username, g.slug, g.title,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN groups g ON g.id = p.group_id";

fn map_feed_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedPost> {
    let pub_date: String = row.get(2)?;
    let slug: Option<String> = row.get(5)?;
    let title: Option<String> = row.get(6)?;
    Ok(FeedPost {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: parse_timestamp(&pub_date)?,
        image: row.get(3)?,
        author: row.get(4)?,
        group: slug.zip(title).map(|(slug, title)| GroupRef { slug, title }),
        comment_count: row.get(7)?,
    })
}

/// WHERE clause and its positional parameters for a feed kind.
fn filter(kind: FeedKind<'_>) -> (String, Vec<Value>) {
    match kind {
        FeedKind::Global => ("1 = 1".to_string(), Vec::new()),
        FeedKind::Group(group_id) => (
            "p.group_id = ?".to_string(),
            vec![Value::Text(group_id.to_string())],
        ),
        FeedKind::Author(author_id) => (
            "p.author_id = ?".to_string(),
            vec![Value::Text(author_id.to_string())],
        ),
        FeedKind::FollowedBy(user_id) => (
            "p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)".to_string(),
            vec![Value::Text(user_id.to_string())],
        ),
    }
}

fn count_matching(conn: &Connection, clause: &str, values: &[Value]) -> rusqlite::Result<u64> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p WHERE {clause}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;
    Ok(u64::try_from(total).unwrap_or(0))
}

/// Number of posts a feed of `kind` holds.
pub fn count_posts(conn: &Connection, kind: FeedKind<'_>) -> rusqlite::Result<u64> {
    let (clause, values) = filter(kind);
    count_matching(conn, &clause, &values)
}

/// One page of posts for `kind`, resolving `request` against the real total.
pub fn fetch_page(
    conn: &Connection,
    kind: FeedKind<'_>,
    request: PageRequest,
    paginator: &Paginator,
) -> rusqlite::Result<Page<FeedPost>> {
    let (clause, mut values) = filter(kind);
    let total = count_matching(conn, &clause, &values)?;
    let window = paginator.window(total, request);

    values.push(Value::Integer(window.limit as i64));
    values.push(Value::Integer(window.offset as i64));

    let mut stmt = conn.prepare(&format!(
        "{FEED_SELECT}
         WHERE {clause}
         ORDER BY p.pub_date DESC, p.id DESC
         LIMIT ? OFFSET ?"
    ))?;
    let items = stmt
        .query_map(params_from_iter(values.iter()), map_feed_post)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Page::new(items, window, total))
}

/// A single post by id, only if `author_id` wrote it.
pub fn fetch_post(
    conn: &Connection,
    post_id: &str,
    author_id: &str,
) -> rusqlite::Result<Option<FeedPost>> {
    conn.query_row(
        &format!("{FEED_SELECT} WHERE p.id = ?1 AND p.author_id = ?2"),
        params![post_id, author_id],
        map_feed_post,
    )
    .optional()
}
