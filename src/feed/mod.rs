//! Feed composition: which posts a view shows, in what order, one page at a time.

pub mod display;
pub mod paginator;
pub mod query;

pub use paginator::{Page, PageLink, PageRequest, Paginator};
pub use query::{count_posts, fetch_page, fetch_post, FeedKind, FeedPost, GroupRef};
