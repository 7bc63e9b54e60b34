// Follow graph: directed "follower receives author's posts" edges
pub mod repository;

pub use repository::{FollowError, FollowGraph, SqliteFollowGraph};
