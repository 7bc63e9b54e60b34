use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cache::{Clock, PageCache, SystemClock};
use crate::config::Config;
use crate::feed::Paginator;
use crate::follow::{FollowGraph, SqliteFollowGraph};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub follows: Arc<dyn FollowGraph>,
    /// Rendered global feed pages, keyed by the page number served.
    pub index_cache: Arc<PageCache<String>>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    pub fn with_clock(db: DbPool, config: Config, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::from_secs(config.cache.index_ttl_secs);
        let capacity = NonZeroUsize::new(config.cache.index_max_pages).unwrap_or(NonZeroUsize::MIN);
        Self {
            follows: Arc::new(SqliteFollowGraph::new(db.clone())),
            index_cache: Arc::new(PageCache::new(ttl, capacity, clock)),
            db,
            config,
        }
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.config.feed.page_size)
    }
}
