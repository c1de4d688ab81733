use std::{sync::Arc, time::Duration};

use botcomod_shared::cache::TtlCache;
use sqlx::SqlitePool;

use crate::House;

/// House list shared by every wizard, re-read from the database once the
/// cached copy is older than the configured TTL.
pub struct Houses {
    pool: SqlitePool,
    cache: TtlCache<(), Arc<Vec<House>>>,
}

impl Houses {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self {
            pool,
            cache: TtlCache::new(ttl),
        }
    }

    pub async fn all(&self) -> botcomod_shared::Result<Arc<Vec<House>>> {
        if let Some(houses) = self.cache.get(&()) {
            return Ok(houses);
        }

        let houses = Arc::new(crate::list(&self.pool).await?);
        tracing::debug!(count = houses.len(), "house cache refreshed");
        self.cache.insert((), houses.clone());

        Ok(houses)
    }

    pub async fn by_number(&self, number: &str) -> botcomod_shared::Result<Option<House>> {
        Ok(self
            .all()
            .await?
            .iter()
            .find(|house| house.number == number)
            .cloned())
    }

    pub fn invalidate(&self) {
        self.cache.clear();
    }
}
