use crate::repository;

impl super::Command<'_> {
    /// Erases the whole event history of a user.
    pub async fn clear_events(&mut self, user_id: i64) -> botcomod_shared::Result<u64> {
        let removed = repository::clear(self.conn, user_id).await?;
        tracing::warn!(user_id, removed, "user events cleared");

        Ok(removed)
    }
}
