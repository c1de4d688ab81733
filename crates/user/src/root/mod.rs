use botcomod_shared::user::DomainEvent;
use sqlx::SqliteConnection;

use crate::{
    User,
    repository::{self, EventRecord},
};

mod admin;
mod apartment;
mod car;
mod registration;

pub use apartment::AddApartmentInput;
pub use registration::{ApproveOutcome, StartRegistrationInput};

/// Writes against the user event log, bound to the connection of the current update.
pub struct Command<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> Command<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Replays the user's whole history. Any undecodable event fails the load.
    pub async fn load(&mut self, id: i64) -> botcomod_shared::Result<User> {
        let mut user = User::new(id);
        if let Some(row) = repository::find_user(self.conn, id).await? {
            user.username = row.username;
        }

        repository::for_each_ordered(self.conn, Some(id), |record| user.apply(&record.event))
            .await?;

        Ok(user)
    }

    pub async fn events(&mut self, id: i64) -> botcomod_shared::Result<Vec<EventRecord>> {
        let mut events = vec![];
        repository::for_each_ordered(self.conn, Some(id), |record| events.push(record)).await?;

        Ok(events)
    }

    pub async fn append(
        &mut self,
        id: i64,
        event: impl Into<DomainEvent>,
    ) -> botcomod_shared::Result<()> {
        repository::append(self.conn, id, &event.into()).await
    }

    pub async fn set_username(
        &mut self,
        id: i64,
        username: Option<String>,
    ) -> botcomod_shared::Result<()> {
        repository::upsert_username(self.conn, id, username).await
    }
}
