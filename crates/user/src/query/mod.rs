use std::collections::BTreeMap;

use sqlx::SqliteConnection;

use crate::{User, plate, repository};

/// Lookups that replay every user in the community.
pub struct Query<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> Query<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Every user known from the `user` table or the event log, ordered by id.
    pub async fn all_users(&mut self) -> botcomod_shared::Result<Vec<User>> {
        let mut users = BTreeMap::new();
        for row in repository::all_users(self.conn).await? {
            let mut user = User::new(row.id);
            user.username = row.username;
            users.insert(row.id, user);
        }

        repository::for_each_ordered(self.conn, None, |record| {
            users
                .entry(record.user_id)
                .or_insert_with(|| User::new(record.user_id))
                .apply(&record.event);
        })
        .await?;

        Ok(users.into_values().collect())
    }

    pub async fn find_by_license_plate(&mut self, license_plate: &str) -> botcomod_shared::Result<User> {
        let license_plate = plate::normalize(license_plate);
        let found = self
            .all_users()
            .await?
            .into_iter()
            .find(|user| user.owns_plate(&license_plate));

        match found {
            Some(user) => Ok(user),
            None => botcomod_shared::not_found!("car owner"),
        }
    }

    pub async fn find_by_apartment(
        &mut self,
        house_id: i64,
        house_number: &str,
        apartment: &str,
    ) -> botcomod_shared::Result<User> {
        let found = self
            .all_users()
            .await?
            .into_iter()
            .find(|user| user.lives_in(house_id, house_number, apartment));

        match found {
            Some(user) => Ok(user),
            None => botcomod_shared::not_found!("resident"),
        }
    }
}
