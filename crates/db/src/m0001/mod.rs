mod house;
mod updates_log;
mod user;
mod user_event;

use sqlx_migrator::vec_box;

pub struct Migration;

sqlx_migrator::sqlite_migration!(
    Migration,
    "botcomod",
    "m0001",
    vec_box![],
    vec_box![
        user::CreateTable,
        user_event::CreateTable,
        user_event::CreateIdx1,
        house::CreateTable,
        house::CreateUk1,
        updates_log::CreateTable
    ]
);
