pub mod house;
pub mod migrate;
pub mod server;
pub mod user;
