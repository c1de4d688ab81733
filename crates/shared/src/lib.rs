mod error;
pub mod cache;
pub mod callback;
pub mod token;
pub mod user;

pub use error::*;
