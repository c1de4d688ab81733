mod aggregate;
mod code;
pub mod plate;
mod query;
pub(crate) mod repository;
mod root;

pub use aggregate::*;
pub use code::*;
pub use query::*;
pub use repository::EventRecord;
pub use root::*;
