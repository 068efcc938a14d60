//! Infrastructure layer.

pub mod database;
pub mod payment;
pub mod storage;

pub use self::database::Database;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
pub use self::{payment::Gateway, storage::Storage};
