/// Persistence layer for the auth service
pub mod users;

pub use users::{NewUser, PgUserStore, UserStore};
