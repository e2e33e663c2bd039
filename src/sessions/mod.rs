pub mod cleanup;
pub mod layer;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod token;

pub use layer::{load_and_save, Session};
pub use repo::{PgSessionStore, SessionStore};
