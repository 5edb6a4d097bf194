//! Account persistence.
//!
//! Accounts are looked up by their unique fields; uniqueness itself is
//! enforced by the database constraints, not in process.

pub mod models;
pub mod operations;

pub use models::{Account, AccountView};
pub use operations::{AccountRepository, DbOperations};

#[cfg(test)]
pub use operations::MockAccountRepository;
