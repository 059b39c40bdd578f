//! Account infrastructure module
//!
//! Storage implementations for accounts and the sign-in service that
//! creates them lazily.

mod postgres_repository;
mod repository;
mod service;

pub use postgres_repository::PostgresAccountRepository;
pub use repository::InMemoryAccountRepository;
pub use service::{AccountService, SignInProfile};
