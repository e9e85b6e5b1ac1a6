//! SQLite-backed implementations of the core persistence ports.

pub mod manager;
pub mod mentor_directory;
pub mod session_repository;

pub use manager::DbManager;
pub use mentor_directory::SqliteMentorDirectory;
pub use session_repository::SqliteSessionRepository;
