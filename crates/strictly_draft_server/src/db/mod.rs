//! SQLite persistence for drafts, pick logs and sessions.

mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use models::{
    DraftChanges, DraftRow, NewDraftRow, NewPickEventRow, NewSessionRow, PickEventRow,
    SessionChanges, SessionRow,
};
pub use repository::SqliteStore;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
