//! Strictly Draft server - request handling and persistence for drafts
//!
//! Wraps the pure rules of `strictly_draft` with storage and serialized
//! writes, so two players sending requests at once never corrupt a draft.
//!
//! # Architecture
//!
//! - **Store**: [`DraftStore`] with conditional appends and updates, backed by
//!   [`InMemoryStore`] or [`SqliteStore`]
//! - **Service**: [`DraftService`] runs every draft and session operation
//! - **Requests**: [`DraftRequest`] JSON envelope with generated schemas
//! - **Config**: [`ServerConfig`] loaded from TOML
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strictly_draft::{Card, Catalog, RulesConfig};
//! use strictly_draft_server::{DraftService, InMemoryStore};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::from_cards([Card::new("zeus", "Zeus", 6), Card::new("odin", "Odin", 5)])?;
//! let service = DraftService::new(InMemoryStore::new(), Arc::new(catalog), RulesConfig::default())?;
//!
//! let session = service.create_session("alice".into(), "bob".into())?;
//! let draft = service.invite_to_draft(session.id(), &"alice".into(), None)?;
//! let draft = service.accept_invitation(draft.id(), &"bob".into())?;
//! assert!(draft.initial_roll().is_some());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod error;
mod requests;
mod service;
mod store;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig, load_catalog, load_pool_config, load_rules};

// Crate-level exports - Errors
pub use error::ServiceError;

// Crate-level exports - Storage
pub use db::{MIGRATIONS, SqliteStore};
pub use store::{
    AppendOutcome, DraftStore, InMemoryStore, StoreError, StoreErrorKind, UpdateOutcome,
};

// Crate-level exports - Service
pub use requests::{
    CreateSessionRequest, DraftOnlyRequest, DraftPlayerRequest, DraftRequest, DraftResponse,
    ErrorBody, FinishGameRequest, InviteToDraftRequest, ProposePickRequest,
    RespondToResetRequest, SessionPlayerRequest,
};
pub use service::{DraftService, DraftSnapshot, MAX_UPDATE_RETRIES, PickOutcome};
