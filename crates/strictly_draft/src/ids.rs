//! Strongly typed identifiers.
//!
//! Every identifier is an opaque string on the wire. Wrapping each one in its
//! own type keeps a card id from ever being passed where a player id belongs.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_type!(
    /// Identifies a player across sessions and drafts.
    PlayerId
);

id_type!(
    /// Identifies a card in the catalog.
    CardId
);

id_type!(
    /// Identifies a single draft.
    DraftId
);

id_type!(
    /// Identifies a session of games between two players.
    SessionId
);
