//! Append-only pick history and its versioned serialized form.
//!
//! The log is the source of truth for a draft. Everything else about the
//! draft's progress is recomputed from it by [`crate::reconstruct`].

use crate::{CardId, CoreError, DraftId, InitialRoll, PlayerId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Schema version written into every serialized history blob.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

/// One player claiming one card. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct PickEvent {
    /// Draft the pick belongs to.
    draft_id: DraftId,
    /// Player who picked.
    player_id: PlayerId,
    /// Card that was picked.
    card_id: CardId,
    /// Position in the log, starting at 1.
    seq: u64,
    /// When the pick was committed.
    picked_at: DateTime<Utc>,
}

/// Checks sequence ordering and card uniqueness over a run of events.
pub(crate) fn check_ordering(events: &[PickEvent]) -> Result<(), CoreError> {
    let mut seen = BTreeSet::new();
    let mut last_seq = 0u64;
    for event in events {
        if event.seq <= last_seq {
            return Err(CoreError::malformed(format!(
                "sequence {} follows {}",
                event.seq, last_seq
            )));
        }
        if !seen.insert(&event.card_id) {
            return Err(CoreError::malformed(format!(
                "card '{}' picked more than once",
                event.card_id
            )));
        }
        last_seq = event.seq;
    }
    Ok(())
}

/// Ordered, append-only sequence of picks for one draft attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DraftLog {
    events: Vec<PickEvent>,
}

impl DraftLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps events read from storage, validating their ordering.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedHistory`] for non-increasing sequence
    /// numbers or a card picked twice.
    #[instrument(skip(events), fields(count = events.len()))]
    pub fn from_events(events: Vec<PickEvent>) -> Result<Self, CoreError> {
        check_ordering(&events)?;
        Ok(Self { events })
    }

    /// Appends an event. The event must carry the next sequence number and
    /// a card not yet in the log.
    pub fn append(&mut self, event: PickEvent) -> Result<(), CoreError> {
        if event.seq != self.next_seq() {
            return Err(CoreError::malformed(format!(
                "expected sequence {}, got {}",
                self.next_seq(),
                event.seq
            )));
        }
        if self.contains_card(&event.card_id) {
            return Err(CoreError::malformed(format!(
                "card '{}' picked more than once",
                event.card_id
            )));
        }
        self.events.push(event);
        Ok(())
    }

    /// Events in sequence order.
    pub fn events(&self) -> &[PickEvent] {
        &self.events
    }

    /// Sequence number the next appended event must carry.
    pub fn next_seq(&self) -> u64 {
        self.events.last().map_or(1, |e| e.seq + 1)
    }

    /// Returns true if the card was already picked in this log.
    pub fn contains_card(&self, card_id: &CardId) -> bool {
        self.events.iter().any(|e| &e.card_id == card_id)
    }

    /// Number of picks.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was picked yet.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct HistoryBlob {
    version: u32,
    #[serde(default)]
    initial_roll: Option<InitialRoll>,
    picks: Vec<PickEvent>,
}

/// Typed view of a serialized draft history: the first-turn roll plus the log.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct DraftHistory {
    initial_roll: Option<InitialRoll>,
    log: DraftLog,
}

impl DraftHistory {
    /// Pairs a roll with a log.
    pub fn new(initial_roll: Option<InitialRoll>, log: DraftLog) -> Self {
        Self { initial_roll, log }
    }

    /// Parses a serialized history. This is the only place a blob is read.
    ///
    /// Unversioned blobs, unknown versions, unparseable JSON and logs with
    /// broken ordering all fail closed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedHistory`].
    #[instrument(skip(blob), fields(bytes = blob.len()))]
    pub fn parse(blob: &str) -> Result<Self, CoreError> {
        let parsed: HistoryBlob = serde_json::from_str(blob)
            .map_err(|e| CoreError::malformed(format!("unreadable history: {}", e)))?;
        if parsed.version != HISTORY_SCHEMA_VERSION {
            return Err(CoreError::malformed(format!(
                "unsupported history version {}",
                parsed.version
            )));
        }
        let log = DraftLog::from_events(parsed.picks)?;
        debug!(picks = log.len(), "History parsed");
        Ok(Self {
            initial_roll: parsed.initial_roll,
            log,
        })
    }

    /// Serializes to the current schema version.
    pub fn to_json(&self) -> Result<String, CoreError> {
        let blob = HistoryBlob {
            version: HISTORY_SCHEMA_VERSION,
            initial_roll: self.initial_roll.clone(),
            picks: self.log.events.clone(),
        };
        serde_json::to_string(&blob)
            .map_err(|e| CoreError::malformed(format!("cannot serialize history: {}", e)))
    }
}
