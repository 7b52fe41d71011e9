//! Draft lifecycle: status machine and the persisted draft record.

use crate::{CardId, CoreError, DraftHistory, DraftId, DraftLog, InitialRoll, PlayerId, SessionId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Lifecycle status of a single draft.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    /// Invitation sent, waiting for the opponent.
    InviteToDraft,
    /// Players are picking.
    Draft,
    /// Picking is over and the draft can be played.
    Available,
    /// Consumed by a game, declined, or closed with the session.
    Finished,
    /// One player asked to start over.
    DraftResetRequest,
    /// Unrecoverable inconsistency detected.
    Error,
}

/// Something a participant may do with a draft in a given status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum DraftAction {
    /// Accept an invitation to draft.
    AcceptInvitation,
    /// Decline an invitation to draft.
    DeclineInvitation,
    /// Pick a card.
    Pick,
    /// Ask to start the draft over.
    RequestReset,
    /// Accept or refuse a pending reset.
    RespondToReset,
    /// Start a game with the drafted cards.
    StartGame,
}

impl DraftStatus {
    /// Returns true if the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: DraftStatus) -> bool {
        use DraftStatus::*;
        match self {
            InviteToDraft => matches!(to, Draft | Finished | Error),
            Draft => matches!(to, Available | DraftResetRequest | Error),
            DraftResetRequest => matches!(to, Draft | Error),
            Available => matches!(to, Finished | Error),
            Finished | Error => false,
        }
    }

    /// Checks a transition, naming both ends on failure.
    pub fn transition(self, to: DraftStatus) -> Result<DraftStatus, CoreError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CoreError::IllegalTransition {
                scope: "draft",
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Returns true once no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, DraftStatus::Finished | DraftStatus::Error)
    }

    /// Actions a participant may take in this status.
    pub fn actions(self) -> &'static [DraftAction] {
        match self {
            DraftStatus::InviteToDraft => {
                &[DraftAction::AcceptInvitation, DraftAction::DeclineInvitation]
            }
            DraftStatus::Draft => &[DraftAction::Pick, DraftAction::RequestReset],
            DraftStatus::DraftResetRequest => &[DraftAction::RespondToReset],
            DraftStatus::Available => &[DraftAction::StartGame],
            DraftStatus::Finished | DraftStatus::Error => &[],
        }
    }
}

/// Field values for rebuilding a [`Draft`] from storage.
#[derive(Debug, Clone)]
pub struct DraftParts {
    /// Draft identifier.
    pub id: DraftId,
    /// Session the draft belongs to.
    pub session_id: SessionId,
    /// Player who sent the invitation.
    pub player1: PlayerId,
    /// Player who was invited.
    pub player2: PlayerId,
    /// Lifecycle status.
    pub status: DraftStatus,
    /// Points each player may spend.
    pub points_budget: u32,
    /// Current log attempt; increases on every accepted reset.
    pub attempt: u32,
    /// First-turn roll of the current attempt.
    pub initial_roll: Option<InitialRoll>,
    /// Cards this draft picks from; `None` means the whole catalog.
    pub pool: Option<Vec<CardId>>,
    /// Player who asked for the pending reset.
    pub reset_requested_by: Option<PlayerId>,
    /// Optimistic concurrency counter.
    pub revision: u64,
}

/// A draft between two players.
///
/// Has no current-turn field. The player on turn is derived from the log
/// length and the recorded roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Draft {
    id: DraftId,
    session_id: SessionId,
    player1: PlayerId,
    player2: PlayerId,
    status: DraftStatus,
    points_budget: u32,
    attempt: u32,
    initial_roll: Option<InitialRoll>,
    pool: Option<Vec<CardId>>,
    reset_requested_by: Option<PlayerId>,
    revision: u64,
}

impl Draft {
    /// Creates a draft in `INVITE_TO_DRAFT`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownPlayer`] if a player invites themselves.
    #[instrument]
    pub fn invite(
        id: DraftId,
        session_id: SessionId,
        inviter: PlayerId,
        invitee: PlayerId,
        points_budget: u32,
    ) -> Result<Self, CoreError> {
        if inviter == invitee {
            return Err(CoreError::UnknownPlayer(invitee.to_string()));
        }
        Ok(Self {
            id,
            session_id,
            player1: inviter,
            player2: invitee,
            status: DraftStatus::InviteToDraft,
            points_budget,
            attempt: 1,
            initial_roll: None,
            pool: None,
            reset_requested_by: None,
            revision: 0,
        })
    }

    /// Rebuilds a draft read back from storage.
    pub fn from_parts(parts: DraftParts) -> Self {
        Self {
            id: parts.id,
            session_id: parts.session_id,
            player1: parts.player1,
            player2: parts.player2,
            status: parts.status,
            points_budget: parts.points_budget,
            attempt: parts.attempt,
            initial_roll: parts.initial_roll,
            pool: parts.pool,
            reset_requested_by: parts.reset_requested_by,
            revision: parts.revision,
        }
    }

    /// Restricts the draft to a generated pool.
    pub fn with_pool(mut self, pool: Vec<CardId>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Applies a status transition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] if the lifecycle forbids it.
    #[instrument(skip(self), fields(draft = %self.id, from = %self.status))]
    pub fn transition(&mut self, to: DraftStatus) -> Result<(), CoreError> {
        self.status = self.status.transition(to)?;
        if to != DraftStatus::DraftResetRequest {
            self.reset_requested_by = None;
        }
        info!(to = %to, "Draft status changed");
        Ok(())
    }

    /// Records the first-turn roll for the current attempt.
    ///
    /// A roll is recorded once; later calls return the stored one unchanged.
    pub fn record_roll(&mut self, roll: InitialRoll) -> &InitialRoll {
        self.initial_roll.get_or_insert(roll)
    }

    /// Moves to `DRAFT_RESET_REQUEST` on behalf of a participant.
    pub fn request_reset(&mut self, player: &PlayerId) -> Result<(), CoreError> {
        self.require_participant(player)?;
        self.transition(DraftStatus::DraftResetRequest)?;
        self.reset_requested_by = Some(player.clone());
        Ok(())
    }

    /// Accepts a pending reset: back to `DRAFT` with a fresh, empty attempt
    /// seeded by a new roll.
    pub fn accept_reset(&mut self, roll: InitialRoll) -> Result<(), CoreError> {
        self.transition(DraftStatus::Draft)?;
        self.attempt += 1;
        self.initial_roll = Some(roll);
        Ok(())
    }

    /// Refuses a pending reset: back to `DRAFT` keeping the current log.
    pub fn decline_reset(&mut self) -> Result<(), CoreError> {
        self.transition(DraftStatus::Draft)
    }

    /// Sets the revision after a successful conditional write.
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Player order for the current attempt: (first, second).
    ///
    /// `None` until the initial roll is recorded.
    pub fn seating(&self) -> Option<(&PlayerId, &PlayerId)> {
        let winner = self.initial_roll.as_ref()?.winner();
        if winner == &self.player1 {
            Some((&self.player1, &self.player2))
        } else {
            Some((&self.player2, &self.player1))
        }
    }

    /// Player on turn after `picks` picks.
    pub fn turn_after(&self, picks: usize) -> Option<&PlayerId> {
        self.seating()
            .map(|(first, second)| if picks % 2 == 0 { first } else { second })
    }

    /// Returns true if the player is one of the two drafters.
    pub fn is_participant(&self, player: &PlayerId) -> bool {
        &self.player1 == player || &self.player2 == player
    }

    /// The other participant.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        if &self.player1 == player {
            Some(&self.player2)
        } else if &self.player2 == player {
            Some(&self.player1)
        } else {
            None
        }
    }

    /// Fails with [`CoreError::UnknownPlayer`] for non-participants.
    pub fn require_participant(&self, player: &PlayerId) -> Result<(), CoreError> {
        if self.is_participant(player) {
            Ok(())
        } else {
            Err(CoreError::UnknownPlayer(player.to_string()))
        }
    }
}

/// Export shape of a draft, including its serialized history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    id: DraftId,
    player1_id: PlayerId,
    player2_id: PlayerId,
    status: DraftStatus,
    points_budget: u32,
    current_turn_player_id: Option<PlayerId>,
    history: String,
}

impl DraftRecord {
    /// Builds the record from a draft and its current log.
    #[instrument(skip(draft, log), fields(draft = %draft.id, picks = log.len()))]
    pub fn build(draft: &Draft, log: DraftLog) -> Result<Self, CoreError> {
        let current_turn_player_id = match draft.status {
            DraftStatus::Draft => draft.turn_after(log.len()).cloned(),
            _ => None,
        };
        let history = DraftHistory::new(draft.initial_roll.clone(), log).to_json()?;
        Ok(Self {
            id: draft.id.clone(),
            player1_id: draft.player1.clone(),
            player2_id: draft.player2.clone(),
            status: draft.status,
            points_budget: draft.points_budget,
            current_turn_player_id,
            history,
        })
    }
}
