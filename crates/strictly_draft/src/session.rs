//! Session lifecycle: a run of games between the same two players.

use crate::{CoreError, DraftId, PlayerId, SessionId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Lifecycle status of a session.
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
pub enum SessionStatus {
    /// A new game has been offered.
    InviteToDraft,
    /// The current game is being drafted.
    Draft,
    /// The current game is being played.
    InProgress,
    /// No unfinished game; a new one may start.
    Available,
    /// Closed; the score is frozen.
    Finished,
    /// Unrecoverable inconsistency detected.
    Error,
    /// The current draft is waiting on a reset answer.
    DraftResetRequest,
}

/// Something a player may do with a session in a given status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum SessionAction {
    /// Offer the next game.
    StartNewGame,
    /// Close the session.
    FinishSession,
    /// Open the running draft.
    GoToDraft,
    /// Report the result of the running game.
    FinishGame,
}

/// How a game was won.
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
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum WinCondition {
    /// The opponent's god was destroyed.
    KilledGod,
    /// Enough gems were collected.
    ObtainedGems,
}

impl SessionStatus {
    /// Returns true if the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: SessionStatus) -> bool {
        use SessionStatus::*;
        match self {
            Available => matches!(to, InviteToDraft | Finished | Error),
            InviteToDraft => matches!(to, Draft | Available | Error),
            Draft => matches!(to, DraftResetRequest | InProgress | Error),
            DraftResetRequest => matches!(to, Draft | Error),
            InProgress => matches!(to, Available | Error),
            Finished | Error => false,
        }
    }

    /// Checks a transition, naming both ends on failure.
    pub fn transition(self, to: SessionStatus) -> Result<SessionStatus, CoreError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CoreError::IllegalTransition {
                scope: "session",
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Returns true once no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Error)
    }

    /// Actions offered in this status.
    pub fn actions(self) -> &'static [SessionAction] {
        match self {
            SessionStatus::Available => {
                &[SessionAction::StartNewGame, SessionAction::FinishSession]
            }
            SessionStatus::Draft | SessionStatus::DraftResetRequest => &[SessionAction::GoToDraft],
            SessionStatus::InProgress => &[SessionAction::FinishGame],
            SessionStatus::InviteToDraft | SessionStatus::Finished | SessionStatus::Error => &[],
        }
    }
}

/// One game of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameEntry {
    /// Position in the session, starting at 1.
    number: u32,
    /// Draft the game was built from.
    draft_id: DraftId,
    /// Winner, once reported. `None` after a reported draw.
    winner: Option<PlayerId>,
    /// How the game ended, once reported.
    win_condition: Option<WinCondition>,
}

impl GameEntry {
    /// Returns true once a result has been reported.
    pub fn is_decided(&self) -> bool {
        self.winner.is_some() || self.win_condition.is_some()
    }
}

/// Session between two players with a running score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    #[serde(rename = "player1Id")]
    player1: PlayerId,
    #[serde(rename = "player2Id")]
    player2: PlayerId,
    player1_score: u32,
    player2_score: u32,
    #[serde(rename = "gameList")]
    games: Vec<GameEntry>,
    status: SessionStatus,
    revision: u64,
}

impl Session {
    /// Opens a session in `AVAILABLE`.
    #[instrument]
    pub fn new(id: SessionId, player1: PlayerId, player2: PlayerId) -> Result<Self, CoreError> {
        if player1 == player2 {
            return Err(CoreError::UnknownPlayer(player2.to_string()));
        }
        Ok(Self {
            id,
            player1,
            player2,
            player1_score: 0,
            player2_score: 0,
            games: Vec::new(),
            status: SessionStatus::Available,
            revision: 0,
        })
    }

    /// Applies a status transition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] if the lifecycle forbids it.
    #[instrument(skip(self), fields(session = %self.id, from = %self.status))]
    pub fn transition(&mut self, to: SessionStatus) -> Result<(), CoreError> {
        self.status = self.status.transition(to)?;
        info!(to = %to, "Session status changed");
        Ok(())
    }

    /// Offers a new game built from `draft_id`; returns its number.
    pub fn open_game(&mut self, draft_id: DraftId) -> Result<u32, CoreError> {
        self.transition(SessionStatus::InviteToDraft)?;
        let number = self.games.len() as u32 + 1;
        self.games.push(GameEntry {
            number,
            draft_id,
            winner: None,
            win_condition: None,
        });
        Ok(number)
    }

    /// Withdraws the offered game after its invitation was declined.
    pub fn cancel_game(&mut self) -> Result<(), CoreError> {
        self.require_status(SessionStatus::InviteToDraft, SessionStatus::Available)?;
        self.transition(SessionStatus::Available)?;
        self.games.pop();
        Ok(())
    }

    /// Reports the running game's result and scores the winner.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownPlayer`] if the winner is not a participant,
    /// or [`CoreError::IllegalTransition`] if no game is in progress.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn record_result(
        &mut self,
        winner: Option<PlayerId>,
        condition: Option<WinCondition>,
    ) -> Result<(), CoreError> {
        self.require_status(SessionStatus::InProgress, SessionStatus::Available)?;
        if let Some(winner) = &winner {
            self.require_participant(winner)?;
        }
        self.transition(SessionStatus::Available)?;
        match &winner {
            Some(w) if w == &self.player1 => self.player1_score += 1,
            Some(_) => self.player2_score += 1,
            None => {}
        }
        if let Some(game) = self.games.last_mut() {
            game.winner = winner;
            game.win_condition = condition;
        }
        info!(
            player1_score = self.player1_score,
            player2_score = self.player2_score,
            "Game result recorded"
        );
        Ok(())
    }

    fn require_status(&self, expected: SessionStatus, to: SessionStatus) -> Result<(), CoreError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(CoreError::IllegalTransition {
                scope: "session",
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Draft of the most recent game, if any.
    pub fn current_draft(&self) -> Option<&DraftId> {
        self.games.last().map(|g| &g.draft_id)
    }

    /// Score of a participant.
    pub fn score_of(&self, player: &PlayerId) -> Option<u32> {
        if player == &self.player1 {
            Some(self.player1_score)
        } else if player == &self.player2 {
            Some(self.player2_score)
        } else {
            None
        }
    }

    /// Returns true if the player is one of the two participants.
    pub fn is_participant(&self, player: &PlayerId) -> bool {
        &self.player1 == player || &self.player2 == player
    }

    /// Fails with [`CoreError::UnknownPlayer`] for non-participants.
    pub fn require_participant(&self, player: &PlayerId) -> Result<(), CoreError> {
        if self.is_participant(player) {
            Ok(())
        } else {
            Err(CoreError::UnknownPlayer(player.to_string()))
        }
    }

    /// Sets the revision after a successful conditional write.
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Rebuilds a session read back from storage.
    pub fn restore(
        id: SessionId,
        player1: PlayerId,
        player2: PlayerId,
        scores: (u32, u32),
        games: Vec<GameEntry>,
        status: SessionStatus,
        revision: u64,
    ) -> Self {
        Self {
            id,
            player1,
            player2,
            player1_score: scores.0,
            player2_score: scores.1,
            games,
            status,
            revision,
        }
    }
}
