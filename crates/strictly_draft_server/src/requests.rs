//! JSON request and response shapes for the draft service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{instrument, warn};

use crate::store::DraftStore;
use crate::{DraftService, ServiceError};
use strictly_draft::{ErrorClass, WinCondition};

/// Request for opening a session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateSessionRequest {
    /// First player ID.
    pub player1_id: String,
    /// Second player ID.
    pub player2_id: String,
}

/// Request for offering the next game of a session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InviteToDraftRequest {
    /// Session ID.
    pub session_id: String,
    /// Player sending the invitation.
    pub player_id: String,
    /// Points each player may spend. Defaults to the configured budget.
    #[serde(default)]
    pub points_budget: Option<u32>,
}

/// Request naming a draft and the player acting on it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DraftPlayerRequest {
    /// Draft ID.
    pub draft_id: String,
    /// Player ID.
    pub player_id: String,
}

/// Request naming only a draft.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DraftOnlyRequest {
    /// Draft ID.
    pub draft_id: String,
}

/// Request for picking a card.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProposePickRequest {
    /// Draft ID.
    pub draft_id: String,
    /// Player ID.
    pub player_id: String,
    /// Card to pick.
    pub card_id: String,
}

/// Request for answering a pending reset.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RespondToResetRequest {
    /// Draft ID.
    pub draft_id: String,
    /// Player answering; must not be the one who asked.
    pub player_id: String,
    /// Whether to start the draft over.
    pub accept: bool,
}

/// Request for reporting a game result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinishGameRequest {
    /// Session ID.
    pub session_id: String,
    /// Winning player, or absent for a draw.
    #[serde(default)]
    pub winner_id: Option<String>,
    /// How the game was won ("killedGod" or "obtainedGems").
    #[serde(default)]
    pub win_condition: Option<String>,
}

/// Request naming a session and the player acting on it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionPlayerRequest {
    /// Session ID.
    pub session_id: String,
    /// Player ID.
    pub player_id: String,
}

/// Any request the service accepts, tagged by `op`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DraftRequest {
    /// Open a session.
    CreateSession(CreateSessionRequest),
    /// Offer the next game.
    InviteToDraft(InviteToDraftRequest),
    /// Accept an invitation.
    AcceptInvitation(DraftPlayerRequest),
    /// Decline an invitation.
    DeclineInvitation(DraftPlayerRequest),
    /// Read or roll the first turn.
    ResolveFirstTurn(DraftOnlyRequest),
    /// Pick a card.
    ProposePick(ProposePickRequest),
    /// Ask to start the draft over.
    RequestReset(DraftPlayerRequest),
    /// Answer a pending reset.
    RespondToReset(RespondToResetRequest),
    /// Start the game built from a completed draft.
    StartGame(DraftPlayerRequest),
    /// Report a game result.
    FinishGame(FinishGameRequest),
    /// Close a session.
    FinishSession(SessionPlayerRequest),
    /// Read a draft with its replayed state.
    DraftState(DraftOnlyRequest),
    /// Export a draft with its serialized history.
    ExportDraft(DraftOnlyRequest),
}

/// Error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    /// "UserActionable", "Transient" or "Fatal".
    pub class: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the same request may simply be sent again.
    pub retryable: bool,
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        Self {
            class: err.class().to_string(),
            message: err.to_string(),
            retryable: err.class() == ErrorClass::Transient,
        }
    }
}

/// Reply to one request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DraftResponse {
    /// The request was carried out.
    Ok {
        /// Operation result.
        result: serde_json::Value,
    },
    /// The request failed.
    Error {
        /// What went wrong.
        error: ErrorBody,
    },
}

impl DraftResponse {
    /// Wraps a service result.
    pub fn from_result(result: Result<serde_json::Value, ServiceError>) -> Self {
        match result {
            Ok(result) => DraftResponse::Ok { result },
            Err(err) => DraftResponse::Error {
                error: ErrorBody::from(&err),
            },
        }
    }
}

fn encode<T: Serialize>(value: T) -> Result<serde_json::Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Encoding(e.to_string()))
}

fn parse_win_condition(text: Option<String>) -> Result<Option<WinCondition>, ServiceError> {
    text.map(|t| {
        WinCondition::from_str(&t)
            .map_err(|_| ServiceError::BadRequest(format!("unknown win condition '{}'", t)))
    })
    .transpose()
}

impl<S: DraftStore> DraftService<S> {
    /// Decodes and runs one JSON request.
    #[instrument(skip(self, json), fields(bytes = json.len()))]
    pub fn handle_json(&self, json: &str) -> DraftResponse {
        let result = serde_json::from_str::<DraftRequest>(json)
            .map_err(|e| ServiceError::BadRequest(e.to_string()))
            .and_then(|request| self.handle(request));
        if let Err(err) = &result {
            warn!(error = %err, "Request failed");
        }
        DraftResponse::from_result(result)
    }

    /// Runs one request, encoding its result as JSON.
    #[instrument(skip(self))]
    pub fn handle(&self, request: DraftRequest) -> Result<serde_json::Value, ServiceError> {
        match request {
            DraftRequest::CreateSession(r) => {
                encode(self.create_session(r.player1_id.into(), r.player2_id.into())?)
            }
            DraftRequest::InviteToDraft(r) => encode(self.invite_to_draft(
                &r.session_id.into(),
                &r.player_id.into(),
                r.points_budget,
            )?),
            DraftRequest::AcceptInvitation(r) => {
                encode(self.accept_invitation(&r.draft_id.into(), &r.player_id.into())?)
            }
            DraftRequest::DeclineInvitation(r) => {
                encode(self.decline_invitation(&r.draft_id.into(), &r.player_id.into())?)
            }
            DraftRequest::ResolveFirstTurn(r) => {
                encode(self.resolve_first_turn(&r.draft_id.into())?)
            }
            DraftRequest::ProposePick(r) => encode(self.propose_pick(
                &r.draft_id.into(),
                &r.player_id.into(),
                &r.card_id.into(),
            )?),
            DraftRequest::RequestReset(r) => {
                encode(self.request_reset(&r.draft_id.into(), &r.player_id.into())?)
            }
            DraftRequest::RespondToReset(r) => encode(self.respond_to_reset(
                &r.draft_id.into(),
                &r.player_id.into(),
                r.accept,
            )?),
            DraftRequest::StartGame(r) => {
                encode(self.start_game(&r.draft_id.into(), &r.player_id.into())?)
            }
            DraftRequest::FinishGame(r) => {
                let condition = parse_win_condition(r.win_condition)?;
                encode(self.finish_game(
                    &r.session_id.into(),
                    r.winner_id.map(Into::into),
                    condition,
                )?)
            }
            DraftRequest::FinishSession(r) => {
                encode(self.finish_session(&r.session_id.into(), &r.player_id.into())?)
            }
            DraftRequest::DraftState(r) => encode(self.draft_state(&r.draft_id.into())?),
            DraftRequest::ExportDraft(r) => encode(self.export_draft(&r.draft_id.into())?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tag_selects_operation() {
        let request: DraftRequest = serde_json::from_str(
            r#"{"op": "propose_pick", "draft_id": "d", "player_id": "a", "card_id": "zeus"}"#,
        )
        .unwrap();
        assert!(matches!(request, DraftRequest::ProposePick(ref r) if r.card_id == "zeus"));
    }

    #[test]
    fn test_win_condition_text() {
        assert_eq!(
            parse_win_condition(Some("killedGod".into())).unwrap(),
            Some(WinCondition::KilledGod)
        );
        assert!(parse_win_condition(Some("resigned".into())).is_err());
        assert_eq!(parse_win_condition(None).unwrap(), None);
    }

    #[test]
    fn test_schema_lists_every_operation() {
        let schema = serde_json::to_string(&schemars::schema_for!(DraftRequest)).unwrap();
        for op in ["create_session", "propose_pick", "respond_to_reset", "export_draft"] {
            assert!(schema.contains(op), "{op}");
        }
    }

    #[test]
    fn test_error_body_marks_conflicts_retryable() {
        let body = ErrorBody::from(&ServiceError::Conflict("draft moved".into()));
        assert_eq!(body.class, "Transient");
        assert!(body.retryable);
    }
}
